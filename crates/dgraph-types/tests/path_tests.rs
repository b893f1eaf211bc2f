//! Tests for dotted-path resolution, including wildcard projection.

use dgraph_types::path::{first_segment, lookup, resolve, segments};
use dgraph_types::PathError;
use serde_json::{json, Map, Value};

fn table(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Plain paths
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn walks_nested_mappings() {
    let root = json!({"a": {"b": {"c": 7}}});
    assert_eq!(resolve(&root, "a.b.c").unwrap(), Some(json!(7)));
    assert_eq!(resolve(&root, "a.b").unwrap(), Some(json!({"c": 7})));
}

#[test]
fn missing_intermediate_is_not_found() {
    let root = json!({"a": {"b": 1}});
    assert_eq!(resolve(&root, "a.x.y").unwrap(), None);
    assert_eq!(resolve(&root, "a.b.c").unwrap(), None);
    assert_eq!(resolve(&root, "").unwrap(), None);
}

#[test]
fn stored_null_is_distinct_from_not_found() {
    let root = json!({"a": null});
    assert_eq!(resolve(&root, "a").unwrap(), Some(Value::Null));
    assert_eq!(resolve(&root, "b").unwrap(), None);
}

#[test]
fn numeric_and_bracket_segments_index_sequences() {
    let root = json!({"rows": [{"v": 1}, {"v": 2}]});
    assert_eq!(resolve(&root, "rows.1.v").unwrap(), Some(json!(2)));
    assert_eq!(resolve(&root, "rows[0].v").unwrap(), Some(json!(1)));
    assert_eq!(resolve(&root, "rows.9.v").unwrap(), None);
}

#[test]
fn resolves_against_a_bare_map() {
    let values = table(json!({"inputs": {"x": 10}, "doubled": 20}));
    assert_eq!(resolve(&values, "inputs.x").unwrap(), Some(json!(10)));
    assert_eq!(lookup(&values, "doubled"), Some(&json!(20)));
}

#[test]
fn segment_helpers() {
    assert_eq!(segments("a.b[2].c"), vec!["a", "b", "2", "c"]);
    assert_eq!(first_segment("lonelySouls.doubled"), "lonelySouls");
    assert_eq!(first_segment("plain"), "plain");
}

// ══════════════════════════════════════════════════════════════════════════════
// Wildcards
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn wildcard_plucks_field_from_each_element() {
    let root = json!({"arr": [{"v": 1}, {"v": 2}]});
    assert_eq!(resolve(&root, "arr.*.v").unwrap(), Some(json!([1, 2])));
}

#[test]
fn trailing_wildcard_returns_elements() {
    let root = json!({"arr": [{"v": 1}, {"v": 2}]});
    assert_eq!(
        resolve(&root, "arr.*").unwrap(),
        Some(json!([{"v": 1}, {"v": 2}]))
    );
}

#[test]
fn leading_wildcard_projects_root_sequence() {
    let root = json!([{"v": "a"}, {"v": "b"}, {}]);
    assert_eq!(resolve(&root, "*.v").unwrap(), Some(json!(["a", "b", null])));
    assert_eq!(resolve(&root, "*").unwrap(), Some(root.clone()));
}

#[test]
fn wildcard_projection_with_deep_suffix() {
    let root = json!({"a": {"items": [{"p": {"q": 1}}, {"p": {"q": 2}}]}});
    assert_eq!(resolve(&root, "a.items.*.p.q").unwrap(), Some(json!([1, 2])));
}

#[test]
fn two_wildcards_are_unsupported() {
    let root = json!({"a": [[1], [2]]});
    let err = resolve(&root, "a.*.*").unwrap_err();
    assert!(matches!(err, PathError::UnsupportedSyntax { .. }));
}

#[test]
fn embedded_star_is_unsupported() {
    let root = json!({"a": [1]});
    let err = resolve(&root, "a.b*").unwrap_err();
    assert_eq!(
        err,
        PathError::UnsupportedSyntax {
            path: "a.b*".into()
        }
    );
}

#[test]
fn wildcard_over_non_sequence_is_type_mismatch() {
    let root = json!({"a": {"b": 3}});
    let err = resolve(&root, "a.*").unwrap_err();
    assert_eq!(
        err,
        PathError::NotIterable {
            path: "a.*".into(),
            target: "a".into()
        }
    );
    assert!(err.to_string().contains("not an iterable"));
}

#[test]
fn wildcard_over_missing_prefix_is_not_found() {
    let root = json!({});
    assert_eq!(resolve(&root, "nothing.here.*").unwrap(), None);
}

#[test]
fn bare_wildcard_against_map_is_type_mismatch() {
    let values = table(json!({"a": 1}));
    assert!(matches!(
        resolve(&values, "*"),
        Err(PathError::NotIterable { .. })
    ));
}
