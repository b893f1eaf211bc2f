//! Tests for loading persisted graph documents into the typed model.

use dgraph_types::{
    CollectionMode, Graph, GraphDocument, GraphError, GraphRef, InvokeMode, StepKind,
};
use serde_json::json;

// ══════════════════════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn loads_every_step_type() {
    let graph = Graph::from_value(&json!([
        {"name": "s", "type": "static", "value": 3},
        {"name": "a", "type": "alias", "mirror": "s"},
        {"name": "d", "type": "dereference", "objectPath": "inputs.o", "propNamePath": "inputs.k"},
        {"name": "b", "type": "branch", "test": "inputs.t", "cases": ["x", "_default_"], "nodeNames": ["s", "a"]},
        {"name": "t", "type": "transform", "fn": "mult", "params": {"amt": "s", "factor": 2}},
        {"name": "g", "type": "graph", "graphDef": "tmpl", "inputs": {"x": 1}},
        {"type": "comment", "comments": "documentation only"}
    ]))
    .unwrap();

    assert_eq!(graph.len(), 7);
    let steps = graph.steps();
    assert_eq!(steps[0].kind, StepKind::Static { value: json!(3) });
    assert!(matches!(&steps[2].kind, StepKind::Dereference { object_path, .. } if object_path == "inputs.o"));
    assert!(matches!(&steps[4].kind, StepKind::Transform { function, .. } if function == "mult"));
    assert!(steps[6].is_comment());
}

#[test]
fn reads_hidden_flag_and_comments() {
    let graph = Graph::from_value(&json!([
        {"name": "s", "type": "static", "value": "v", "isHidden": true, "comments": "why"}
    ]))
    .unwrap();
    let step = &graph.steps()[0];
    assert!(step.is_hidden);
    assert_eq!(step.comments.as_deref(), Some("why"));
}

#[test]
fn unwraps_document_and_keeps_identity() {
    let doc = GraphDocument::from_value(&json!({
        "namespace": "tier-day-rate",
        "name": "default",
        "version": 4,
        "type": "dgraph",
        "data": [{"name": "s", "type": "static", "value": 1}]
    }))
    .unwrap();
    assert_eq!(doc.data.len(), 1);
    assert_eq!(doc.label(), "tier-day-rate/default@4");
    assert_eq!(doc.kind.as_deref(), Some("dgraph"));
}

#[test]
fn bare_array_is_a_document() {
    let doc = GraphDocument::from_value(&json!([])).unwrap();
    assert!(doc.data.is_empty());
    assert_eq!(doc.label(), "<anonymous>");
}

#[test]
fn rejects_non_graph_values() {
    assert_eq!(GraphDocument::from_value(&json!(3)), Err(GraphError::NotAGraph));
    assert_eq!(
        GraphDocument::from_value(&json!({"name": "x"})),
        Err(GraphError::NotAGraph)
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Validation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unknown_step_type_is_reported() {
    let err = Graph::from_value(&json!([
        {"name": "ok", "type": "static", "value": 1},
        {"name": "bad", "type": "loop"}
    ]))
    .unwrap_err();
    assert_eq!(
        err,
        GraphError::UnknownStepType {
            location: "data[1]".into(),
            found: "loop".into()
        }
    );
}

#[test]
fn unknown_step_type_inside_inline_body_is_reported() {
    let err = Graph::from_value(&json!([
        {"name": "g", "type": "graph", "graphDef": [{"name": "x", "type": "nope"}], "inputs": {}}
    ]))
    .unwrap_err();
    assert!(matches!(err, GraphError::UnknownStepType { location, .. } if location == "data[0].graphDef[0]"));
}

#[test]
fn missing_step_type_is_reported() {
    let err = Graph::from_value(&json!([{"name": "x"}])).unwrap_err();
    assert!(matches!(err, GraphError::MissingStepType { .. }));
}

#[test]
fn duplicate_step_names_are_rejected() {
    let err = Graph::from_value(&json!([
        {"name": "x", "type": "static", "value": 1},
        {"name": "x", "type": "static", "value": 2}
    ]))
    .unwrap_err();
    assert_eq!(
        err,
        GraphError::DuplicateStepName {
            location: "data[1]".into(),
            name: "x".into()
        }
    );
}

#[test]
fn namespace_colliding_with_step_name_is_rejected() {
    let err = Graph::from_value(&json!([
        {"name": "pricing", "type": "static", "value": 1},
        {"name": "scoped", "type": "graph", "namespace": "pricing",
         "graphDef": [{"name": "base", "type": "static", "value": 2}]}
    ]))
    .unwrap_err();
    assert_eq!(
        err,
        GraphError::DuplicateStepName {
            location: "data[1]".into(),
            name: "pricing".into()
        }
    );
}

#[test]
fn step_name_colliding_with_earlier_namespace_is_rejected() {
    let err = Graph::from_value(&json!([
        {"name": "scoped", "type": "graph", "namespace": "ns",
         "graphDef": [{"name": "base", "type": "static", "value": 2}]},
        {"name": "ns", "type": "alias", "mirror": "inputs.ns"}
    ]))
    .unwrap_err();
    assert!(matches!(err, GraphError::DuplicateStepName { name, .. } if name == "ns"));
}

#[test]
fn same_name_in_nested_graph_is_allowed() {
    Graph::from_value(&json!([
        {"name": "x", "type": "graph", "graphDef": [{"name": "x", "type": "static", "value": 1}]}
    ]))
    .unwrap();
}

#[test]
fn nameless_comments_do_not_collide() {
    Graph::from_value(&json!([
        {"type": "comment", "comments": "one"},
        {"type": "comment", "comments": "two"}
    ]))
    .unwrap();
}

#[test]
fn missing_variant_field_is_malformed() {
    let err = Graph::from_value(&json!([{"name": "a", "type": "alias"}])).unwrap_err();
    assert!(matches!(err, GraphError::Malformed(_)));
}

// ══════════════════════════════════════════════════════════════════════════════
// Sub-graph classification & hoisting
// ══════════════════════════════════════════════════════════════════════════════

fn graph_step(value: serde_json::Value) -> dgraph_types::GraphStep {
    let graph = Graph::from_value(&json!([value])).unwrap();
    match &graph.steps()[0].kind {
        StepKind::Graph(step) => step.clone(),
        other => panic!("expected graph step, got {other:?}"),
    }
}

#[test]
fn inline_body_without_inputs_is_a_template() {
    let step = graph_step(json!({"name": "t", "type": "graph", "graphDef": []}));
    assert!(step.is_template_definition());
    assert_eq!(step.invoke_mode(), None);
}

#[test]
fn explicit_template_flag_wins() {
    let step = graph_step(json!({
        "name": "t", "type": "graph", "graphDef": [], "isTemplate": true, "inputs": {"a": 1}
    }));
    assert!(step.is_template_definition());
}

#[test]
fn named_body_without_inputs_is_an_invocation() {
    let step = graph_step(json!({"name": "g", "type": "graph", "graphDef": "tmpl"}));
    assert_eq!(step.graph_def, GraphRef::Named("tmpl".into()));
    assert_eq!(step.invoke_mode(), Some(InvokeMode::Plain));
}

#[test]
fn namespace_selects_namespaced_mode() {
    let step = graph_step(json!({"name": "g", "type": "graph", "graphDef": [], "namespace": "ns"}));
    assert_eq!(step.invoke_mode(), Some(InvokeMode::Namespaced("ns")));
}

#[test]
fn map_mode_wins_over_namespace() {
    let step = graph_step(json!({
        "name": "g", "type": "graph", "graphDef": "tmpl",
        "collectionMode": "map", "namespace": "ns", "inputs": {"collection": "inputs.xs"}
    }));
    assert_eq!(step.collection_mode, Some(CollectionMode::Map));
    assert_eq!(step.invoke_mode(), Some(InvokeMode::Map));
}

#[test]
fn publish_key_follows_namespace() {
    let graph = Graph::from_value(&json!([
        {"name": "call", "type": "graph", "graphDef": [], "namespace": "ns"},
        {"name": "plain", "type": "static", "value": 1}
    ]))
    .unwrap();
    assert_eq!(graph.steps()[0].publish_key(), "ns");
    assert_eq!(graph.steps()[1].publish_key(), "plain");
    assert_eq!(graph.find_step("ns").map(|s| s.name.as_str()), Some("call"));
    assert_eq!(graph.find_step("call").map(|s| s.name.as_str()), Some("call"));
}

#[test]
fn hoisting_moves_template_definitions_first() {
    let graph = Graph::from_value(&json!([
        {"name": "a", "type": "static", "value": 1},
        {"name": "t1", "type": "graph", "graphDef": []},
        {"name": "b", "type": "graph", "graphDef": "t1", "inputs": {}},
        {"name": "t2", "type": "graph", "graphDef": "t1", "isTemplate": true},
        {"name": "c", "type": "static", "value": 2}
    ]))
    .unwrap();
    let order: Vec<&str> = graph.hoisted().map(|s| s.name.as_str()).collect();
    assert_eq!(order, vec!["t1", "t2", "a", "b", "c"]);
}

#[test]
fn serializes_back_to_persisted_shape() {
    let source = json!([
        {"name": "t", "type": "transform", "fn": "mult", "params": {"amt": "inputs.x", "factor": 2}, "isHidden": true}
    ]);
    let graph = Graph::from_value(&source).unwrap();
    assert_eq!(serde_json::to_value(&graph).unwrap(), source);
}
