//! Sequence transforms, including the two that call back into the registry.

use dgraph_types::path::lookup;
use dgraph_types::value::loose_eq;
use serde_json::{Map, Value};

use crate::params::{flatten_items, invalid, Params};
use crate::{TransformError, TransformRegistry, TransformResult};

/// Placeholder in `map` params standing for the element itself.
pub const ITEM_PLACEHOLDER: &str = "_item_";

static TRUE: Value = Value::Bool(true);

pub(crate) fn register(reg: &mut TransformRegistry) {
    reg.register("concat", concat)
        .register("concatArrays", concat_arrays)
        .register("filter", filter)
        .register("filterNot", filter_not)
        .register("find", find);
    reg.register_composite("map", map);
    reg.register_composite("vectorOp", vector_op);
}

/// Join every item into one string.
pub fn concat(items: &Value) -> TransformResult<Value> {
    let joined: String = flatten_items(items)
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            Value::Object(_) => "[object Object]".to_string(),
            other => other.to_string(),
        })
        .collect();
    Ok(Value::String(joined))
}

/// Every item of every nested sequence, in one flat sequence.
pub fn concat_arrays(items: &Value) -> TransformResult<Value> {
    Ok(Value::Array(flatten_items(items)))
}

/// Whether `item` at `path` equals `expected` (`true` when not given).
fn matches_at(item: &Value, path: &str, expected: Option<&Value>) -> bool {
    let expected = expected.unwrap_or(&TRUE);
    lookup(item, path).is_some_and(|found| loose_eq(found, expected))
}

/// `{collection, path, value?}` → items whose `path` equals `value`.
pub fn filter(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let path = p.string("path")?;
    let expected = p.get("value");
    Ok(Value::Array(
        flatten_items(p.value("collection"))
            .into_iter()
            .filter(|item| matches_at(item, path, expected))
            .collect(),
    ))
}

/// `{collection, path, value?}` → items whose `path` does not equal `value`.
pub fn filter_not(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let path = p.string("path")?;
    let expected = p.get("value");
    Ok(Value::Array(
        flatten_items(p.value("collection"))
            .into_iter()
            .filter(|item| !matches_at(item, path, expected))
            .collect(),
    ))
}

/// `{collection, propName, propValue}` → first matching item, or `null`.
pub fn find(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let prop_name = p.string("propName")?;
    let prop_value = p.value("propValue");
    Ok(flatten_items(p.value("collection"))
        .into_iter()
        .find(|item| {
            item.get(prop_name)
                .is_some_and(|found| loose_eq(found, prop_value))
        })
        .unwrap_or(Value::Null))
}

/// `{collection, fn, params}` → `fn` applied to each element.
///
/// Each entry of `params` is a path read from the element, or
/// [`ITEM_PLACEHOLDER`] for the element itself.
pub fn map(reg: &TransformRegistry, params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let collection = p.array("collection")?;
    let function = p.string("fn")?;
    let arg_paths = match p.value("params") {
        Value::Object(paths) => paths.clone(),
        Value::Null => Map::new(),
        other => return Err(invalid("params", "an object", other)),
    };
    if !reg.contains(function) {
        return Err(TransformError::NotFound(function.to_string()));
    }

    collection
        .iter()
        .map(|item| {
            let args: Map<String, Value> = arg_paths
                .iter()
                .map(|(name, local)| {
                    let arg = match local.as_str() {
                        Some(ITEM_PLACEHOLDER) => item.clone(),
                        Some(path) => lookup(item, path).cloned().unwrap_or(Value::Null),
                        None => local.clone(),
                    };
                    (name.clone(), arg)
                })
                .collect();
            reg.call(function, &Value::Object(args))
        })
        .collect::<TransformResult<Vec<_>>>()
        .map(Value::Array)
}

/// Argument names a binary transform expects.
fn binary_arg_names(op: &str) -> (&'static str, &'static str) {
    match op {
        "addFactor" | "subFactor" | "mult" => ("amt", "factor"),
        "div" => ("num", "dem"),
        _ => ("a", "b"),
    }
}

/// `{collectionA, collectionB, op}` → `op` applied pairwise.
pub fn vector_op(reg: &TransformRegistry, params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let a = flatten_items(p.value("collectionA"));
    let b = flatten_items(p.value("collectionB"));
    if a.len() != b.len() {
        return Err(TransformError::LengthMismatch {
            a: a.len(),
            b: b.len(),
        });
    }
    let op = p.string("op")?;
    if !reg.contains(op) {
        return Err(TransformError::NotFound(op.to_string()));
    }

    let (left, right) = binary_arg_names(op);
    a.into_iter()
        .zip(b)
        .map(|(x, y)| {
            let mut args = Map::new();
            args.insert(left.to_string(), x);
            args.insert(right.to_string(), y);
            reg.call(op, &Value::Object(args))
        })
        .collect::<TransformResult<Vec<_>>>()
        .map(Value::Array)
}
