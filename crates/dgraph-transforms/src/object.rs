//! Object shaping transforms.

use serde_json::{Map, Value};

use crate::params::{invalid, Params};
use crate::{TransformRegistry, TransformResult};

pub(crate) fn register(reg: &mut TransformRegistry) {
    reg.register("pick", pick)
        .register("omit", omit)
        .register("merge", merge)
        .register("box", box_value)
        .register("addProp", add_prop);
}

/// `propNames` as a list of keys; a single string is one key.
fn prop_names<'a>(p: &Params<'a>) -> TransformResult<Vec<&'a str>> {
    match p.value("propNames") {
        Value::String(name) => Ok(vec![name.as_str()]),
        Value::Array(names) => names
            .iter()
            .map(|name| name.as_str().ok_or_else(|| invalid("propNames", "strings", name)))
            .collect(),
        other => Err(invalid("propNames", "a string or an array of strings", other)),
    }
}

fn source_object<'a>(p: &Params<'a>) -> TransformResult<&'a Map<String, Value>> {
    let src = p.value("src");
    src.as_object()
        .ok_or_else(|| invalid("src", "an object", src))
}

/// `{src, propNames}` → only the listed keys of `src`.
pub fn pick(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let src = source_object(&p)?;
    let picked = prop_names(&p)?
        .into_iter()
        .filter_map(|name| src.get(name).map(|v| (name.to_string(), v.clone())))
        .collect();
    Ok(Value::Object(picked))
}

/// `{src, propNames}` → `src` without the listed keys.
pub fn omit(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let mut kept = source_object(&p)?.clone();
    for name in prop_names(&p)? {
        kept.remove(name);
    }
    Ok(Value::Object(kept))
}

/// `{a, b}` → deep merge of `b` over `a` into a fresh object.
pub fn merge(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    Ok(merged([p.value("a"), p.value("b")]))
}

/// `{value, propName}` → `{[propName]: value}`
pub fn box_value(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let mut boxed = Map::new();
    boxed.insert(p.string("propName")?.to_string(), p.value("value").clone());
    Ok(Value::Object(boxed))
}

/// `{src, propName, propValue}` → copy of `src` with one key set.
pub fn add_prop(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let mut addition = Map::new();
    addition.insert(
        p.string("propName")?.to_string(),
        p.value("propValue").clone(),
    );
    Ok(merged([p.value("src"), &Value::Object(addition)]))
}

/// Merge object sources left to right into an empty object; non-object
/// sources are skipped.
fn merged<'a>(sources: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut target = Value::Object(Map::new());
    for source in sources.into_iter().filter(|s| s.is_object()) {
        deep_merge(&mut target, source);
    }
    target
}

/// Objects merge key by key and sequences index by index; anything else is
/// overwritten by the source.
fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(into), Value::Object(from)) => {
            for (key, value) in from {
                match into.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        into.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(into), Value::Array(from)) => {
            for (index, value) in from.iter().enumerate() {
                match into.get_mut(index) {
                    Some(existing) => deep_merge(existing, value),
                    None => into.push(value.clone()),
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}
