//! Accessors over a transform's resolved parameter value.

use dgraph_types::value::{from_f64, type_name};
use serde_json::Value;

use crate::{TransformError, TransformResult};

static NULL: Value = Value::Null;

/// Named-argument view of a resolved `params` mapping.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Params<'a>(&'a Value);

impl<'a> Params<'a> {
    pub(crate) fn new(value: &'a Value) -> Self {
        Self(value)
    }

    /// The argument if present (a stored `null` counts as present).
    pub(crate) fn get(&self, name: &str) -> Option<&'a Value> {
        self.0.as_object().and_then(|map| map.get(name))
    }

    /// The argument, or `null` when absent.
    pub(crate) fn value(&self, name: &str) -> &'a Value {
        self.get(name).unwrap_or(&NULL)
    }

    pub(crate) fn number(&self, name: &str) -> TransformResult<f64> {
        let value = self.value(name);
        value.as_f64().ok_or_else(|| invalid(name, "a number", value))
    }

    pub(crate) fn string(&self, name: &str) -> TransformResult<&'a str> {
        let value = self.value(name);
        value.as_str().ok_or_else(|| invalid(name, "a string", value))
    }

    pub(crate) fn array(&self, name: &str) -> TransformResult<&'a [Value]> {
        let value = self.value(name);
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| invalid(name, "an array", value))
    }
}

pub(crate) fn invalid(param: &str, expected: &'static str, found: &Value) -> TransformError {
    TransformError::InvalidParam {
        param: param.to_string(),
        expected,
        found: type_name(found).to_string(),
    }
}

/// Wrap an arithmetic result, rejecting NaN and infinities.
pub(crate) fn number(function: &str, n: f64) -> TransformResult<Value> {
    from_f64(n).ok_or_else(|| TransformError::NonFinite(function.to_string()))
}

/// Collect the items handed to an `…N` function: the values of a mapping or
/// the elements of a sequence, flattened all the way down. A scalar is a
/// single item.
pub(crate) fn flatten_items(items: &Value) -> Vec<Value> {
    fn push_flat(value: &Value, out: &mut Vec<Value>) {
        match value {
            Value::Array(inner) => inner.iter().for_each(|v| push_flat(v, out)),
            other => out.push(other.clone()),
        }
    }

    let mut out = Vec::new();
    match items {
        Value::Object(map) => map.values().for_each(|v| push_flat(v, &mut out)),
        other => push_flat(other, &mut out),
    }
    out
}
