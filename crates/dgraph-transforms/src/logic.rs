//! Boolean, comparison and predicate transforms.

use std::cmp::Ordering;

use dgraph_types::value::{is_truthy, loose_eq};
use serde_json::Value;

use crate::params::{flatten_items, invalid, Params};
use crate::{TransformRegistry, TransformResult};

pub(crate) fn register(reg: &mut TransformRegistry) {
    reg.register("andN", and_n)
        .register("orN", or_n)
        .register("not", not)
        .register("ternary", ternary)
        .register("gt", gt)
        .register("lt", lt)
        .register("gte", gte)
        .register("lte", lte)
        .register("eq", eq)
        .register("includes", includes)
        .register("isNonEmptyString", is_non_empty_string)
        .register("isNull", is_null);
}

/// True when every item is truthy (and for no items at all).
pub fn and_n(items: &Value) -> TransformResult<Value> {
    Ok(Value::Bool(flatten_items(items).iter().all(is_truthy)))
}

/// The first truthy item; otherwise the last item, or `false` when empty.
pub fn or_n(items: &Value) -> TransformResult<Value> {
    let items = flatten_items(items);
    let first_truthy = items.iter().find(|item| is_truthy(item));
    Ok(first_truthy
        .or(items.last())
        .cloned()
        .unwrap_or(Value::Bool(false)))
}

/// `{item}` → true only when `item` is the boolean `false`.
pub fn not(params: &Value) -> TransformResult<Value> {
    let item = Params::new(params).value("item");
    Ok(Value::Bool(matches!(item, Value::Bool(false))))
}

/// `{test, pass, fail}` → `pass` when `test` is truthy, else `fail`.
pub fn ternary(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let chosen = if is_truthy(p.value("test")) {
        p.value("pass")
    } else {
        p.value("fail")
    };
    Ok(chosen.clone())
}

fn compare(params: &Value, accept: fn(Ordering) -> bool) -> TransformResult<Value> {
    let p = Params::new(params);
    let (a, b) = (p.value("a"), p.value("b"));
    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Number(_) | Value::String(_), other) => {
            return Err(invalid("b", "a value comparable with `a`", other))
        }
        (other, _) => return Err(invalid("a", "a number or a string", other)),
    };
    Ok(Value::Bool(ordering.is_some_and(accept)))
}

pub fn gt(params: &Value) -> TransformResult<Value> {
    compare(params, Ordering::is_gt)
}

pub fn lt(params: &Value) -> TransformResult<Value> {
    compare(params, Ordering::is_lt)
}

pub fn gte(params: &Value) -> TransformResult<Value> {
    compare(params, Ordering::is_ge)
}

pub fn lte(params: &Value) -> TransformResult<Value> {
    compare(params, Ordering::is_le)
}

/// `{a, b}` → structural equality (`1` equals `1.0`).
pub fn eq(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    Ok(Value::Bool(loose_eq(p.value("a"), p.value("b"))))
}

/// `{item, isIncludedIn}` → membership in a sequence, or substring of a string.
pub fn includes(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let item = p.value("item");
    match p.value("isIncludedIn") {
        Value::Array(haystack) => Ok(Value::Bool(
            haystack.iter().any(|candidate| loose_eq(candidate, item)),
        )),
        Value::String(haystack) => Ok(Value::Bool(
            item.as_str().is_some_and(|needle| haystack.contains(needle)),
        )),
        other => Err(invalid("isIncludedIn", "an array or a string", other)),
    }
}

pub fn is_non_empty_string(params: &Value) -> TransformResult<Value> {
    let item = Params::new(params).value("item");
    Ok(Value::Bool(
        item.as_str().is_some_and(|s| !s.trim().is_empty()),
    ))
}

/// `{item}` → true for a stored `null`; an absent `item` is not null.
pub fn is_null(params: &Value) -> TransformResult<Value> {
    Ok(Value::Bool(matches!(
        Params::new(params).get("item"),
        Some(Value::Null)
    )))
}
