//! Arithmetic transforms.

use serde_json::Value;
use tracing::warn;

use crate::params::{flatten_items, invalid, number, Params};
use crate::{TransformRegistry, TransformResult};

pub(crate) fn register(reg: &mut TransformRegistry) {
    reg.register("add", add)
        .register("sub", sub)
        .register("addFactor", add_factor)
        .register("subFactor", sub_factor)
        .register("mult", mult)
        .register("div", div)
        .register("round", round)
        .register("ceil", ceil)
        .register("floor", floor)
        .register("max", max)
        .register("min", min)
        .register("clamp", clamp)
        .register("roundCurrency", round_currency)
        .register("addN", add_n);
}

fn pair(params: &Value, function: &str, op: fn(f64, f64) -> f64) -> TransformResult<Value> {
    let p = Params::new(params);
    number(function, op(p.number("a")?, p.number("b")?))
}

fn scaled(params: &Value, function: &str, op: fn(f64, f64) -> f64) -> TransformResult<Value> {
    let p = Params::new(params);
    number(function, op(p.number("amt")?, p.number("factor")?))
}

fn unary(params: &Value, function: &str, op: fn(f64) -> f64) -> TransformResult<Value> {
    number(function, op(Params::new(params).number("amt")?))
}

/// `{a, b}` → `a + b`
pub fn add(params: &Value) -> TransformResult<Value> {
    pair(params, "add", |a, b| a + b)
}

/// `{a, b}` → `a - b`
pub fn sub(params: &Value) -> TransformResult<Value> {
    pair(params, "sub", |a, b| a - b)
}

/// `{amt, factor}` → `amt + amt * factor`
pub fn add_factor(params: &Value) -> TransformResult<Value> {
    scaled(params, "addFactor", |amt, factor| amt + amt * factor)
}

/// `{amt, factor}` → `amt - amt * factor`
pub fn sub_factor(params: &Value) -> TransformResult<Value> {
    scaled(params, "subFactor", |amt, factor| amt - amt * factor)
}

/// `{amt, factor}` → `amt * factor`
pub fn mult(params: &Value) -> TransformResult<Value> {
    scaled(params, "mult", |amt, factor| amt * factor)
}

/// `{num, dem}` → `num / dem`; dividing by zero is an error.
pub fn div(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    number("div", p.number("num")? / p.number("dem")?)
}

/// Round half up, so `-2.5` rounds to `-2`.
pub fn round(params: &Value) -> TransformResult<Value> {
    unary(params, "round", |amt| {
        let floor = amt.floor();
        if amt - floor >= 0.5 {
            floor + 1.0
        } else {
            floor
        }
    })
}

pub fn ceil(params: &Value) -> TransformResult<Value> {
    unary(params, "ceil", f64::ceil)
}

pub fn floor(params: &Value) -> TransformResult<Value> {
    unary(params, "floor", f64::floor)
}

pub fn max(params: &Value) -> TransformResult<Value> {
    pair(params, "max", f64::max)
}

pub fn min(params: &Value) -> TransformResult<Value> {
    pair(params, "min", f64::min)
}

/// `{amt, min, max}` → `amt` limited to `[min, max]`.
pub fn clamp(params: &Value) -> TransformResult<Value> {
    let p = Params::new(params);
    let (amt, lo, hi) = (p.number("amt")?, p.number("min")?, p.number("max")?);
    number("clamp", lo.max(hi.min(amt)))
}

/// Round to cents. A non-numeric `amt` is passed through unchanged.
pub fn round_currency(params: &Value) -> TransformResult<Value> {
    let amt = Params::new(params).value("amt");
    match amt.as_f64() {
        Some(n) => number("roundCurrency", (n * 100.0).round() / 100.0),
        None => {
            warn!(found = %amt, "unable to round non-numeric amount");
            Ok(amt.clone())
        }
    }
}

/// Sum of every item (mapping values or sequence elements, flattened).
pub fn add_n(items: &Value) -> TransformResult<Value> {
    let mut total = 0.0;
    for item in flatten_items(items) {
        total += item
            .as_f64()
            .ok_or_else(|| invalid("items", "numbers", &item))?;
    }
    number("addN", total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rounding_follows_half_up() {
        assert_eq!(round(&json!({"amt": 2.5})).unwrap(), json!(3));
        assert_eq!(round(&json!({"amt": -2.5})).unwrap(), json!(-2));
        assert_eq!(round(&json!({"amt": 2.49})).unwrap(), json!(2));
        assert_eq!(round(&json!({"amt": 0.49999999999999994})).unwrap(), json!(0));
        assert_eq!(round(&json!({"amt": -0.5})).unwrap(), json!(0));
        assert_eq!(round(&json!({"amt": 4503599627370497.0})).unwrap(), json!(4503599627370497_i64));
    }

    #[test]
    fn currency_rounding_keeps_two_decimals() {
        assert_eq!(round_currency(&json!({"amt": 10.126})).unwrap(), json!(10.13));
        assert_eq!(round_currency(&json!({"amt": 0.125})).unwrap(), json!(0.13));
        assert_eq!(round_currency(&json!({"amt": "n/a"})).unwrap(), json!("n/a"));
    }
}
