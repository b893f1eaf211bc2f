//! Name → function lookup consumed by `transform` steps.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::{collection, logic, math, object, TransformError, TransformResult};

/// A transform: resolved parameters in, value out.
pub type TransformFn = Arc<dyn Fn(&Value) -> TransformResult<Value> + Send + Sync>;

/// A transform that dispatches to other registered transforms (`map`,
/// `vectorOp`).
pub(crate) type CompositeFn = fn(&TransformRegistry, &Value) -> TransformResult<Value>;

#[derive(Clone)]
enum Entry {
    Plain(TransformFn),
    Composite(CompositeFn),
}

/// Registry mapping function name → transform.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    functions: HashMap<String, Entry>,
}

impl TransformRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry carrying the full standard library.
    pub fn standard() -> Self {
        let mut reg = Self::new();
        math::register(&mut reg);
        logic::register(&mut reg);
        collection::register(&mut reg);
        object::register(&mut reg);
        reg
    }

    /// Register (or replace) a transform under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&Value) -> TransformResult<Value> + Send + Sync + 'static,
    {
        self.functions
            .insert(name.into(), Entry::Plain(Arc::new(function)));
        self
    }

    pub(crate) fn register_composite(&mut self, name: &str, function: CompositeFn) {
        self.functions
            .insert(name.to_string(), Entry::Composite(function));
    }

    /// Whether a transform is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call the transform registered under `name`.
    pub fn call(&self, name: &str, params: &Value) -> TransformResult<Value> {
        match self.functions.get(name) {
            Some(Entry::Plain(function)) => function(params),
            Some(Entry::Composite(function)) => function(self, params),
            None => Err(TransformError::NotFound(name.to_string())),
        }
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(reg: &TransformRegistry, params: &Value) -> TransformResult<Value> {
        Ok(json!({ "params": params, "known": reg.names().len() }))
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut reg = TransformRegistry::new();
        reg.register("f", |_: &Value| Ok(json!(1)))
            .register("f", |_: &Value| Ok(json!(2)));
        assert_eq!(reg.names(), vec!["f"]);
        assert_eq!(reg.call("f", &Value::Null), Ok(json!(2)));
    }

    #[test]
    fn composites_see_the_registry_they_live_in() {
        let mut reg = TransformRegistry::new();
        reg.register_composite("echo", echo);
        reg.register("other", |_: &Value| Ok(Value::Null));
        assert_eq!(
            reg.call("echo", &json!(5)),
            Ok(json!({ "params": 5, "known": 2 }))
        );
    }

    #[test]
    fn debug_lists_sorted_names() {
        let mut reg = TransformRegistry::new();
        reg.register("b", |_: &Value| Ok(Value::Null))
            .register("a", |_: &Value| Ok(Value::Null));
        assert_eq!(
            format!("{reg:?}"),
            r#"TransformRegistry { functions: ["a", "b"] }"#
        );
    }
}
