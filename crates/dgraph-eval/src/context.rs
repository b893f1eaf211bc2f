//! Evaluation state for one graph activation.

use std::collections::HashSet;
use std::sync::Arc;

use dgraph_types::Graph;
use serde_json::{Map, Value};

/// Key under which an activation's inputs are exposed to paths.
pub const INPUTS_KEY: &str = "inputs";

/// Handle to a context held in the engine's arena.
///
/// A child context refers to its caller through one of these, which gives
/// the child a way back into the caller's graph and values without owning
/// either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub(crate) usize);

/// The mutable state of one activation: the graph being run, every value
/// published so far, the names of steps already run, and the subset of
/// values destined for the caller.
#[derive(Debug)]
pub struct Context {
    graph: Arc<Graph>,
    values: Map<String, Value>,
    executed: HashSet<String>,
    output: Map<String, Value>,
    parent: Option<ContextId>,
}

impl Context {
    /// A fresh context. Without `inputs` there is no `inputs` entry at all,
    /// which is what lets a namespaced child fall back to its parent.
    pub fn new(graph: Arc<Graph>, inputs: Option<Value>, parent: Option<ContextId>) -> Self {
        let mut values = Map::new();
        if let Some(inputs) = inputs {
            values.insert(INPUTS_KEY.to_string(), inputs);
        }
        Self {
            graph,
            values,
            executed: HashSet::new(),
            output: Map::new(),
            parent,
        }
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Everything paths resolve against: inputs plus published results.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn output(&self) -> &Map<String, Value> {
        &self.output
    }

    pub fn into_output(self) -> Map<String, Value> {
        self.output
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    pub fn is_executed(&self, name: &str) -> bool {
        self.executed.contains(name)
    }

    /// Record that `name` has run. Returns `false` if it already had.
    pub fn mark_executed(&mut self, name: &str) -> bool {
        self.executed.insert(name.to_string())
    }

    /// Publish a result: always visible to later steps, and part of the
    /// output unless hidden.
    pub fn set_value(&mut self, key: &str, value: Value, hidden: bool) {
        if !hidden && key != INPUTS_KEY {
            self.output.insert(key.to_string(), value.clone());
        }
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hidden_values_stay_out_of_output() {
        let mut ctx = Context::new(Arc::new(Graph::default()), Some(json!({"x": 1})), None);
        ctx.set_value("shown", json!(1), false);
        ctx.set_value("secret", json!(2), true);
        assert_eq!(ctx.values().len(), 3);
        assert_eq!(ctx.output().len(), 1);
        assert!(ctx.output().contains_key("shown"));
    }

    #[test]
    fn steps_are_marked_once() {
        let mut ctx = Context::new(Arc::new(Graph::default()), None, None);
        assert!(ctx.mark_executed("a"));
        assert!(!ctx.mark_executed("a"));
        assert!(ctx.is_executed("a"));
        assert!(!ctx.values().contains_key(INPUTS_KEY));
    }
}
