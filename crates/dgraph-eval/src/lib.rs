//! dgraph execution engine.
//!
//! Runs a declarative computation graph (named steps: literals, aliases,
//! lookups, branches, transforms and sub-graphs) against a set of runtime
//! inputs and returns the named outputs.
//!
//! ```
//! use serde_json::json;
//!
//! let graph = json!([
//!     {"name": "doubled", "type": "transform", "fn": "mult",
//!      "params": {"amt": "inputs.x", "factor": 2}}
//! ]);
//! let output = dgraph_eval::execute(&graph, json!({"x": 10}), false).unwrap();
//! assert_eq!(output["doubled"], json!(20));
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use context::{Context, ContextId};
pub use engine::Engine;
pub use error::{EvalError, EvalResult};

use dgraph_transforms::TransformRegistry;
use dgraph_types::GraphDocument;
use serde_json::{Map, Value};
use tracing::info;

/// Execute a graph definition (a step array or a `{ data: [...] }`
/// document) against `inputs` using the standard transform library.
///
/// `debug` logs every executed step; it never changes the result.
pub fn execute(
    graph_definition: &Value,
    inputs: Value,
    debug: bool,
) -> EvalResult<Map<String, Value>> {
    let registry = TransformRegistry::standard();
    let config = EngineConfig::default().with_trace(debug);
    execute_with(graph_definition, inputs, &registry, &config)
}

/// Execute with an explicit registry and configuration.
pub fn execute_with(
    graph_definition: &Value,
    inputs: Value,
    registry: &TransformRegistry,
    config: &EngineConfig,
) -> EvalResult<Map<String, Value>> {
    let document = GraphDocument::from_value(graph_definition)?;
    if config.trace {
        info!(graph = %document.label(), steps = document.data.len(), "executing graph");
    }
    Engine::new(registry, config.clone()).run(document.data, inputs)
}
