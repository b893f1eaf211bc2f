//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Nesting bound used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Per-run engine settings, passed in explicitly rather than read from
/// process-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Log every executed step and sub-graph activation. Never changes
    /// results.
    pub trace: bool,
    /// Maximum nesting of graph activations (the root run, sub-graph
    /// invocations and implicit template calls) before the run fails with
    /// `CyclicReference`. Lookahead within one graph is not counted.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trace: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
