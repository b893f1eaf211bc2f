//! Runtime error types for the dgraph engine.

use dgraph_transforms::TransformError;
use dgraph_types::{GraphError, PathError};
use thiserror::Error;

/// Fatal execution error. Any of these aborts the whole top-level run;
/// there is no partial output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The graph definition could not be loaded.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Unsupported path syntax, or a wildcard over a non-sequence.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A `transform` step names a function absent from the registry.
    #[error("unknown transform '{function}' in step '{step}'")]
    UnknownTransform { step: String, function: String },

    /// A `graph` step names a template that has not been registered.
    #[error("undefined template '{template}' in step '{step}'")]
    UndefinedTemplate { step: String, template: String },

    /// A step operates on a value of the wrong shape.
    #[error("type mismatch in step '{step}': {message}")]
    TypeMismatch { step: String, message: String },

    /// A branch's test value matches neither a case nor the default.
    #[error("no matching case for {value} in branch '{step}'")]
    NoMatchingCase { step: String, value: String },

    /// Nesting exceeded the configured depth, almost always a reference
    /// cycle through templates or parent scopes.
    #[error("cyclic reference: nesting exceeded depth {depth} at '{at}'")]
    CyclicReference { at: String, depth: usize },

    /// A transform function failed.
    #[error("transform '{function}' failed in step '{step}': {source}")]
    Transform {
        step: String,
        function: String,
        #[source]
        source: TransformError,
    },
}

/// Result alias for engine operations.
pub type EvalResult<T> = Result<T, EvalError>;
