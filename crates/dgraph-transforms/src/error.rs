//! Transform error types.

use thiserror::Error;

/// Errors a transform function can raise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// No function is registered under this name.
    #[error("no such function: {0}")]
    NotFound(String),

    /// A parameter is missing or has the wrong shape.
    #[error("parameter '{param}' expected {expected}, found {found}")]
    InvalidParam {
        param: String,
        expected: &'static str,
        found: String,
    },

    /// Two collections combined element-wise differ in length.
    #[error("collections must be equal in length (a: {a}, b: {b})")]
    LengthMismatch { a: usize, b: usize },

    /// Arithmetic produced NaN or an infinity.
    #[error("{0} produced a non-finite number")]
    NonFinite(String),
}

/// Result type for transform functions.
pub type TransformResult<T> = Result<T, TransformError>;
