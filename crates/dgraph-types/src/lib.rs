//! Shared types for dgraph.
//!
//! This crate defines the declarative graph model (steps, graphs, the
//! persisted document wrapper), the dotted-path resolver used to address
//! runtime values, and the error types raised while loading graphs or
//! walking paths.

mod error;
pub mod graph;
pub mod path;
pub mod value;

pub use error::{GraphError, PathError};
pub use graph::{
    CollectionMode, Graph, GraphDocument, GraphRef, GraphStep, InvokeMode, Step, StepKind,
    DEFAULT_CASE,
};

/// Result type used when loading graph definitions.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Result type used by the path resolver.
pub type PathResult<T> = std::result::Result<T, PathError>;
