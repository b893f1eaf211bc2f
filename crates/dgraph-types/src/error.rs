use thiserror::Error;

/// Errors raised while turning a persisted graph document into a [`Graph`].
///
/// [`Graph`]: crate::Graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The document is neither a step array nor a `{ data: [...] }` wrapper.
    #[error("graph definition must be a step array or a document with a `data` array")]
    NotAGraph,

    /// A step object carries no `type` tag.
    #[error("step at {location} has no `type`")]
    MissingStepType { location: String },

    /// A step's `type` is not one of the recognised variants.
    #[error("unknown step type '{found}' at {location}")]
    UnknownStepType { location: String, found: String },

    /// Two steps in the same graph share a name.
    #[error("duplicate step name '{name}' at {location}")]
    DuplicateStepName { location: String, name: String },

    /// The step fields do not match the shape required by its type.
    #[error("malformed graph definition: {0}")]
    Malformed(String),
}

/// Errors raised by the path resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// More than one wildcard, or a `*` that is not a whole segment.
    #[error("unsupported path syntax '{path}': only a single standalone `*` segment can be iterated over")]
    UnsupportedSyntax { path: String },

    /// The value in front of the wildcard is not a sequence.
    #[error("type mismatch: wildcard target '{target}' in path '{path}' is not an iterable")]
    NotIterable { path: String, target: String },
}
