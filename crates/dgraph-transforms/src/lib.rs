//! Transform registry for dgraph.
//!
//! A `transform` step names a function; the engine looks it up here and
//! calls it with the step's resolved `params`. [`TransformRegistry::standard`]
//! carries the stock library (arithmetic, comparisons, collection and object
//! shaping); hosts can register their own functions alongside it.

mod error;
mod params;
mod registry;

pub mod collection;
pub mod logic;
pub mod math;
pub mod object;

pub use error::{TransformError, TransformResult};
pub use registry::{TransformFn, TransformRegistry};
