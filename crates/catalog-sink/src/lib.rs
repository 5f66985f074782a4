//! Document sink trait abstraction.
//!
//! This crate defines the `DocumentSink` trait that abstracts over the search
//! store the catalog is published into. `elasticsearch-sink` implements it
//! over HTTP; the root crate ships an in-memory implementation for tests.

mod error;
mod traits;

pub use error::SinkError;
pub use traits::{DocumentSink, ItemResult};
