//! Metadata source abstraction.

use thiserror::Error;

use crate::row::MetadataRow;

/// Errors a metadata source can report.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be reached or the connection dropped.
    #[error("connection error: {0}")]
    Connection(String),
    /// The source was reachable but rejected the query.
    #[error("query error: {0}")]
    Query(String),
    /// The fetch did not complete within the configured bound.
    #[error("metadata fetch timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

/// Trait for reading column metadata out of a relational catalog.
///
/// Implementations must pass `database_name` to the backend as a bound
/// parameter and never interpolate it into query text.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Identifier stored in each document's `source` field (e.g. `"mysql"`).
    fn source_kind(&self) -> &str;

    /// Fetch one row per column for every table in `database_name`.
    async fn fetch_rows(&self, database_name: &str) -> Result<Vec<MetadataRow>, SourceError>;
}
