//! Sink error taxonomy.

use std::time::Duration;
use thiserror::Error;

/// Whole-call failures of a document sink.
///
/// Per-item rejections are not errors; they are reported through
/// [`crate::ItemResult`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// The transport could not be established.
    #[error("sink unavailable: {0}")]
    Unavailable(String),
    /// The sink answered but refused the request as a whole.
    #[error("sink rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// The call did not complete within the configured bound.
    #[error("sink call timed out after {0:?}")]
    TimedOut(Duration),
    /// The sink answered with a body that could not be understood.
    #[error("failed to decode sink response: {0}")]
    Decode(String),
}
