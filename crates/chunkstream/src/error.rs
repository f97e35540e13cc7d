use chunkstream_store::{RecordKind, StoreError};
use thiserror::Error;

/// Errors produced by stream, metadata, and lifecycle operations.
///
/// A missing stream is not an error: metadata calls report it as
/// `Ok(false)` / `Ok(None)`.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid {kind} record: {reason}")]
    InvalidRecord { kind: RecordKind, reason: String },

    #[error("metadata must serialize to a JSON object, got {0}")]
    InvalidMetadata(String),

    #[error("write session aborted by an earlier error")]
    WriterAborted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StreamResult<T> = Result<T, StreamError>;
