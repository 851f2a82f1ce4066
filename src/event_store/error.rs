//! Event Store Errors

use thiserror::Error;

/// Errors that can occur in the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict: the expected version no longer
    /// matches the stream. Nothing was written.
    #[error("concurrency conflict on stream {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        aggregate_id: String,
        expected: i64,
        actual: i64,
    },

    /// The stream has never been appended to.
    #[error("event stream not found: {0}")]
    StreamNotFound(String),

    /// Event payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying database failure. The enclosing transaction was rolled
    /// back.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EventStoreError {
    /// Check if this error is a concurrency conflict.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }

    /// Check if this error indicates a missing stream.
    pub fn is_stream_not_found(&self) -> bool {
        matches!(self, EventStoreError::StreamNotFound(_))
    }
}
