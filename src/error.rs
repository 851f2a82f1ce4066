//! Error handling module
//!
//! Centralized error type surfaced by the repository and service layers.
//! Collaborators (the wire-protocol layer) map these kinds to transport
//! codes; that mapping is out of this crate's scope.

use crate::config::ConfigError;
use crate::domain::{DomainError, EventDecodeError};
use crate::event_store::EventStoreError;
use crate::projection::ProjectionError;

/// Application-wide Result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Business rule violation. Never touches storage.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No event stream (or read-model row) exists for the member.
    #[error("member not found: {0}")]
    MemberNotFound(String),

    /// Another member already holds this email address.
    #[error("member with email {0} already exists")]
    AlreadyExists(String),

    /// Event store failure, including optimistic concurrency conflicts.
    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    /// A stored event could not be decoded; the whole load is aborted.
    #[error(transparent)]
    Decode(#[from] EventDecodeError),

    /// Infrastructure failure. The enclosing transaction was rolled back.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<ProjectionError> for AppError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::DuplicateEmail(email) => AppError::AlreadyExists(email),
            ProjectionError::Database(e) => AppError::Database(e),
            ProjectionError::Decode(e) => AppError::Decode(e),
        }
    }
}

impl AppError {
    /// Check if this error means the member does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::MemberNotFound(_) | AppError::EventStore(EventStoreError::StreamNotFound(_))
        )
    }

    /// Check if this error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AppError::EventStore(EventStoreError::ConcurrencyConflict { .. })
        )
    }
}
