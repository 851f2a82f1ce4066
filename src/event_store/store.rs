//! Event Store contract
//!
//! Stream-oriented append/load interface consumed by the repository layer.
//! Versions are 1-based and contiguous within a stream; the store assigns
//! them at append time together with the server-side timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EventStoreError;

/// Free-form metadata stored alongside each event (correlation, causation,
/// acting user).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl EventMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn with_causation_id(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// An event ready to be appended. The store assigns id, version and
/// timestamp.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub aggregate_type: String,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub metadata: EventMetadata,
}

impl NewEvent {
    /// Build a new event from a serializable payload.
    pub fn new<E: Serialize>(
        aggregate_type: &str,
        event_type: &str,
        event: &E,
    ) -> Result<Self, EventStoreError> {
        let event_data = serde_json::to_value(event)?;
        Ok(Self {
            aggregate_type: aggregate_type.to_string(),
            event_type: event_type.to_string(),
            event_data,
            metadata: EventMetadata::default(),
        })
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A persisted event record.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub metadata: serde_json::Value,
    /// Stream-relative sequence number, 1-based, contiguous.
    pub version: i64,
    /// Server-assigned at append time.
    pub created_at: DateTime<Utc>,
}

/// Expected stream version for an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip the concurrency check. Only safe for initial-append-only
    /// callers; the repository always uses `Exact`.
    Any,
    /// The stream must currently hold exactly this many events.
    Exact(i64),
}

/// Append-only, optimistic-concurrency-checked event log.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Atomically append `events` to the stream.
    ///
    /// With `ExpectedVersion::Exact(v)`, fails with `ConcurrencyConflict`
    /// (writing nothing) unless the stream currently holds exactly `v`
    /// events. On success the events receive versions `v+1..=v+n` in input
    /// order; either all land or none do.
    async fn append(
        &self,
        aggregate_id: &str,
        expected: ExpectedVersion,
        events: Vec<NewEvent>,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Load the full ordered stream. Fails with `StreamNotFound` if the
    /// stream has never been appended to.
    async fn load(&self, aggregate_id: &str) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Load the suffix strictly after `from_version`. Returns an empty list
    /// (not an error) when `from_version` is at or past the head of a
    /// present stream. Extension point for incremental replay from a
    /// snapshot.
    async fn load_from(
        &self,
        aggregate_id: &str,
        from_version: i64,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;
}
