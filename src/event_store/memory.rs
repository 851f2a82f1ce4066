//! In-memory Event Store
//!
//! Explicitly constructed, dependency-injected store used by unit tests and
//! the in-memory repository. Locking is scoped per stream: concurrent
//! appends to different aggregates never serialize on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{EventStore, EventStoreError, ExpectedVersion, NewEvent, StoredEvent};

type Stream = Arc<Mutex<Vec<StoredEvent>>>;

/// In-memory, per-stream-locked event store.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<String, Stream>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stream handle for an aggregate, creating it on first append.
    fn stream(&self, aggregate_id: &str, create: bool) -> Option<Stream> {
        {
            let streams = self.streams.read().expect("streams lock poisoned");
            if let Some(stream) = streams.get(aggregate_id) {
                return Some(Arc::clone(stream));
            }
        }

        if !create {
            return None;
        }

        let mut streams = self.streams.write().expect("streams lock poisoned");
        let stream = streams
            .entry(aggregate_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())));
        Some(Arc::clone(stream))
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        aggregate_id: &str,
        expected: ExpectedVersion,
        events: Vec<NewEvent>,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let stream = self
            .stream(aggregate_id, true)
            .expect("stream created on append");
        let mut stream = stream.lock().expect("stream lock poisoned");

        let current = stream.len() as i64;
        if let ExpectedVersion::Exact(expected) = expected {
            if current != expected {
                return Err(EventStoreError::ConcurrencyConflict {
                    aggregate_id: aggregate_id.to_string(),
                    expected,
                    actual: current,
                });
            }
        }

        let now = Utc::now();
        let mut appended = Vec::with_capacity(events.len());
        for (i, event) in events.into_iter().enumerate() {
            let stored = StoredEvent {
                event_id: Uuid::new_v4(),
                aggregate_id: aggregate_id.to_string(),
                aggregate_type: event.aggregate_type,
                event_type: event.event_type,
                event_data: event.event_data,
                metadata: serde_json::to_value(&event.metadata)?,
                version: current + i as i64 + 1,
                created_at: now,
            };
            stream.push(stored.clone());
            appended.push(stored);
        }

        Ok(appended)
    }

    async fn load(&self, aggregate_id: &str) -> Result<Vec<StoredEvent>, EventStoreError> {
        let stream = self
            .stream(aggregate_id, false)
            .ok_or_else(|| EventStoreError::StreamNotFound(aggregate_id.to_string()))?;
        let stream = stream.lock().expect("stream lock poisoned");
        Ok(stream.clone())
    }

    async fn load_from(
        &self,
        aggregate_id: &str,
        from_version: i64,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let stream = self
            .stream(aggregate_id, false)
            .ok_or_else(|| EventStoreError::StreamNotFound(aggregate_id.to_string()))?;
        let stream = stream.lock().expect("stream lock poisoned");

        let skip = from_version.max(0) as usize;
        if skip >= stream.len() {
            return Ok(Vec::new());
        }
        Ok(stream[skip..].to_vec())
    }
}
