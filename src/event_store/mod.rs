//! Event Store module
//!
//! Append-only, per-aggregate-stream event log with optimistic concurrency
//! control. Two backends: PostgreSQL for durable storage and an in-memory
//! store for tests and embedded use.

mod error;
mod memory;
mod postgres;
mod store;

pub use error::EventStoreError;
pub(crate) use postgres::is_unique_violation;
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{EventMetadata, EventStore, ExpectedVersion, NewEvent, StoredEvent};
