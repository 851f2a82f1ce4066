//! member_core
//!
//! Event-sourced member persistence core. Member state changes are captured
//! as an ordered, append-only log of immutable events, persisted with
//! optimistic concurrency control and reconstructed on demand by replaying
//! that log. A denormalized read model is updated in the same transaction as
//! each append, so email lookups stay exactly in sync with the authoritative
//! stream.
//!
//! Wire-protocol translation, authentication and process bootstrapping are
//! external collaborators consuming the [`repository::MemberRepository`] and
//! [`event_store::EventStore`] contracts.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod event_store;
pub mod projection;
pub mod repository;
pub mod service;

pub use aggregate::{Aggregate, Member, MemberStatus};
pub use config::Config;
pub use domain::{DomainError, Email, Gender, MemberEvent, Profile};
pub use error::{AppError, AppResult};
pub use event_store::{
    EventStore, EventStoreError, ExpectedVersion, InMemoryEventStore, PostgresEventStore,
    StoredEvent,
};
pub use projection::{MemberProjection, MemberView};
pub use repository::{InMemoryMemberRepository, MemberRepository, PostgresMemberRepository};
pub use service::MemberService;
