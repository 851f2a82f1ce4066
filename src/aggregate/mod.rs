//! Aggregate module
//!
//! Aggregate Root pattern implementation for Event Sourcing.

pub mod member;

pub use member::{Member, MemberStatus};

/// Aggregate trait that all event-sourced aggregates implement.
pub trait Aggregate: Sized + Default {
    /// The type of events this aggregate handles.
    type Event;

    /// Get the aggregate type name (for storage).
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID.
    fn aggregate_id(&self) -> &str;

    /// Get the current version (number of events applied).
    fn version(&self) -> i64;

    /// Apply an event to update the aggregate state.
    ///
    /// This is the single state-transition path, used both when staging a
    /// new event and when replaying history, so replay reproduces exactly
    /// the state produced by live command execution.
    fn apply(&mut self, event: Self::Event);

    /// Rebuild an aggregate by replaying an ordered event stream onto a
    /// zero-value instance.
    fn rehydrate<I>(events: I) -> Self
    where
        I: IntoIterator<Item = Self::Event>,
    {
        let mut aggregate = Self::default();
        for event in events {
            aggregate.apply(event);
        }
        aggregate
    }
}
