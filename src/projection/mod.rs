//! Projection module
//!
//! Read-model maintenance for member queries. The `members` row is
//! denormalized current state, never authoritative: it is rebuildable at any
//! time by replaying the event streams.

mod member_view;

pub use member_view::{MemberProjection, MemberView, ProjectionError};
