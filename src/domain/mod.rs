//! Domain module
//!
//! Core domain types and business rules for members.

pub mod commands;
pub mod email;
pub mod error;
pub mod events;
pub mod profile;

pub use commands::{ActivateMember, RegisterMember, UpdateProfile};
pub use email::Email;
pub use error::DomainError;
pub use events::{EventDecodeError, MemberEvent};
pub use profile::{Gender, Profile};
