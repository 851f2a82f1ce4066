//! Command definitions
//!
//! Commands represent intentions to change member state. They carry raw,
//! unvalidated input; validation happens in the value objects and the
//! aggregate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Gender;

/// Command to register a new member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterMember {
    pub member_id: String,
    pub email: String,
    /// Pre-hashed credential. Hashing is the caller's responsibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl RegisterMember {
    pub fn new(member_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            email: email.into(),
            password_hash: None,
        }
    }

    pub fn with_password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = Some(password_hash.into());
        self
    }
}

/// Command to replace a member's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub member_id: String,
    pub display_name: String,
    pub bio: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
}

/// Command to activate a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateMember {
    pub member_id: String,
}

impl ActivateMember {
    pub fn new(member_id: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
        }
    }
}
