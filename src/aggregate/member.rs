//! Member Aggregate
//!
//! The unit of consistency for member state. Commands validate first, then
//! stage exactly one event and apply it immediately, so in-process logic
//! always sees up-to-date state before persistence. Durable state is the
//! event stream, never this in-memory value.

use chrono::{DateTime, Utc};

use crate::domain::{DomainError, Email, Gender, MemberEvent, Profile};

use super::Aggregate;

/// Member lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberStatus {
    #[default]
    Pending,
    Active,
    Suspended,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "pending",
            MemberStatus::Active => "active",
            MemberStatus::Suspended => "suspended",
        }
    }
}

/// Member Aggregate
///
/// State is derived solely from the member's own event stream. The pending
/// `changes` buffer holds staged, not-yet-persisted events; it is cleared
/// only on a confirmed commit from the repository.
#[derive(Debug, Clone, Default)]
pub struct Member {
    id: String,
    email: Email,
    profile: Option<Profile>,
    status: MemberStatus,
    version: i64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,

    changes: Vec<MemberEvent>,
}

impl Member {
    /// Register a new member.
    ///
    /// Validates and normalizes the email, then stages `member.registered`.
    /// The resulting aggregate is at version 1 with status `Pending`.
    pub fn register(id: impl Into<String>, email: &str) -> Result<Self, DomainError> {
        let email = Email::parse(email)?;

        let mut member = Self::default();
        member.raise(MemberEvent::MemberRegistered {
            member_id: id.into(),
            email,
            occurred_at: Utc::now(),
        });

        Ok(member)
    }

    /// Replace the member's profile.
    ///
    /// The profile is already validated by [`Profile::new`]; this only
    /// stages the fact.
    pub fn update_profile(&mut self, profile: Profile) {
        self.raise(MemberEvent::ProfileUpdated {
            member_id: self.id.clone(),
            display_name: profile.display_name,
            bio: profile.bio,
            birth_date: profile.birth_date,
            gender: profile.gender,
            interests: profile.interests,
            photos: profile.photos,
            occurred_at: Utc::now(),
        });
    }

    /// Transition to `Active`. Idempotent: an already-active member stages
    /// nothing.
    pub fn activate(&mut self) {
        if self.status == MemberStatus::Active {
            return;
        }

        self.raise(MemberEvent::MemberActivated {
            member_id: self.id.clone(),
            occurred_at: Utc::now(),
        });
    }

    /// Stage an event and apply it to local state.
    fn raise(&mut self, event: MemberEvent) {
        self.changes.push(event.clone());
        self.apply(event);
    }

    /// Staged, not-yet-persisted events in command order.
    pub fn changes(&self) -> &[MemberEvent] {
        &self.changes
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Clear the pending-changes buffer. Called by the repository after a
    /// successful commit, never speculatively.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn status(&self) -> MemberStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Aggregate for Member {
    type Event = MemberEvent;

    fn aggregate_type() -> &'static str {
        "Member"
    }

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: MemberEvent) {
        match event {
            MemberEvent::MemberRegistered {
                member_id,
                email,
                occurred_at,
            } => {
                self.id = member_id;
                self.email = email;
                self.status = MemberStatus::Pending;
                self.created_at = Some(occurred_at);
                self.updated_at = Some(occurred_at);
            }

            MemberEvent::ProfileUpdated {
                display_name,
                bio,
                birth_date,
                gender,
                interests,
                photos,
                occurred_at,
                ..
            } => {
                self.profile = Some(Profile {
                    display_name,
                    bio,
                    birth_date,
                    gender,
                    interests,
                    photos,
                });
                self.updated_at = Some(occurred_at);
            }

            MemberEvent::MemberActivated { occurred_at, .. } => {
                self.status = MemberStatus::Active;
                self.updated_at = Some(occurred_at);
            }

            MemberEvent::MemberSuspended { occurred_at, .. } => {
                self.status = MemberStatus::Suspended;
                self.updated_at = Some(occurred_at);
            }
        }

        self.version += 1;
    }
}
