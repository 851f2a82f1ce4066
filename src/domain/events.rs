//! Domain Events
//!
//! Event definitions for the member stream. Events are immutable facts that
//! have happened to one member; they are the only durable representation of
//! member state.
//!
//! The variant set is closed: adding a variant means extending the enum, the
//! `event_type` table, and the decode dispatch in [`MemberEvent::decode`]
//! together.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Email, Gender};

/// Member stream events.
///
/// Every variant carries the member id and the time the fact occurred. The
/// serde tag matches the stored `event_type` column, so the persisted payload
/// is self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MemberEvent {
    /// A member registered with a (normalized) email address.
    #[serde(rename = "member.registered")]
    MemberRegistered {
        member_id: String,
        email: Email,
        occurred_at: DateTime<Utc>,
    },

    /// The member replaced their profile.
    #[serde(rename = "member.profile_updated")]
    ProfileUpdated {
        member_id: String,
        display_name: String,
        bio: String,
        birth_date: NaiveDate,
        gender: Gender,
        #[serde(default)]
        interests: Vec<String>,
        #[serde(default)]
        photos: Vec<String>,
        occurred_at: DateTime<Utc>,
    },

    /// The member became active.
    #[serde(rename = "member.activated")]
    MemberActivated {
        member_id: String,
        occurred_at: DateTime<Utc>,
    },

    /// The member was suspended. No command stages this yet; the variant is
    /// kept so replay stays exhaustive over historical streams.
    #[serde(rename = "member.suspended")]
    MemberSuspended {
        member_id: String,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
}

/// Stable event type tags, also used as the stored `event_type` column.
pub const EVENT_TYPE_REGISTERED: &str = "member.registered";
pub const EVENT_TYPE_PROFILE_UPDATED: &str = "member.profile_updated";
pub const EVENT_TYPE_ACTIVATED: &str = "member.activated";
pub const EVENT_TYPE_SUSPENDED: &str = "member.suspended";

impl MemberEvent {
    /// Get the event type tag as a string.
    pub fn event_type(&self) -> &'static str {
        match self {
            MemberEvent::MemberRegistered { .. } => EVENT_TYPE_REGISTERED,
            MemberEvent::ProfileUpdated { .. } => EVENT_TYPE_PROFILE_UPDATED,
            MemberEvent::MemberActivated { .. } => EVENT_TYPE_ACTIVATED,
            MemberEvent::MemberSuspended { .. } => EVENT_TYPE_SUSPENDED,
        }
    }

    /// Get the member id this event relates to.
    pub fn member_id(&self) -> &str {
        match self {
            MemberEvent::MemberRegistered { member_id, .. } => member_id,
            MemberEvent::ProfileUpdated { member_id, .. } => member_id,
            MemberEvent::MemberActivated { member_id, .. } => member_id,
            MemberEvent::MemberSuspended { member_id, .. } => member_id,
        }
    }

    /// When the fact occurred.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MemberEvent::MemberRegistered { occurred_at, .. } => *occurred_at,
            MemberEvent::ProfileUpdated { occurred_at, .. } => *occurred_at,
            MemberEvent::MemberActivated { occurred_at, .. } => *occurred_at,
            MemberEvent::MemberSuspended { occurred_at, .. } => *occurred_at,
        }
    }

    /// Serialize this event to its stored JSON payload.
    pub fn encode(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Decode a stored payload, dispatching on the stored `event_type` tag.
    ///
    /// An unrecognized tag fails the whole load: skipping an event would
    /// silently corrupt the replayed state.
    pub fn decode(event_type: &str, data: &serde_json::Value) -> Result<Self, EventDecodeError> {
        match event_type {
            EVENT_TYPE_REGISTERED
            | EVENT_TYPE_PROFILE_UPDATED
            | EVENT_TYPE_ACTIVATED
            | EVENT_TYPE_SUSPENDED => Ok(serde_json::from_value(data.clone())?),
            other => Err(EventDecodeError::UnknownEventType(other.to_string())),
        }
    }
}

/// Failures while decoding stored events back into [`MemberEvent`]s.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("invalid event payload: {0}")]
    Payload(#[from] serde_json::Error),
}
