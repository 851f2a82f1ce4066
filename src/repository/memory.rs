//! In-memory Member Repository
//!
//! Test double pairing the in-memory event store with a mutex-guarded read
//! model. The read-model lock spans the append and the row update, so saves
//! stay atomic from the caller's point of view, mirroring the Postgres
//! transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::aggregate::{Aggregate, Member};
use crate::domain::{Email, MemberEvent};
use crate::error::{AppError, AppResult};
use crate::event_store::{
    EventStore, EventStoreError, ExpectedVersion, InMemoryEventStore, NewEvent,
};

use super::MemberRepository;

/// Denormalized read-model row.
#[derive(Debug, Clone)]
struct MemberRow {
    id: String,
    email: String,
    version: i64,
}

#[derive(Debug, Default)]
struct ReadModel {
    rows: HashMap<String, MemberRow>,
    credentials: HashMap<String, String>,
}

/// In-memory member repository for tests and embedded use.
#[derive(Debug, Default)]
pub struct InMemoryMemberRepository {
    store: InMemoryEventStore,
    read_model: Mutex<ReadModel>,
}

impl InMemoryMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct access to the underlying stream log, for incremental-replay
    /// callers.
    pub fn event_store(&self) -> &InMemoryEventStore {
        &self.store
    }

    async fn commit_changes(
        &self,
        member: &mut Member,
        password_hash: Option<&str>,
    ) -> AppResult<()> {
        if !member.has_changes() {
            return Ok(());
        }

        let base_version = member.version() - member.changes().len() as i64;

        let mut read_model = self.read_model.lock().await;

        // Storage-level uniqueness stand-in: reject an email held by another
        // member before anything is appended.
        let email = member.email().as_str();
        if read_model
            .rows
            .values()
            .any(|row| row.email == email && row.id != member.id())
        {
            return Err(AppError::AlreadyExists(email.to_string()));
        }

        let mut new_events = Vec::with_capacity(member.changes().len());
        for event in member.changes() {
            new_events.push(
                NewEvent::new(Member::aggregate_type(), event.event_type(), event)
                    .map_err(AppError::EventStore)?,
            );
        }

        self.store
            .append(member.id(), ExpectedVersion::Exact(base_version), new_events)
            .await?;

        read_model.rows.insert(
            member.id().to_string(),
            MemberRow {
                id: member.id().to_string(),
                email: email.to_string(),
                version: member.version(),
            },
        );

        if let Some(hash) = password_hash {
            read_model
                .credentials
                .insert(member.id().to_string(), hash.to_string());
        }

        member.clear_changes();
        Ok(())
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn save(&self, member: &mut Member) -> AppResult<()> {
        self.commit_changes(member, None).await
    }

    async fn save_with_password(&self, member: &mut Member, password_hash: &str) -> AppResult<()> {
        self.commit_changes(member, Some(password_hash)).await
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Member> {
        let stored = self.store.load(id).await.map_err(|e| match e {
            EventStoreError::StreamNotFound(id) => AppError::MemberNotFound(id),
            other => AppError::EventStore(other),
        })?;

        let mut events = Vec::with_capacity(stored.len());
        for record in &stored {
            events.push(MemberEvent::decode(&record.event_type, &record.event_data)?);
        }

        Ok(Member::rehydrate(events))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Member> {
        // Stored addresses are normalized; normalize the probe the same way.
        let email = Email::parse(email)?;

        let id = {
            let read_model = self.read_model.lock().await;
            read_model
                .rows
                .values()
                .find(|row| row.email == email.as_str())
                .map(|row| row.id.clone())
        };

        match id {
            Some(id) => self.get_by_id(&id).await,
            None => Err(AppError::MemberNotFound(email.to_string())),
        }
    }

    async fn get_password_hash(&self, id: &str) -> AppResult<String> {
        let read_model = self.read_model.lock().await;
        read_model
            .credentials
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::MemberNotFound(id.to_string()))
    }
}
