//! PostgreSQL Member Repository
//!
//! Writes the event rows and the read-model upsert in one transaction, so no
//! reader can observe a committed event without its projection update or
//! vice versa. The expected version is re-validated inside the transaction;
//! the unique `(aggregate_id, version)` index is the backstop against racing
//! writers.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::aggregate::{Aggregate, Member};
use crate::domain::{Email, MemberEvent};
use crate::error::{AppError, AppResult};
use crate::event_store::{is_unique_violation, EventMetadata, EventStoreError};
use crate::projection::MemberProjection;

use super::MemberRepository;

/// PostgreSQL-backed member repository.
#[derive(Debug, Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Shared commit path for `save` and `save_with_password`.
    async fn commit_changes(
        &self,
        member: &mut Member,
        password_hash: Option<&str>,
    ) -> AppResult<()> {
        if !member.has_changes() {
            // Idempotent no-op: nothing staged, nothing to write.
            return Ok(());
        }

        let base_version = member.version() - member.changes().len() as i64;
        let mut tx = self.pool.begin().await?;

        self.insert_events(&mut tx, member, base_version).await?;

        MemberProjection::upsert(&mut tx, member).await?;

        if let Some(hash) = password_hash {
            sqlx::query(
                r#"
                INSERT INTO member_credentials (member_id, password_hash)
                VALUES ($1, $2)
                ON CONFLICT (member_id) DO UPDATE SET
                    password_hash = EXCLUDED.password_hash,
                    updated_at = NOW()
                "#,
            )
            .bind(member.id())
            .bind(hash)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            member_id = member.id(),
            version = member.version(),
            "member saved"
        );

        member.clear_changes();
        Ok(())
    }

    async fn stream_head<'e, E>(executor: E, aggregate_id: &str) -> Result<i64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM events WHERE aggregate_id = $1")
                .bind(aggregate_id)
                .fetch_optional(executor)
                .await?
                .flatten();

        Ok(version.unwrap_or(0))
    }

    async fn insert_events(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        member: &Member,
        base_version: i64,
    ) -> AppResult<()> {
        let current = Self::stream_head(&mut **tx, member.id()).await?;

        if current != base_version {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id: member.id().to_string(),
                expected: base_version,
                actual: current,
            }
            .into());
        }

        for (i, event) in member.changes().iter().enumerate() {
            let version = base_version + i as i64 + 1;
            let event_data = event.encode().map_err(EventStoreError::Serialization)?;
            let metadata = serde_json::to_value(EventMetadata::default())
                .map_err(EventStoreError::Serialization)?;

            let inserted = sqlx::query(
                r#"
                INSERT INTO events (
                    aggregate_id, aggregate_type, event_type, event_data, metadata, version
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(member.id())
            .bind(Member::aggregate_type())
            .bind(event.event_type())
            .bind(&event_data)
            .bind(&metadata)
            .bind(version)
            .execute(&mut **tx)
            .await;

            if let Err(e) = inserted {
                if is_unique_violation(&e) {
                    // A racing writer landed this version first. The
                    // transaction is aborted, so the stream head comes from a
                    // fresh connection; the racer has committed by now.
                    let actual = Self::stream_head(&self.pool, member.id()).await?;
                    return Err(AppError::EventStore(EventStoreError::ConcurrencyConflict {
                        aggregate_id: member.id().to_string(),
                        expected: base_version,
                        actual,
                    }));
                }
                return Err(AppError::Database(e));
            }
        }

        Ok(())
    }

    async fn load_stream(&self, id: &str) -> AppResult<Vec<MemberEvent>> {
        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(
            r#"
            SELECT event_type, event_data
            FROM events
            WHERE aggregate_id = $1 AND aggregate_type = $2
            ORDER BY version ASC
            "#,
        )
        .bind(id)
        .bind(Member::aggregate_type())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(AppError::MemberNotFound(id.to_string()));
        }

        let mut events = Vec::with_capacity(rows.len());
        for (event_type, data) in &rows {
            events.push(MemberEvent::decode(event_type, data)?);
        }
        Ok(events)
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn save(&self, member: &mut Member) -> AppResult<()> {
        self.commit_changes(member, None).await
    }

    async fn save_with_password(&self, member: &mut Member, password_hash: &str) -> AppResult<()> {
        self.commit_changes(member, Some(password_hash)).await
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Member> {
        let events = self.load_stream(id).await?;
        Ok(Member::rehydrate(events))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Member> {
        // Stored addresses are normalized; normalize the probe the same way
        // so lookups are case-insensitive end to end.
        let email = Email::parse(email)?;

        let projection = MemberProjection::new(self.pool.clone());
        let id = projection
            .find_id_by_email(email.as_str())
            .await?
            .ok_or_else(|| AppError::MemberNotFound(email.to_string()))?;

        self.get_by_id(&id).await
    }

    async fn get_password_hash(&self, id: &str) -> AppResult<String> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM member_credentials WHERE member_id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        hash.ok_or_else(|| AppError::MemberNotFound(id.to_string()))
    }
}
