//! Member read model
//!
//! One denormalized row per member, used only for lookups not keyed by
//! member id (find-by-email) and for query surfaces. The upsert runs inside
//! the caller's transaction so the row commits atomically with the event
//! append; its version always equals the stream length after a commit.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;

use crate::aggregate::{Aggregate, Member};
use crate::domain::{EventDecodeError, MemberEvent};
use crate::event_store::is_unique_violation;

/// Errors while updating or querying the read model.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The unique email index rejected the row: another member already
    /// holds this address.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Decode(#[from] EventDecodeError),
}

/// A member read-model row.
#[derive(Debug, Clone, FromRow)]
pub struct MemberView {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub interests: Vec<String>,
    pub photos: Vec<String>,
    pub status: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Maintains and queries the `members` read model.
#[derive(Debug, Clone)]
pub struct MemberProjection {
    pool: PgPool,
}

impl MemberProjection {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert the row for `member` from its current in-memory state, inside
    /// the caller's transaction.
    pub async fn upsert(
        tx: &mut Transaction<'_, Postgres>,
        member: &Member,
    ) -> Result<(), ProjectionError> {
        let profile = member.profile();

        sqlx::query(
            r#"
            INSERT INTO members (
                id, email, display_name, bio, birth_date, gender,
                interests, photos, status, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                bio = EXCLUDED.bio,
                birth_date = EXCLUDED.birth_date,
                gender = EXCLUDED.gender,
                interests = EXCLUDED.interests,
                photos = EXCLUDED.photos,
                status = EXCLUDED.status,
                version = EXCLUDED.version,
                updated_at = NOW()
            "#,
        )
        .bind(member.id())
        .bind(member.email().as_str())
        .bind(profile.map(|p| p.display_name.as_str()))
        .bind(profile.map(|p| p.bio.as_str()))
        .bind(profile.map(|p| p.birth_date))
        .bind(profile.map(|p| p.gender.as_str()))
        .bind(profile.map(|p| p.interests.clone()).unwrap_or_default())
        .bind(profile.map(|p| p.photos.clone()).unwrap_or_default())
        .bind(member.status().as_str())
        .bind(member.version())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ProjectionError::DuplicateEmail(member.email().to_string())
            } else {
                ProjectionError::Database(e)
            }
        })?;

        Ok(())
    }

    /// Resolve a member id by normalized email. The read model is a
    /// secondary index only; callers rehydrate from the stream.
    pub async fn find_id_by_email(&self, email: &str) -> Result<Option<String>, ProjectionError> {
        let id: Option<String> = sqlx::query_scalar("SELECT id FROM members WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    /// Fetch a full read-model row (query surface, non-authoritative).
    pub async fn get(&self, id: &str) -> Result<Option<MemberView>, ProjectionError> {
        let view = sqlx::query_as::<_, MemberView>(
            r#"
            SELECT id, email, display_name, bio, birth_date, gender,
                   interests, photos, status, version, created_at, updated_at
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(view)
    }

    /// Rebuild every row from the event streams. Returns the number of
    /// members rebuilt.
    pub async fn rebuild(&self) -> Result<u64, ProjectionError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT aggregate_id FROM events WHERE aggregate_type = 'Member'",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut rebuilt = 0u64;
        for id in ids {
            let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(
                r#"
                SELECT event_type, event_data
                FROM events
                WHERE aggregate_id = $1
                ORDER BY version ASC
                "#,
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await?;

            let mut events = Vec::with_capacity(rows.len());
            for (event_type, data) in &rows {
                events.push(MemberEvent::decode(event_type, data)?);
            }
            let member = Member::rehydrate(events);

            let mut tx = self.pool.begin().await?;
            Self::upsert(&mut tx, &member).await?;
            tx.commit().await?;
            rebuilt += 1;
        }

        tracing::info!(rebuilt, "member read model rebuilt from event streams");
        Ok(rebuilt)
    }
}
