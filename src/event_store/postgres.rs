//! PostgreSQL Event Store
//!
//! Durable backend. The expected version is re-validated inside the same
//! transaction as the inserts, with the `UNIQUE (aggregate_id, version)`
//! constraint as the backstop against racing writers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{EventStore, EventStoreError, ExpectedVersion, NewEvent, StoredEvent};

type EventRow = (
    Uuid,
    String,
    String,
    String,
    serde_json::Value,
    serde_json::Value,
    i64,
    DateTime<Utc>,
);

fn row_to_event(row: EventRow) -> StoredEvent {
    let (event_id, aggregate_id, aggregate_type, event_type, event_data, metadata, version, created_at) =
        row;
    StoredEvent {
        event_id,
        aggregate_id,
        aggregate_type,
        event_type,
        event_data,
        metadata,
        version,
        created_at,
    }
}

/// Returns true for a unique-constraint violation (SQLSTATE 23505).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version<'e, E>(executor: E, aggregate_id: &str) -> Result<i64, EventStoreError>
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
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(
        &self,
        aggregate_id: &str,
        expected: ExpectedVersion,
        events: Vec<NewEvent>,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let mut tx = self.pool.begin().await?;

        let current = Self::current_version(&mut *tx, aggregate_id).await?;
        if let ExpectedVersion::Exact(expected) = expected {
            if current != expected {
                return Err(EventStoreError::ConcurrencyConflict {
                    aggregate_id: aggregate_id.to_string(),
                    expected,
                    actual: current,
                });
            }
        }

        let mut appended = Vec::with_capacity(events.len());
        for (i, event) in events.into_iter().enumerate() {
            let version = current + i as i64 + 1;
            let metadata = serde_json::to_value(&event.metadata)?;

            let inserted: Result<(Uuid, DateTime<Utc>), sqlx::Error> = sqlx::query_as(
                r#"
                INSERT INTO events (
                    aggregate_id, aggregate_type, event_type, event_data, metadata, version
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, created_at
                "#,
            )
            .bind(aggregate_id)
            .bind(&event.aggregate_type)
            .bind(&event.event_type)
            .bind(&event.event_data)
            .bind(&metadata)
            .bind(version)
            .fetch_one(&mut *tx)
            .await;

            let row = match inserted {
                Ok(row) => row,
                Err(e) if is_unique_violation(&e) => {
                    // A racing writer landed this version first. The
                    // transaction is aborted at this point, so the stream
                    // head is re-read on a fresh connection; the racer has
                    // committed, otherwise the insert would still be waiting
                    // on its lock.
                    drop(tx);
                    let actual = Self::current_version(&self.pool, aggregate_id).await?;
                    return Err(EventStoreError::ConcurrencyConflict {
                        aggregate_id: aggregate_id.to_string(),
                        expected: current,
                        actual,
                    });
                }
                Err(e) => return Err(EventStoreError::Database(e)),
            };

            appended.push(StoredEvent {
                event_id: row.0,
                aggregate_id: aggregate_id.to_string(),
                aggregate_type: event.aggregate_type,
                event_type: event.event_type,
                event_data: event.event_data,
                metadata,
                version,
                created_at: row.1,
            });
        }

        tx.commit().await?;

        tracing::debug!(
            aggregate_id,
            count = appended.len(),
            "appended events to stream"
        );

        Ok(appended)
    }

    async fn load(&self, aggregate_id: &str) -> Result<Vec<StoredEvent>, EventStoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, aggregate_id, aggregate_type, event_type, event_data, metadata, version, created_at
            FROM events
            WHERE aggregate_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(EventStoreError::StreamNotFound(aggregate_id.to_string()));
        }

        Ok(rows.into_iter().map(row_to_event).collect())
    }

    async fn load_from(
        &self,
        aggregate_id: &str,
        from_version: i64,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, aggregate_id, aggregate_type, event_type, event_data, metadata, version, created_at
            FROM events
            WHERE aggregate_id = $1 AND version > $2
            ORDER BY version ASC
            "#,
        )
        .bind(aggregate_id)
        .bind(from_version)
        .fetch_all(&self.pool)
        .await?;

        if !rows.is_empty() {
            return Ok(rows.into_iter().map(row_to_event).collect());
        }

        // Out-of-range suffix on a present stream is empty, not an error.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM events WHERE aggregate_id = $1)")
                .bind(aggregate_id)
                .fetch_one(&self.pool)
                .await?;

        if exists {
            Ok(Vec::new())
        } else {
            Err(EventStoreError::StreamNotFound(aggregate_id.to_string()))
        }
    }
}
