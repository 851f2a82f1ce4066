//! Common test utilities

use member_core::{db, Config};
use sqlx::PgPool;

/// Connect to the test database and ensure the schema is in place.
///
/// Returns `None` (and the caller skips) when `DATABASE_URL` is not set, so
/// the suite stays runnable without a local Postgres.
pub async fn try_setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "member_core=debug".into()),
        )
        .try_init();

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping: DATABASE_URL not set");
            return None;
        }
    };

    let config = Config {
        database_url,
        database_max_connections: 5,
        environment: "test".to_string(),
    };
    let pool = db::connect(&config).await.expect("Failed to connect to DB");
    db::verify_connection(&pool)
        .await
        .expect("Failed to verify DB connection");

    // Apply the schema. Tests isolate themselves with unique member ids
    // instead of truncating, so suites can run in parallel.
    let schema = include_str!("../../migrations/0001_member_schema.sql");
    sqlx::raw_sql(schema)
        .execute(&pool)
        .await
        .expect("Failed to apply schema");
    assert!(db::check_schema(&pool).await.expect("schema check failed"));

    Some(pool)
}

/// A member id unique to one test run.
pub fn unique_member_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}
