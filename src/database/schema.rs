use sqlx::PgPool;
use tracing::info;

use super::DatabaseError;

const STATEMENTS: &[&str] = &[
    "CREATE SCHEMA IF NOT EXISTS starter",
    r#"
    CREATE TABLE IF NOT EXISTS starter.users (
        firebase_uid VARCHAR(128) PRIMARY KEY,
        email VARCHAR(255),
        display_name VARCHAR(255),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS starter.histories (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id VARCHAR(128) NOT NULL REFERENCES starter.users(firebase_uid) ON DELETE CASCADE,
        datetime TIMESTAMPTZ NOT NULL,
        value NUMERIC NOT NULL CHECK (value > 0 AND value <= 1000000000000000),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS starter_histories_user_idx ON starter.histories(user_id)",
];

/// Create the `starter` schema and its tables if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database tables initialized");
    Ok(())
}
