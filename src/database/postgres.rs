use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{History, User};
use super::repository::{HealthCheck, HistoryStore, UserStore};
use crate::validation::{HistoryChanges, NewHistory};

const HISTORY_COLUMNS: &str = "id, user_id, datetime, value, created_at, updated_at";
const USER_COLUMNS: &str = "firebase_uid, email, display_name, created_at, updated_at";

/// Postgres-backed stores sharing the process-wide pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<History>, DatabaseError> {
        let sql = format!("SELECT {HISTORY_COLUMNS} FROM starter.histories WHERE user_id = $1");
        let rows = sqlx::query_as::<_, History>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, user_id: &str, entry: &NewHistory) -> Result<History, DatabaseError> {
        let sql = format!(
            "INSERT INTO starter.histories (user_id, datetime, value) VALUES ($1, $2, $3) RETURNING {HISTORY_COLUMNS}"
        );
        sqlx::query_as::<_, History>(&sql)
            .bind(user_id)
            .bind(entry.datetime)
            .bind(entry.value)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                let missing_owner = matches!(
                    &err,
                    sqlx::Error::Database(db) if db.is_foreign_key_violation()
                );
                if missing_owner {
                    DatabaseError::UnknownOwner(user_id.to_string())
                } else {
                    err.into()
                }
            })
    }

    async fn update_owned(
        &self,
        id: Uuid,
        user_id: &str,
        changes: &HistoryChanges,
    ) -> Result<Option<History>, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE starter.histories
            SET datetime = COALESCE($3, datetime),
                value = COALESCE($4, value),
                updated_at = $5
            WHERE id = $1 AND user_id = $2
            RETURNING {HISTORY_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, History>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(changes.datetime)
            .bind(changes.value)
            .bind(changes.updated_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_owned(&self, id: Uuid, user_id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM starter.histories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn total(&self) -> Result<f64, DatabaseError> {
        let total: f64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(value), 0)::float8 FROM starter.histories")
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM starter.users WHERE firebase_uid = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn ensure_exists(&self, id: &str, email: Option<&str>) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO starter.users (firebase_uid, email) VALUES ($1, $2) ON CONFLICT (firebase_uid) DO NOTHING",
        )
        .bind(id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
