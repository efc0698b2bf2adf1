use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{History, User};
use crate::validation::{HistoryChanges, NewHistory};

/// Row-level access to histories. Every mutation is a single statement
/// scoped by primary key and owner.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All and only the rows owned by `user_id`.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<History>, DatabaseError>;

    /// Fails with [`DatabaseError::UnknownOwner`] when no such user exists.
    async fn insert(&self, user_id: &str, entry: &NewHistory) -> Result<History, DatabaseError>;

    /// `None` when no row matches both `id` and `user_id`.
    async fn update_owned(
        &self,
        id: Uuid,
        user_id: &str,
        changes: &HistoryChanges,
    ) -> Result<Option<History>, DatabaseError>;

    /// `false` when no row matches both `id` and `user_id`.
    async fn delete_owned(&self, id: Uuid, user_id: &str) -> Result<bool, DatabaseError>;

    /// Sum of every value across all users as a plain float; zero when empty.
    async fn total(&self) -> Result<f64, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<User>, DatabaseError>;

    /// Insert-if-absent. Never fails for an existing id and never touches an
    /// existing row.
    async fn ensure_exists(&self, id: &str, email: Option<&str>) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
