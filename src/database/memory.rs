use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{History, User};
use super::repository::{HealthCheck, HistoryStore, UserStore};
use crate::validation::{HistoryChanges, NewHistory};

/// In-process stores with the same semantics as the Postgres ones, including
/// the owner foreign key and cascade on user removal.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    histories: Arc<RwLock<Vec<History>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user together with every history they own.
    pub async fn remove_user(&self, id: &str) -> bool {
        let removed = self.users.write().await.remove(id).is_some();
        if removed {
            self.histories.write().await.retain(|h| h.user_id != id);
        }
        removed
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn history_count(&self) -> usize {
        self.histories.read().await.len()
    }

    pub async fn find_history(&self, id: Uuid) -> Option<History> {
        self.histories.read().await.iter().find(|h| h.id == id).cloned()
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<History>, DatabaseError> {
        let histories = self.histories.read().await;
        Ok(histories.iter().filter(|h| h.user_id == user_id).cloned().collect())
    }

    async fn insert(&self, user_id: &str, entry: &NewHistory) -> Result<History, DatabaseError> {
        if !self.users.read().await.contains_key(user_id) {
            return Err(DatabaseError::UnknownOwner(user_id.to_string()));
        }

        let now = Utc::now();
        let history = History {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            datetime: entry.datetime,
            value: entry.value,
            created_at: now,
            updated_at: now,
        };
        self.histories.write().await.push(history.clone());
        Ok(history)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        user_id: &str,
        changes: &HistoryChanges,
    ) -> Result<Option<History>, DatabaseError> {
        let mut histories = self.histories.write().await;
        let Some(history) = histories
            .iter_mut()
            .find(|h| h.id == id && h.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(datetime) = changes.datetime {
            history.datetime = datetime;
        }
        if let Some(value) = changes.value {
            history.value = value;
        }
        history.updated_at = changes.updated_at;
        Ok(Some(history.clone()))
    }

    async fn delete_owned(&self, id: Uuid, user_id: &str) -> Result<bool, DatabaseError> {
        let mut histories = self.histories.write().await;
        let before = histories.len();
        histories.retain(|h| !(h.id == id && h.user_id == user_id));
        Ok(histories.len() < before)
    }

    async fn total(&self) -> Result<f64, DatabaseError> {
        let histories = self.histories.read().await;
        Ok(histories.iter().filter_map(|h| h.value.to_f64()).sum())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn ensure_exists(&self, id: &str, email: Option<&str>) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        users.entry(id.to_string()).or_insert_with(|| {
            let now = Utc::now();
            User {
                id: id.to_string(),
                email: email.map(str::to_string),
                display_name: None,
                created_at: now,
                updated_at: now,
            }
        });
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn entry(value: i64) -> NewHistory {
        NewHistory {
            datetime: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            value: Decimal::from(value),
        }
    }

    #[tokio::test]
    async fn ensure_exists_is_idempotent_and_preserves_fields() {
        let store = MemoryStore::new();
        store.ensure_exists("u1", Some("first@example.com")).await.unwrap();
        store.users.write().await.get_mut("u1").unwrap().display_name = Some("Ada".to_string());

        store.ensure_exists("u1", Some("second@example.com")).await.unwrap();

        assert_eq!(store.user_count().await, 1);
        let user = store.get("u1").await.unwrap().unwrap();
        assert_eq!(user.email.as_deref(), Some("first@example.com"));
        assert_eq!(user.display_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn insert_requires_existing_owner() {
        let store = MemoryStore::new();
        let err = store.insert("ghost", &entry(1)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownOwner(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn mutations_are_scoped_to_owner() {
        let store = MemoryStore::new();
        store.ensure_exists("a", None).await.unwrap();
        store.ensure_exists("b", None).await.unwrap();
        let h = store.insert("a", &entry(5)).await.unwrap();

        let changes = HistoryChanges {
            datetime: None,
            value: Some(Decimal::from(9)),
            updated_at: Utc::now(),
        };
        assert!(store.update_owned(h.id, "b", &changes).await.unwrap().is_none());
        assert!(!store.delete_owned(h.id, "b").await.unwrap());
        assert_eq!(store.find_history(h.id).await.unwrap().value, Decimal::from(5));

        assert!(store.delete_owned(h.id, "a").await.unwrap());
        assert_eq!(store.history_count().await, 0);
    }

    #[tokio::test]
    async fn total_sums_across_users_and_defaults_to_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.total().await.unwrap(), 0.0);

        store.ensure_exists("a", None).await.unwrap();
        store.ensure_exists("b", None).await.unwrap();
        store.insert("a", &entry(2)).await.unwrap();
        store.insert("b", &entry(3)).await.unwrap();
        assert_eq!(store.total().await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn total_does_not_overflow_on_extreme_rows() {
        let store = MemoryStore::new();
        store.ensure_exists("a", None).await.unwrap();
        for _ in 0..2 {
            let huge = NewHistory {
                value: Decimal::MAX,
                ..entry(1)
            };
            store.insert("a", &huge).await.unwrap();
        }

        let total = store.total().await.unwrap();
        assert!(total.is_finite());
        assert!(total > 1.5e29);
    }

    #[tokio::test]
    async fn removing_user_cascades_to_histories() {
        let store = MemoryStore::new();
        store.ensure_exists("a", None).await.unwrap();
        store.insert("a", &entry(2)).await.unwrap();

        assert!(store.remove_user("a").await);
        assert_eq!(store.history_count().await, 0);
    }
}
