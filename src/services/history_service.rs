use std::sync::Arc;

use uuid::Uuid;

use crate::api::{HistoryTotal, HistoryView};
use crate::auth::RequestContext;
use crate::database::{HistoryStore, UserStore};
use crate::error::ApiError;
use crate::validation::{parse_body, validate_create, validate_update};

const NOT_AUTHORIZED: &str = "Not authorized";
const HISTORY_NOT_FOUND: &str = "History not found";

/// List, create, update and delete for one owner's histories, plus the public total.
///
/// Each owner-scoped operation runs the ownership guard first, then payload
/// validation, then a single storage statement.
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn HistoryStore>,
    users: Arc<dyn UserStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn HistoryStore>, users: Arc<dyn UserStore>) -> Self {
        Self { store, users }
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
    ) -> Result<Vec<HistoryView>, ApiError> {
        require_owner(ctx, owner_id)?;

        let rows = self.store.list_for_user(owner_id).await?;
        Ok(rows.into_iter().map(HistoryView::from).collect())
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
        body: &[u8],
    ) -> Result<HistoryView, ApiError> {
        require_owner(ctx, owner_id)?;

        let entry = validate_create(&parse_body(body)?)?;

        // The auth layer's background upsert may not have landed yet
        if owner_id == ctx.user_id() {
            self.users
                .ensure_exists(owner_id, ctx.identity.email.as_deref())
                .await?;
        }

        let created = self.store.insert(owner_id, &entry).await?;

        tracing::debug!("Created history {} for {}", created.id, owner_id);
        Ok(created.into())
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
        history_id: &str,
        body: &[u8],
    ) -> Result<HistoryView, ApiError> {
        require_owner(ctx, owner_id)?;

        let changes = validate_update(&parse_body(body)?)?;
        let id = parse_history_id(history_id)?;

        self.store
            .update_owned(id, owner_id, &changes)
            .await?
            .map(HistoryView::from)
            .ok_or(ApiError::NotFound(HISTORY_NOT_FOUND))
    }

    pub async fn delete(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
        history_id: &str,
    ) -> Result<(), ApiError> {
        require_owner(ctx, owner_id)?;

        let id = parse_history_id(history_id)?;
        if !self.store.delete_owned(id, owner_id).await? {
            return Err(ApiError::NotFound(HISTORY_NOT_FOUND));
        }

        tracing::debug!("Deleted history {} for {}", id, owner_id);
        Ok(())
    }

    /// Sum of every user's values. Public and cross-user: no identity and no
    /// ownership check.
    pub async fn total(&self) -> Result<HistoryTotal, ApiError> {
        let total = self.store.total().await?;
        Ok(HistoryTotal { total })
    }
}

fn require_owner(ctx: &RequestContext, owner_id: &str) -> Result<(), ApiError> {
    if ctx.may_act_for(owner_id) {
        return Ok(());
    }
    tracing::warn!(
        "Denied history access: identity '{}' is not owner '{}'",
        ctx.user_id(),
        owner_id
    );
    Err(ApiError::NotAuthorized(NOT_AUTHORIZED))
}

/// Ids that cannot exist read the same as ids owned by someone else.
fn parse_history_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(HISTORY_NOT_FOUND))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::database::{MemoryStore, UserStore};
    use crate::validation::ValidationError;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn ctx(id: &str, admin: bool) -> RequestContext {
        RequestContext::new(
            Identity {
                subject_id: id.to_string(),
                email: None,
                anonymous: false,
            },
            admin,
        )
    }

    async fn service() -> (HistoryService, MemoryStore) {
        let store = MemoryStore::new();
        store.ensure_exists("u1", None).await.unwrap();
        store.ensure_exists("u2", None).await.unwrap();
        let shared = Arc::new(store.clone());
        (HistoryService::new(shared.clone(), shared), store)
    }

    const BODY: &[u8] = br#"{"datetime":"2024-01-01T00:00:00Z","value":42.5}"#;

    #[tokio::test]
    async fn owner_can_create_and_list() {
        let (svc, _) = service().await;
        let created = svc.create(&ctx("u1", false), "u1", BODY).await.unwrap();
        assert_eq!(created.value, Decimal::from_str("42.5").unwrap());
        assert_eq!(created.user_id, "u1");

        let listed = svc.list(&ctx("u1", false), "u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn other_identity_is_rejected_before_validation() {
        let (svc, store) = service().await;
        let err = svc.create(&ctx("u2", false), "u1", b"not json").await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthorized(_)));
        assert_eq!(store.history_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_storage() {
        let (svc, store) = service().await;
        let err = svc
            .create(&ctx("u1", false), "u1", br#"{"datetime":"2024-01-01","value":0}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::InvalidValue(_))));
        assert_eq!(store.history_count().await, 0);
    }

    #[tokio::test]
    async fn update_and_delete_are_owner_scoped() {
        let (svc, store) = service().await;
        let created = svc.create(&ctx("u1", false), "u1", BODY).await.unwrap();
        let id = created.id.to_string();

        let err = svc
            .update(&ctx("u2", false), "u1", &id, br#"{"value":1}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotAuthorized(_)));

        // Path owner u2 is the caller, but the row belongs to u1
        let err = svc
            .update(&ctx("u2", false), "u2", &id, br#"{"value":1}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err = svc.delete(&ctx("u2", false), "u2", &id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let unchanged = store.find_history(created.id).await.unwrap();
        assert_eq!(unchanged.value, Decimal::from_str("42.5").unwrap());
    }

    #[tokio::test]
    async fn admin_may_act_for_any_owner() {
        let (svc, _) = service().await;
        let admin = ctx("root", true);
        let created = svc.create(&admin, "u1", BODY).await.unwrap();
        let id = created.id.to_string();

        let updated = svc.update(&admin, "u1", &id, br#"{"value":7}"#).await.unwrap();
        assert_eq!(updated.value, Decimal::from(7));
        assert_eq!(svc.list(&admin, "u1").await.unwrap().len(), 1);

        svc.delete(&admin, "u1", &id).await.unwrap();
        assert!(svc.list(&admin, "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_history_id_is_not_found() {
        let (svc, _) = service().await;
        let err = svc.delete(&ctx("u1", false), "u1", "nonexistent-id").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("History not found")));
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let (svc, _) = service().await;
        let created = svc.create(&ctx("u1", false), "u1", BODY).await.unwrap();
        let updated = svc
            .update(
                &ctx("u1", false),
                "u1",
                &created.id.to_string(),
                br#"{"datetime":"2024-06-01T00:00:00Z"}"#,
            )
            .await
            .unwrap();
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.value, created.value);
        assert_ne!(updated.datetime, created.datetime);
    }

    #[tokio::test]
    async fn total_needs_no_identity() {
        let (svc, _) = service().await;
        assert_eq!(svc.total().await.unwrap().total, 0.0);

        svc.create(&ctx("u1", false), "u1", BODY).await.unwrap();
        svc.create(&ctx("u2", false), "u2", BODY).await.unwrap();
        assert_eq!(svc.total().await.unwrap().total, 85.0);
    }

    #[tokio::test]
    async fn first_create_records_a_newcomer() {
        let (svc, store) = service().await;
        assert!(store.get("u3").await.unwrap().is_none());

        let created = svc.create(&ctx("u3", false), "u3", BODY).await.unwrap();
        assert_eq!(created.user_id, "u3");
        assert!(store.get("u3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn admin_create_for_unknown_owner_is_not_found() {
        let (svc, store) = service().await;
        let err = svc.create(&ctx("root", true), "ghost", BODY).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("User not found")));
        assert!(store.get("ghost").await.unwrap().is_none());
    }
}
