use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::UserView;
use crate::auth::{Identity, RequestContext};
use crate::database::UserStore;
use crate::error::ApiError;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, ctx: &RequestContext, target_id: &str) -> Result<UserView, ApiError> {
        if !ctx.may_act_for(target_id) {
            tracing::warn!(
                "Denied user read: identity '{}' requested '{}'",
                ctx.user_id(),
                target_id
            );
            return Err(ApiError::NotAuthorized("Not authorized to view this user"));
        }

        self.store
            .get(target_id)
            .await?
            .map(UserView::from)
            .ok_or(ApiError::NotFound("User not found"))
    }

    /// Record a first-seen identity without holding up the request that
    /// surfaced it. Failures are logged, never returned.
    pub fn ensure_exists_in_background(&self, identity: &Identity) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let id = identity.subject_id.clone();
        let email = identity.email.clone();

        tokio::spawn(async move {
            if let Err(e) = store.ensure_exists(&id, email.as_deref()).await {
                tracing::error!("Failed to ensure user '{}' exists: {}", id, e);
            }
        })
    }
}
