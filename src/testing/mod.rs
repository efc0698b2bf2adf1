//! Helpers for integration tests, behind the `test-support` feature.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::app::{self, AppState};
use crate::auth::{Identity, IdentityVerifier, SiteAdmins, VerifyError};
use crate::config::SecurityConfig;
use crate::database::MemoryStore;

/// Verifier backed by a fixed token → identity table.
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, subject_id: &str, email: Option<&str>) -> Self {
        self.tokens.insert(
            token.to_string(),
            Identity {
                subject_id: subject_id.to_string(),
                email: email.map(str::to_string),
                anonymous: false,
            },
        );
        self
    }

    pub fn with_anonymous(mut self, token: &str, subject_id: &str) -> Self {
        self.tokens.insert(
            token.to_string(),
            Identity {
                subject_id: subject_id.to_string(),
                email: None,
                anonymous: true,
            },
        );
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| VerifyError::Rejected("unknown token".to_string()))
    }
}

/// Router over an in-memory store, with permissive CORS.
pub fn memory_app(
    store: MemoryStore,
    verifier: StaticVerifier,
    site_admins: SiteAdmins,
) -> axum::Router {
    let state = AppState::new(Arc::new(store), Arc::new(verifier), site_admins);
    let security = SecurityConfig {
        enable_cors: true,
        cors_origins: Vec::new(),
    };
    app::router(state, &security)
}
