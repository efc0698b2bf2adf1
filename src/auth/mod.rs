pub mod firebase;
pub mod guard;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

pub use firebase::FirebaseVerifier;
pub use guard::authorize;

/// The verified result of bearer-token verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub email: Option<String>,
    pub anonymous: bool,
}

impl Identity {
    pub fn is_anonymous_user(&self) -> bool {
        self.anonymous
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token rejected: {0}")]
    Rejected(String),
    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(String),
    #[error("verifier misconfigured: {0}")]
    Misconfigured(String),
}

/// Turns an opaque bearer token into a verified [`Identity`].
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}

/// Email allowlist of site admins. Matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct SiteAdmins {
    emails: HashSet<String>,
}

impl SiteAdmins {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    pub fn is_site_admin(&self, email: Option<&str>) -> bool {
        email
            .map(|e| self.emails.contains(&e.trim().to_lowercase()))
            .unwrap_or(false)
    }
}

/// Request-scoped state built by the authentication layer and handed to every
/// protected handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Identity,
    pub site_admin: bool,
}

impl RequestContext {
    pub fn new(identity: Identity, site_admin: bool) -> Self {
        Self { identity, site_admin }
    }

    pub fn user_id(&self) -> &str {
        &self.identity.subject_id
    }

    pub fn may_act_for(&self, owner_id: &str) -> bool {
        authorize(owner_id, self.user_id(), self.site_admin)
    }
}
