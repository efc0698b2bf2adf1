use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use super::{Identity, IdentityVerifier, VerifyError};
use crate::config::AuthConfig;

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const JWKS_TIMEOUT: Duration = Duration::from_secs(10);

/// Claims carried by a Firebase ID token that this service reads.
#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    firebase: Option<FirebaseInfo>,
}

#[derive(Debug, Deserialize)]
struct FirebaseInfo {
    #[serde(default)]
    sign_in_provider: Option<String>,
}

/// Verifies Firebase ID tokens against Google's published signing keys.
///
/// Successful verifications are remembered for `token_cache_ttl`, never past
/// the token's own expiry. Cache keys are SHA-256 digests of the raw token.
pub struct FirebaseVerifier {
    project_id: String,
    issuer: String,
    jwks_url: String,
    jwks_refresh: Duration,
    token_cache_ttl: Duration,
    http: reqwest::Client,
    jwks: RwLock<JwksCache>,
    verified: RwLock<HashMap<String, CachedIdentity>>,
}

#[derive(Debug, Default)]
struct JwksCache {
    jwks: Option<JwkSet>,
    fetched_at: Option<Instant>,
}

#[derive(Debug, Clone)]
struct CachedIdentity {
    identity: Identity,
    expires_at: Instant,
}

impl FirebaseVerifier {
    pub fn new(
        project_id: impl Into<String>,
        jwks_url: impl Into<String>,
        token_cache_ttl: Duration,
        jwks_refresh: Duration,
    ) -> Result<Self, VerifyError> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(VerifyError::Misconfigured(
                "firebase project id must be non-empty".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(JWKS_TIMEOUT)
            .build()
            .map_err(|e| VerifyError::Misconfigured(format!("http client: {}", e)))?;

        Ok(Self {
            issuer: format!("{}{}", ISSUER_PREFIX, project_id),
            project_id,
            jwks_url: jwks_url.into(),
            jwks_refresh,
            token_cache_ttl,
            http,
            jwks: RwLock::new(JwksCache::default()),
            verified: RwLock::new(HashMap::new()),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, VerifyError> {
        let project_id = config.firebase_project_id.as_deref().ok_or_else(|| {
            VerifyError::Misconfigured("FIREBASE_PROJECT_ID is not set".to_string())
        })?;

        Self::new(
            project_id,
            config.jwks_url.clone(),
            Duration::from_secs(config.token_cache_ttl_secs),
            Duration::from_secs(config.jwks_refresh_secs),
        )
    }

    async fn cached(&self, key: &str) -> Option<Identity> {
        let verified = self.verified.read().await;
        verified
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.identity.clone())
    }

    async fn remember(&self, key: String, identity: &Identity, token_exp: i64) {
        let remaining = token_exp - Utc::now().timestamp();
        if remaining <= 0 || self.token_cache_ttl.is_zero() {
            return;
        }

        let now = Instant::now();
        let ttl = self.token_cache_ttl.min(Duration::from_secs(remaining as u64));

        let mut verified = self.verified.write().await;
        verified.retain(|_, entry| entry.expires_at > now);
        verified.insert(
            key,
            CachedIdentity {
                identity: identity.clone(),
                expires_at: now + ttl,
            },
        );
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        {
            let cache = self.jwks.read().await;
            if let Some(key) = cache.key_for_kid(kid)? {
                return Ok(key);
            }
        }

        let mut cache = self.jwks.write().await;
        let refresh_needed = cache
            .fetched_at
            .map(|t| t.elapsed() > self.jwks_refresh)
            .unwrap_or(true);
        if refresh_needed {
            cache.refresh(&self.http, &self.jwks_url).await?;
        }

        cache
            .key_for_kid(kid)?
            .ok_or_else(|| VerifyError::Rejected("token kid not found in JWKS".to_string()))
    }

    async fn verify_uncached(&self, token: &str) -> Result<(Identity, i64), VerifyError> {
        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::Rejected(
                "unsupported token alg (expected RS256)".to_string(),
            ));
        }

        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Malformed("token header missing kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<FirebaseClaims>(token, &decoding_key, &validation)
            .map_err(|e| VerifyError::Rejected(e.to_string()))?
            .claims;

        if claims.sub.trim().is_empty() {
            return Err(VerifyError::Rejected("token subject is empty".to_string()));
        }

        let anonymous = claims
            .firebase
            .and_then(|f| f.sign_in_provider)
            .is_some_and(|provider| provider == "anonymous");

        let identity = Identity {
            subject_id: claims.sub,
            email: claims.email,
            anonymous,
        };

        Ok((identity, claims.exp))
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let key = cache_key(token);
        if let Some(identity) = self.cached(&key).await {
            return Ok(identity);
        }

        let (identity, exp) = self.verify_uncached(token).await?;
        self.remember(key, &identity, exp).await;
        Ok(identity)
    }
}

impl JwksCache {
    fn key_for_kid(&self, kid: &str) -> Result<Option<DecodingKey>, VerifyError> {
        let Some(jwk) = self.jwks.as_ref().and_then(|set| set.find(kid)) else {
            return Ok(None);
        };
        DecodingKey::from_jwk(jwk)
            .map(Some)
            .map_err(|e| VerifyError::KeysUnavailable(format!("unusable JWK: {}", e)))
    }

    async fn refresh(&mut self, http: &reqwest::Client, url: &str) -> Result<(), VerifyError> {
        let jwks = http
            .get(url)
            .send()
            .await
            .map_err(|e| VerifyError::KeysUnavailable(format!("fetch failed: {}", e)))?
            .error_for_status()
            .map_err(|e| VerifyError::KeysUnavailable(format!("bad status: {}", e)))?
            .json::<JwkSet>()
            .await
            .map_err(|e| VerifyError::KeysUnavailable(format!("invalid JWKS: {}", e)))?;

        tracing::info!("Refreshed identity provider signing keys ({} keys)", jwks.keys.len());
        self.jwks = Some(jwks);
        self.fetched_at = Some(Instant::now());
        Ok(())
    }
}

fn cache_key(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
