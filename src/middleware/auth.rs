use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::RequestContext;
use crate::error::{ApiError, AUTH_HEADER_FORMAT, AUTH_HEADER_REQUIRED};

/// Bearer-token authentication for every owner-scoped route.
///
/// Verifies the token, rejects anonymous identities, resolves the site-admin
/// flag, kicks off the background user upsert and injects a [`RequestContext`].
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())?;

    let identity = state.verifier.verify(token).await.map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        ApiError::InvalidToken
    })?;

    if identity.is_anonymous_user() {
        return Err(ApiError::AnonymousDenied);
    }

    let site_admin = state.site_admins.is_site_admin(identity.email.as_deref());

    // Fire and forget
    state.users.ensure_exists_in_background(&identity);

    request
        .extensions_mut()
        .insert(RequestContext::new(identity, site_admin));

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::MissingAuth(AUTH_HEADER_REQUIRED))?;

    let value = raw
        .to_str()
        .map_err(|_| ApiError::MissingAuth(AUTH_HEADER_FORMAT))?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next()) {
        (Some("Bearer"), Some(token)) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::MissingAuth(AUTH_HEADER_FORMAT)),
    }
}
