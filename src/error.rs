// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

use crate::database::DatabaseError;
use crate::validation::ValidationError;

/// Every failure a request can end in. Converted to the error envelope at the
/// boundary; no lower-level error text reaches the client.
#[derive(Debug, Error)]
pub enum ApiError {
    // 401 Unauthorized
    #[error("{0}")]
    MissingAuth(&'static str),
    #[error("Invalid or expired token")]
    InvalidToken,

    // 403 Forbidden
    #[error("Anonymous users cannot access this resource")]
    AnonymousDenied,
    #[error("{0}")]
    NotAuthorized(&'static str),

    // 400 Bad Request
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // 404 Not Found
    #[error("{0}")]
    NotFound(&'static str),

    // 500 Internal Server Error
    #[error("An error occurred while processing your request")]
    Internal,

    // 503 Service Unavailable
    #[error("Database temporarily unavailable")]
    ServiceUnavailable,
}

pub const AUTH_HEADER_REQUIRED: &str = "Authorization header required";
pub const AUTH_HEADER_FORMAT: &str = "Invalid authorization format. Use: Bearer <token>";

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingAuth(_) | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::AnonymousDenied | ApiError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Error envelope: `{ "success": false, "error": <message> }`
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.to_string(),
        })
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UnknownOwner(_) => ApiError::NotFound("User not found"),
            DatabaseError::NotInitialized => {
                tracing::error!("Database used before initialization");
                ApiError::ServiceUnavailable
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
                tracing::error!("Database pool unavailable");
                ApiError::ServiceUnavailable
            }
            other => {
                // Log the real error but return generic message
                tracing::error!("Database error: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
