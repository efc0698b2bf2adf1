// handlers/public/health.rs - GET / and GET /health
use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::middleware::ApiResponse;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

/// GET / - service banner
pub async fn root() -> ApiResponse<ServiceInfo> {
    ApiResponse::success(ServiceInfo {
        name: "Starter API",
        version: env!("CARGO_PKG_VERSION"),
        status: "healthy",
    })
}

/// GET /health - liveness. The database probe is informational only.
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    let database = match state.health.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Health check database probe failed: {}", e);
            "unavailable"
        }
    };

    ApiResponse::success(HealthStatus {
        status: "healthy",
        database,
    })
}
