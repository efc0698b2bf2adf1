// handlers/public/histories_total.rs - GET /api/v1/histories/total
use axum::extract::State;

use crate::api::HistoryTotal;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// Unauthenticated sum of every history value across all users.
pub async fn histories_total(State(state): State<AppState>) -> ApiResult<HistoryTotal> {
    let total = state.histories.total().await?;
    Ok(ApiResponse::success(total))
}
