// handlers/protected/histories.rs - /api/v1/users/:user_id/histories[/:history_id]
//
// Bodies are taken as raw bytes; parsing happens inside the service, after
// the ownership check.
use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};

use crate::api::HistoryView;
use crate::app::AppState;
use crate::auth::RequestContext;
use crate::middleware::{ApiResponse, ApiResult};

/// GET - every history owned by `user_id`
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<HistoryView>> {
    let data = state.histories.list(&ctx, &user_id).await?;
    Ok(ApiResponse::success(data))
}

/// POST - `{ "datetime": <iso-8601>, "value": <number > 0> }`
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> ApiResult<HistoryView> {
    let data = state.histories.create(&ctx, &user_id, &body).await?;
    Ok(ApiResponse::created(data))
}

/// PUT - partial update of `datetime` and/or `value`
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((user_id, history_id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<HistoryView> {
    let data = state
        .histories
        .update(&ctx, &user_id, &history_id, &body)
        .await?;
    Ok(ApiResponse::success(data))
}

/// DELETE - responds with `data: null`
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((user_id, history_id)): Path<(String, String)>,
) -> ApiResult<()> {
    state.histories.delete(&ctx, &user_id, &history_id).await?;
    Ok(ApiResponse::success(()))
}
