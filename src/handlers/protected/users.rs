// handlers/protected/users.rs - GET /api/v1/users/:user_id
use axum::{
    extract::{Path, State},
    Extension,
};

use crate::api::UserView;
use crate::app::AppState;
use crate::auth::RequestContext;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
) -> ApiResult<UserView> {
    let data = state.users.get(&ctx, &user_id).await?;
    Ok(ApiResponse::success(data))
}
