use axum::{extract::State, Json};

use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Deleted};
use crate::models::user::UpdateUserRequest;
use crate::models::User;

/// GET /api/users/me
pub async fn me_get(State(state): State<AppState>, principal: Principal) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.me(&principal).await?))
}

/// PUT /api/users/me - partial: username, email, password
pub async fn me_put(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> ApiResult<User> {
    let user = state.users.update_me(&principal, request).await?;
    Ok(ApiResponse::ok("user updated", user))
}

/// DELETE /api/users/me - removes the account and everything it owns
pub async fn me_delete(State(state): State<AppState>, principal: Principal) -> ApiResult<Deleted> {
    state.users.delete_me(&principal).await?;
    Ok(ApiResponse::deleted("user deleted", principal.user_id))
}
