use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::models::user::{LoginRequest, RegisterRequest};
use crate::services::Session;

/// POST /api/users/register - create an account and receive a token
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<Session> {
    let session = state.users.register(request).await?;
    Ok(ApiResponse::created("user registered", session))
}

/// POST /api/users/login - exchange email and password for a token
pub async fn login(State(state): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> ApiResult<Session> {
    let session = state.users.login(request).await?;
    Ok(ApiResponse::ok("login successful", session))
}
