use axum::extract::State;

use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::{ApiPath, ApiResponse, ApiResult, Deleted, Paginated};
use crate::models::{Id, Page, User};

/// GET /api/users
pub async fn user_list(
    State(state): State<AppState>,
    principal: Principal,
    page: Page,
) -> Result<Paginated<User>, ApiError> {
    let listing = state.users.list(&principal, page).await?;
    Ok(Paginated::new(listing, page))
}

/// GET /api/users/:id
pub async fn user_get(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> Result<axum::Json<User>, ApiError> {
    Ok(axum::Json(state.users.get(&principal, id).await?))
}

/// DELETE /api/users/:id
pub async fn user_delete(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Deleted> {
    state.users.remove(&principal, id).await?;
    Ok(ApiResponse::deleted("user deleted", id))
}
