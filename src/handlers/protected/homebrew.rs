// handlers/protected/homebrew.rs - /api/homebrew/{races,classes,backgrounds}
//
// The kind comes from the first path segment; an unknown one is a 400 from
// the path extractor.

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, Deleted, Paginated};
use crate::models::{Homebrew, HomebrewChanges, HomebrewDraft, HomebrewKind, Id, Page, RatingRequest};

/// GET /api/homebrew/:kind
pub async fn homebrew_list(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(kind): ApiPath<HomebrewKind>,
    page: Page,
) -> Result<Paginated<Homebrew>, ApiError> {
    let listing = state.homebrew.list(kind, &principal, page).await?;
    Ok(Paginated::new(listing, page))
}

/// POST /api/homebrew/:kind
pub async fn homebrew_create(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(kind): ApiPath<HomebrewKind>,
    ApiJson(draft): ApiJson<HomebrewDraft>,
) -> ApiResult<Homebrew> {
    let homebrew = state.homebrew.create(kind, &principal, draft).await?;
    Ok(ApiResponse::created(format!("homebrew {} created", kind), homebrew))
}

/// GET /api/homebrew/:kind/favorites
pub async fn favorite_list(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(kind): ApiPath<HomebrewKind>,
    page: Page,
) -> Result<Paginated<Homebrew>, ApiError> {
    let listing = state.homebrew.favorites(kind, &principal, page).await?;
    Ok(Paginated::new(listing, page))
}

/// GET /api/homebrew/:kind/:id
pub async fn homebrew_get(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((kind, id)): ApiPath<(HomebrewKind, Id)>,
) -> Result<Json<Homebrew>, ApiError> {
    Ok(Json(state.homebrew.get(kind, &principal, id).await?))
}

/// PUT /api/homebrew/:kind/:id
pub async fn homebrew_update(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((kind, id)): ApiPath<(HomebrewKind, Id)>,
    ApiJson(changes): ApiJson<HomebrewChanges>,
) -> ApiResult<Homebrew> {
    let homebrew = state.homebrew.update(kind, &principal, id, changes).await?;
    Ok(ApiResponse::ok(format!("homebrew {} updated", kind), homebrew))
}

/// DELETE /api/homebrew/:kind/:id
pub async fn homebrew_delete(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((kind, id)): ApiPath<(HomebrewKind, Id)>,
) -> ApiResult<Deleted> {
    state.homebrew.delete(kind, &principal, id).await?;
    Ok(ApiResponse::deleted(format!("homebrew {} deleted", kind), id))
}

/// POST /api/homebrew/:kind/:id/favorite
pub async fn favorite_add(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((kind, id)): ApiPath<(HomebrewKind, Id)>,
) -> ApiResult<Homebrew> {
    let homebrew = state.homebrew.set_favorite(kind, &principal, id, true).await?;
    Ok(ApiResponse::ok("added to favorites", homebrew))
}

/// DELETE /api/homebrew/:kind/:id/favorite
pub async fn favorite_remove(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((kind, id)): ApiPath<(HomebrewKind, Id)>,
) -> ApiResult<Homebrew> {
    let homebrew = state.homebrew.set_favorite(kind, &principal, id, false).await?;
    Ok(ApiResponse::ok("removed from favorites", homebrew))
}

/// PUT /api/homebrew/:kind/:id/rating
pub async fn rating_put(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((kind, id)): ApiPath<(HomebrewKind, Id)>,
    ApiJson(request): ApiJson<RatingRequest>,
) -> ApiResult<Homebrew> {
    let homebrew = state.homebrew.rate(kind, &principal, id, Some(request)).await?;
    Ok(ApiResponse::ok("rating saved", homebrew))
}

/// DELETE /api/homebrew/:kind/:id/rating
pub async fn rating_delete(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((kind, id)): ApiPath<(HomebrewKind, Id)>,
) -> ApiResult<Homebrew> {
    let homebrew = state.homebrew.rate(kind, &principal, id, None).await?;
    Ok(ApiResponse::ok("rating removed", homebrew))
}
