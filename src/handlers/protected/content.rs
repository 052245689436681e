// handlers/protected/content.rs - /api/encounters and /api/treasures

use axum::{extract::State, Json};

use super::generated;
use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::generation::{EncounterRequest, LootRequest};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, Deleted, Paginated};
use crate::models::{Encounter, EncounterDraft, Id, Page, Treasure, TreasureDraft};

/// GET /api/encounters
pub async fn encounter_list(
    State(state): State<AppState>,
    principal: Principal,
    page: Page,
) -> Result<Paginated<Encounter>, ApiError> {
    let listing = state.encounters.list(&principal, page).await?;
    Ok(Paginated::new(listing, page))
}

/// POST /api/encounters
pub async fn encounter_create(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(draft): ApiJson<EncounterDraft>,
) -> ApiResult<Encounter> {
    let encounter = state.encounters.create(&principal, draft).await?;
    Ok(ApiResponse::created("encounter created", encounter))
}

/// GET /api/encounters/:id
pub async fn encounter_get(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Encounter>, ApiError> {
    Ok(Json(state.encounters.get(&principal, id).await?))
}

/// DELETE /api/encounters/:id
pub async fn encounter_delete(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Deleted> {
    state.encounters.delete(&principal, id).await?;
    Ok(ApiResponse::deleted("encounter deleted", id))
}

/// POST /api/encounters/generate
pub async fn encounter_generate(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(request): ApiJson<EncounterRequest>,
) -> ApiResult<Encounter> {
    let encounter = state.encounters.generate(&principal, request).await?;
    Ok(generated("encounter", encounter))
}

/// GET /api/treasures
pub async fn treasure_list(
    State(state): State<AppState>,
    principal: Principal,
    page: Page,
) -> Result<Paginated<Treasure>, ApiError> {
    let listing = state.treasures.list(&principal, page).await?;
    Ok(Paginated::new(listing, page))
}

/// POST /api/treasures
pub async fn treasure_create(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(draft): ApiJson<TreasureDraft>,
) -> ApiResult<Treasure> {
    let treasure = state.treasures.create(&principal, draft).await?;
    Ok(ApiResponse::created("treasure created", treasure))
}

/// GET /api/treasures/:id
pub async fn treasure_get(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Treasure>, ApiError> {
    Ok(Json(state.treasures.get(&principal, id).await?))
}

/// DELETE /api/treasures/:id
pub async fn treasure_delete(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Deleted> {
    state.treasures.delete(&principal, id).await?;
    Ok(ApiResponse::deleted("treasure deleted", id))
}

/// POST /api/treasures/generate
pub async fn treasure_generate(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(request): ApiJson<LootRequest>,
) -> ApiResult<Treasure> {
    let treasure = state.treasures.generate(&principal, request).await?;
    Ok(generated("treasure", treasure))
}
