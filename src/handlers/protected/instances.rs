// handlers/protected/instances.rs - /api/campaigns/:id/characters[/:instance_id]

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, Deleted};
use crate::models::{AvailableCharacter, CampaignCharacter, FullChanges, Id, StateChanges};
use crate::services::AttachRequest;

/// GET /api/campaigns/:id/available-characters
pub async fn available(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(campaign_id): ApiPath<Id>,
) -> Result<Json<Vec<AvailableCharacter>>, ApiError> {
    Ok(Json(state.instances.available(&principal, campaign_id).await?))
}

/// GET /api/campaigns/:id/characters
pub async fn instance_list(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(campaign_id): ApiPath<Id>,
) -> Result<Json<Vec<CampaignCharacter>>, ApiError> {
    Ok(Json(state.instances.list(&principal, campaign_id).await?))
}

/// POST /api/campaigns/:id/characters
pub async fn instance_attach(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(campaign_id): ApiPath<Id>,
    ApiJson(request): ApiJson<AttachRequest>,
) -> ApiResult<CampaignCharacter> {
    let instance = state.instances.attach(&principal, campaign_id, request).await?;
    Ok(ApiResponse::created("character added to campaign", instance))
}

/// GET /api/campaigns/:id/characters/:instance_id
pub async fn instance_get(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((campaign_id, id)): ApiPath<(Id, Id)>,
) -> Result<Json<CampaignCharacter>, ApiError> {
    Ok(Json(state.instances.get(&principal, campaign_id, id).await?))
}

/// PUT /api/campaigns/:id/characters/:instance_id - campaign layer only
pub async fn instance_update(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((campaign_id, id)): ApiPath<(Id, Id)>,
    ApiJson(changes): ApiJson<StateChanges>,
) -> ApiResult<CampaignCharacter> {
    let instance = state.instances.update_state(&principal, campaign_id, id, changes).await?;
    Ok(ApiResponse::ok("campaign character updated", instance))
}

/// PUT /api/campaigns/:id/characters/:instance_id/full - DM override
pub async fn instance_update_full(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((campaign_id, id)): ApiPath<(Id, Id)>,
    ApiJson(changes): ApiJson<FullChanges>,
) -> ApiResult<CampaignCharacter> {
    let instance = state.instances.update_full(&principal, campaign_id, id, changes).await?;
    Ok(ApiResponse::ok("campaign character updated", instance))
}

/// POST /api/campaigns/:id/characters/:instance_id/sync
pub async fn instance_sync(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((campaign_id, id)): ApiPath<(Id, Id)>,
) -> ApiResult<CampaignCharacter> {
    let instance = state.instances.sync(&principal, campaign_id, id).await?;
    Ok(ApiResponse::ok("campaign character synced", instance))
}

/// DELETE /api/campaigns/:id/characters/:instance_id
pub async fn instance_delete(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((campaign_id, id)): ApiPath<(Id, Id)>,
) -> ApiResult<Deleted> {
    state.instances.delete(&principal, campaign_id, id).await?;
    Ok(ApiResponse::deleted("campaign character removed", id))
}
