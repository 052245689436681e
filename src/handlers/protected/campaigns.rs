use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, Deleted, Paginated};
use crate::models::{Campaign, CampaignChanges, CampaignDraft, Id, Member, Page};

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct InviteCode {
    pub invite_code: String,
}

/// POST /api/campaigns
pub async fn campaign_create(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(draft): ApiJson<CampaignDraft>,
) -> ApiResult<Campaign> {
    let campaign = state.campaigns.create(&principal, draft).await?;
    Ok(ApiResponse::created("campaign created", campaign))
}

/// GET /api/campaigns - campaigns the caller runs or plays in
pub async fn campaign_list(
    State(state): State<AppState>,
    principal: Principal,
    page: Page,
) -> Result<Paginated<Campaign>, ApiError> {
    let listing = state.campaigns.list(&principal, page).await?;
    Ok(Paginated::new(listing, page))
}

/// GET /api/campaigns/:id
pub async fn campaign_get(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Campaign>, ApiError> {
    Ok(Json(state.campaigns.get(&principal, id).await?))
}

/// PUT /api/campaigns/:id
pub async fn campaign_update(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
    ApiJson(changes): ApiJson<CampaignChanges>,
) -> ApiResult<Campaign> {
    let campaign = state.campaigns.update(&principal, id, changes).await?;
    Ok(ApiResponse::ok("campaign updated", campaign))
}

/// DELETE /api/campaigns/:id
pub async fn campaign_delete(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Deleted> {
    state.campaigns.delete(&principal, id).await?;
    Ok(ApiResponse::deleted("campaign deleted", id))
}

/// GET /api/campaigns/:id/invite-code
pub async fn invite_code_get(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<InviteCode>, ApiError> {
    let invite_code = state.campaigns.invite_code(&principal, id).await?;
    Ok(Json(InviteCode { invite_code }))
}

/// POST /api/campaigns/:id/regenerate-code
pub async fn invite_code_rotate(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<InviteCode> {
    let invite_code = state.campaigns.rotate_invite_code(&principal, id).await?;
    Ok(ApiResponse::ok("invite code regenerated", InviteCode { invite_code }))
}

/// POST /api/campaigns/join
pub async fn campaign_join(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(request): ApiJson<JoinRequest>,
) -> ApiResult<Campaign> {
    let campaign = state.campaigns.join(&principal, &request.invite_code).await?;
    Ok(ApiResponse::ok("joined campaign", campaign))
}

/// DELETE /api/campaigns/:id/leave
pub async fn campaign_leave(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<()> {
    state.campaigns.leave(&principal, id).await?;
    Ok(ApiResponse::message("left campaign"))
}

/// GET /api/campaigns/:id/players
pub async fn campaign_members(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Vec<Member>>, ApiError> {
    Ok(Json(state.campaigns.members(&principal, id).await?))
}
