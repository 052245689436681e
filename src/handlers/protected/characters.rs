// handlers/protected/characters.rs - /api/pcs and /api/npcs
//
// Both tables share one shape, so each route is a thin wrapper that fixes
// the kind and delegates to the shared implementation below.

use axum::{extract::State, Json};

use super::generated;
use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::generation::NpcRequest;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, Deleted, Paginated};
use crate::models::{Character, CharacterChanges, CharacterDraft, CharacterKind, Id, Page};

async fn list(
    kind: CharacterKind,
    state: AppState,
    principal: Principal,
    page: Page,
) -> Result<Paginated<Character>, ApiError> {
    let listing = state.characters.list(kind, &principal, page).await?;
    Ok(Paginated::new(listing, page))
}

async fn create(kind: CharacterKind, state: AppState, principal: Principal, draft: CharacterDraft) -> ApiResult<Character> {
    let character = state.characters.create(kind, &principal, draft).await?;
    Ok(ApiResponse::created(format!("{} created", kind.label()), character))
}

async fn get(kind: CharacterKind, state: AppState, principal: Principal, id: Id) -> Result<Json<Character>, ApiError> {
    Ok(Json(state.characters.get(kind, &principal, id).await?))
}

async fn update(
    kind: CharacterKind,
    state: AppState,
    principal: Principal,
    id: Id,
    changes: CharacterChanges,
) -> ApiResult<Character> {
    let character = state.characters.update(kind, &principal, id, changes).await?;
    Ok(ApiResponse::ok(format!("{} updated", kind.label()), character))
}

async fn delete(kind: CharacterKind, state: AppState, principal: Principal, id: Id) -> ApiResult<Deleted> {
    state.characters.delete(kind, &principal, id).await?;
    Ok(ApiResponse::deleted(format!("{} deleted", kind.label()), id))
}

/// GET /api/pcs
pub async fn pc_list(
    State(state): State<AppState>,
    principal: Principal,
    page: Page,
) -> Result<Paginated<Character>, ApiError> {
    list(CharacterKind::Pc, state, principal, page).await
}

/// POST /api/pcs
pub async fn pc_create(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(draft): ApiJson<CharacterDraft>,
) -> ApiResult<Character> {
    create(CharacterKind::Pc, state, principal, draft).await
}

/// GET /api/pcs/:id
pub async fn pc_get(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Character>, ApiError> {
    get(CharacterKind::Pc, state, principal, id).await
}

/// PUT /api/pcs/:id
pub async fn pc_update(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
    ApiJson(changes): ApiJson<CharacterChanges>,
) -> ApiResult<Character> {
    update(CharacterKind::Pc, state, principal, id, changes).await
}

/// DELETE /api/pcs/:id
pub async fn pc_delete(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Deleted> {
    delete(CharacterKind::Pc, state, principal, id).await
}

/// GET /api/npcs
pub async fn npc_list(
    State(state): State<AppState>,
    principal: Principal,
    page: Page,
) -> Result<Paginated<Character>, ApiError> {
    list(CharacterKind::Npc, state, principal, page).await
}

/// POST /api/npcs
pub async fn npc_create(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(draft): ApiJson<CharacterDraft>,
) -> ApiResult<Character> {
    create(CharacterKind::Npc, state, principal, draft).await
}

/// GET /api/npcs/:id
pub async fn npc_get(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Character>, ApiError> {
    get(CharacterKind::Npc, state, principal, id).await
}

/// PUT /api/npcs/:id
pub async fn npc_update(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
    ApiJson(changes): ApiJson<CharacterChanges>,
) -> ApiResult<Character> {
    update(CharacterKind::Npc, state, principal, id, changes).await
}

/// DELETE /api/npcs/:id
pub async fn npc_delete(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Deleted> {
    delete(CharacterKind::Npc, state, principal, id).await
}

/// POST /api/npcs/generate
pub async fn npc_generate(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(request): ApiJson<NpcRequest>,
) -> ApiResult<Character> {
    let npc = state.characters.generate_npc(&principal, request).await?;
    Ok(generated("npc", npc))
}
