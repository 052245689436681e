use axum::Json;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::ApiJson;
use crate::services::dice::{self, RollRequest, RollResult};

/// POST /api/dice/roll
pub async fn roll(_principal: Principal, ApiJson(request): ApiJson<RollRequest>) -> Result<Json<RollResult>, ApiError> {
    Ok(Json(dice::roll(request)?))
}

/// POST /api/dice/roll-multiple
pub async fn roll_multiple(
    _principal: Principal,
    ApiJson(requests): ApiJson<Vec<RollRequest>>,
) -> Result<Json<Vec<RollResult>>, ApiError> {
    Ok(Json(dice::roll_many(requests)?))
}
