use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::app::AppState;

/// GET / - service discovery
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Taverna do Mestre API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "users": "/api/users/register, /api/users/login (public), /api/users/me",
            "characters": "/api/pcs, /api/npcs",
            "content": "/api/encounters, /api/treasures",
            "campaigns": "/api/campaigns[/:id[/characters]]",
            "dice": "/api/dice/roll, /api/dice/roll-multiple",
        }
    }))
}

/// GET /health - process and database liveness
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": now, "database": "unavailable" })),
            )
        }
    }
}
