use std::{any::Any, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::error;

use crate::auth::password::PasswordHasher;
use crate::auth::TokenService;
use crate::database::Store;
use crate::generation::Generator;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{cors_layer, jwt_auth_middleware, preflight_no_content};
use crate::services::{
    CampaignService, CharacterService, EncounterService, HomebrewService, InstanceService, TreasureService,
    UserService,
};

/// Shared router state. Everything in here is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub users: UserService,
    pub characters: CharacterService,
    pub encounters: EncounterService,
    pub treasures: TreasureService,
    pub homebrew: HomebrewService,
    pub campaigns: CampaignService,
    pub instances: InstanceService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        generator: Arc<dyn Generator>,
        tokens: TokenService,
        hasher: PasswordHasher,
    ) -> Self {
        let campaigns = CampaignService::new(store.clone());
        Self {
            users: UserService::new(store.clone(), tokens.clone(), hasher),
            characters: CharacterService::new(store.clone(), generator.clone()),
            encounters: EncounterService::new(store.clone(), generator.clone()),
            treasures: TreasureService::new(store.clone(), generator),
            homebrew: HomebrewService::new(store.clone()),
            instances: InstanceService::new(store.clone(), campaigns.clone()),
            campaigns,
            tokens,
            store,
        }
    }
}

/// Per-request limits and the browser origin allowed to call the API.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cors_origin: String,
    pub request_timeout: Duration,
}

pub fn router(state: AppState, settings: &HttpSettings) -> Router {
    let protected = Router::new()
        .merge(user_routes())
        .merge(character_routes())
        .merge(content_routes())
        .merge(homebrew_routes())
        .merge(campaign_routes())
        .merge(dice_routes())
        .route_layer(from_fn_with_state(state.tokens.clone(), jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/users/register", post(public::register))
        .route("/api/users/login", post(public::login))
        // Protected API
        .merge(protected)
        .with_state(state)
        // Global middleware, innermost first
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(&settings.cors_origin))
        .layer(from_fn(preflight_no_content))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users/me",
            get(protected::users::me_get)
                .put(protected::users::me_put)
                .delete(protected::users::me_delete),
        )
        .route("/api/users", get(elevated::user_list))
        .route("/api/users/:id", get(elevated::user_get).delete(elevated::user_delete))
}

fn character_routes() -> Router<AppState> {
    use protected::characters as c;

    Router::new()
        .route("/api/pcs", get(c::pc_list).post(c::pc_create))
        .route("/api/pcs/:id", get(c::pc_get).put(c::pc_update).delete(c::pc_delete))
        .route("/api/npcs", get(c::npc_list).post(c::npc_create))
        .route("/api/npcs/generate", post(c::npc_generate))
        .route("/api/npcs/:id", get(c::npc_get).put(c::npc_update).delete(c::npc_delete))
}

fn content_routes() -> Router<AppState> {
    use protected::content as c;

    Router::new()
        .route("/api/encounters", get(c::encounter_list).post(c::encounter_create))
        .route("/api/encounters/generate", post(c::encounter_generate))
        .route("/api/encounters/:id", get(c::encounter_get).delete(c::encounter_delete))
        .route("/api/treasures", get(c::treasure_list).post(c::treasure_create))
        .route("/api/treasures/generate", post(c::treasure_generate))
        .route("/api/treasures/:id", get(c::treasure_get).delete(c::treasure_delete))
}

fn homebrew_routes() -> Router<AppState> {
    use protected::homebrew as h;

    Router::new()
        .route("/api/homebrew/:kind", get(h::homebrew_list).post(h::homebrew_create))
        .route("/api/homebrew/:kind/favorites", get(h::favorite_list))
        .route(
            "/api/homebrew/:kind/:id",
            get(h::homebrew_get).put(h::homebrew_update).delete(h::homebrew_delete),
        )
        .route(
            "/api/homebrew/:kind/:id/favorite",
            post(h::favorite_add).delete(h::favorite_remove),
        )
        .route("/api/homebrew/:kind/:id/rating", put(h::rating_put).delete(h::rating_delete))
}

fn campaign_routes() -> Router<AppState> {
    use protected::campaigns as c;
    use protected::instances as i;

    Router::new()
        .route("/api/campaigns", get(c::campaign_list).post(c::campaign_create))
        .route("/api/campaigns/join", post(c::campaign_join))
        .route(
            "/api/campaigns/:id",
            get(c::campaign_get).put(c::campaign_update).delete(c::campaign_delete),
        )
        .route("/api/campaigns/:id/invite-code", get(c::invite_code_get))
        .route("/api/campaigns/:id/regenerate-code", post(c::invite_code_rotate))
        .route("/api/campaigns/:id/leave", axum::routing::delete(c::campaign_leave))
        .route("/api/campaigns/:id/players", get(c::campaign_members))
        // Campaign characters
        .route("/api/campaigns/:id/available-characters", get(i::available))
        .route("/api/campaigns/:id/characters", get(i::instance_list).post(i::instance_attach))
        .route(
            "/api/campaigns/:id/characters/:instance_id",
            get(i::instance_get).put(i::instance_update).delete(i::instance_delete),
        )
        .route("/api/campaigns/:id/characters/:instance_id/full", put(i::instance_update_full))
        .route("/api/campaigns/:id/characters/:instance_id/sync", post(i::instance_sync))
}

fn dice_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dice/roll", post(protected::dice::roll))
        .route("/api/dice/roll-multiple", post(protected::dice::roll_multiple))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);

    let mut response = Response::new(Body::from("internal server error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}
