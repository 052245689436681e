//! Test doubles and a router harness for exercising the API without Postgres
//! or the generation service.

mod memory;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

pub use memory::MemoryStore;

use crate::app::{self, AppState, HttpSettings};
use crate::auth::password::PasswordHasher;
use crate::auth::TokenService;
use crate::generation::{EncounterRequest, GenerationError, Generator, LootRequest, NpcRequest, NPC_ENDPOINT};
use crate::models::{Attributes, CharacterDraft, EncounterDraft, Hoard, Monster, TreasureDraft};

pub const TEST_SECRET: &str = "test-secret";

/// Canned generator. `set_failing(true)` makes every call a 502-worthy error.
#[derive(Default)]
pub struct StubGenerator {
    failing: AtomicBool,
}

impl StubGenerator {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), GenerationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GenerationError::Status { endpoint: NPC_ENDPOINT, status: 500 });
        }
        Ok(())
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate_npc(&self, request: &NpcRequest) -> Result<CharacterDraft, GenerationError> {
        self.check()?;
        Ok(CharacterDraft {
            name: "Borin Stonefist".into(),
            description: "A gruff innkeeper".into(),
            level: request.level,
            race: "Dwarf".into(),
            class: "Fighter".into(),
            background: "Soldier".into(),
            alignment: "Lawful Neutral".into(),
            attributes: Attributes::default(),
            abilities: vec!["Second Wind".into()],
            equipment: vec!["Warhammer".into()],
            hp: 12,
            ac: 16,
            spells: None,
        })
    }

    async fn generate_encounter(&self, request: &EncounterRequest) -> Result<EncounterDraft, GenerationError> {
        self.check()?;
        Ok(EncounterDraft {
            theme: "Goblin ambush".into(),
            difficulty: request.difficulty,
            total_xp: None,
            player_level: request.player_level,
            player_count: request.player_count,
            monsters: vec![Monster { name: "Goblin".into(), xp: 50, cr: 0.25 }; 3],
        })
    }

    async fn generate_loot(&self, request: &LootRequest) -> Result<TreasureDraft, GenerationError> {
        self.check()?;
        Ok(TreasureDraft {
            name: None,
            level: request.level,
            total_value: None,
            hoards: vec![Hoard { value: 120.0, ..Hoard::default() }],
        })
    }

    async fn health(&self) -> Result<(), GenerationError> {
        self.check()
    }
}

/// Full router over a `MemoryStore` and `StubGenerator`.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<StubGenerator>,
    pub tokens: TokenService,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_tokens(TokenService::new(Some(TEST_SECRET), 24))
    }

    pub fn with_tokens(tokens: TokenService) -> Self {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(StubGenerator::default());
        let state = AppState::new(
            store.clone(),
            generator.clone(),
            tokens.clone(),
            PasswordHasher::new(PasswordHasher::MIN_COST),
        );
        let settings = HttpSettings {
            cors_origin: "http://localhost:5173".into(),
            request_timeout: Duration::from_secs(30),
        };
        Self {
            router: app::router(state, &settings),
            store,
            generator,
            tokens,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        TestResponse {
            status,
            body: serde_json::from_str(&text).unwrap_or(Value::Null),
            text,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers `name` and returns (user id, token).
    pub async fn register(&self, name: &str) -> (i64, String) {
        let response = self
            .request(
                Method::POST,
                "/api/users/register",
                None,
                Some(serde_json::json!({
                    "username": name,
                    "email": format!("{}@example.com", name),
                    "password": "Pass123!",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        let id = response.body["data"]["user"]["id"].as_i64().unwrap();
        let token = response.body["data"]["token"].as_str().unwrap().to_string();
        (id, token)
    }

    /// Promotes `user_id` and returns a fresh token carrying the admin claim.
    pub async fn admin_token(&self, user_id: i64) -> String {
        use crate::database::UserStore;

        self.store.promote_to_admin(user_id);
        let user = self.store.user_by_id(user_id).await.unwrap().unwrap();
        self.tokens.issue(&user).unwrap()
    }
}
