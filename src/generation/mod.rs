//! Procedural generation of NPCs, encounters and loot by an external service.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpGenerator;

use crate::error::ApiError;
use crate::models::encounter::validate_party;
use crate::models::{CharacterDraft, Difficulty, EncounterDraft, TreasureDraft};

pub const NPC_ENDPOINT: &str = "/generate-npc";
pub const ENCOUNTER_ENDPOINT: &str = "/generate-encounter";
pub const LOOT_ENDPOINT: &str = "/generate-loot";
pub const HEALTH_ENDPOINT: &str = "/health";

/// Categories requested when magic items are enabled without a selection.
pub const DEFAULT_MAGIC_ITEM_CATEGORIES: [&str; 9] = [
    "armor", "weapons", "potions", "rings", "rods", "scrolls", "staves", "wands", "wondrous",
];

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: &'static str, message: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: &'static str },

    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("Could not decode {endpoint} response: {message}")]
    Decode { endpoint: &'static str, message: String },

    #[error("Generated content was rejected: {0}")]
    Rejected(String),

    #[error("Generation service is unhealthy: {0}")]
    Unhealthy(String),

    #[error("Could not build HTTP client: {0}")]
    Client(String),
}

/// How the generator rolls ability scores. Values are the service's own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributesMethod {
    #[default]
    Rolagem,
    Array,
    Compra,
}

fn default_level() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcRequest {
    #[serde(default = "default_level")]
    pub level: i32,
    #[serde(default)]
    pub attributes_method: AttributesMethod,
    #[serde(default)]
    pub manual: bool,
}

impl NpcRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_level(self.level)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EncounterRequest {
    pub player_level: i32,
    pub player_count: i32,
    pub difficulty: Difficulty,
}

impl EncounterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_party(self.player_level, self.player_count)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LootRequest {
    pub level: i32,
    #[serde(default = "default_true")]
    pub magic_items: bool,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub more_random_coins: bool,
    #[serde(default)]
    pub magic_item_categories: Vec<String>,
    #[serde(default)]
    pub coin_type: String,
    #[serde(default)]
    pub valuable_type: String,
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub trade: String,
    #[serde(default)]
    pub gems: bool,
    #[serde(default)]
    pub art_objects: bool,
    #[serde(default)]
    pub ranks: Vec<String>,
    #[serde(default)]
    pub max_value: i64,
    #[serde(default)]
    pub combine_hoards: bool,
}

impl LootRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_level(self.level)?;
        if !(1..=10).contains(&self.quantity) {
            return Err(ApiError::bad_request("quantity must be between 1 and 10"));
        }
        if self.max_value < 0 {
            return Err(ApiError::bad_request("max_value must not be negative"));
        }
        Ok(())
    }

    /// Categories actually sent upstream.
    pub fn effective_categories(&self) -> Vec<String> {
        if !self.magic_items {
            Vec::new()
        } else if self.magic_item_categories.is_empty() {
            DEFAULT_MAGIC_ITEM_CATEGORIES.iter().map(|c| c.to_string()).collect()
        } else {
            self.magic_item_categories.clone()
        }
    }
}

fn validate_level(level: i32) -> Result<(), ApiError> {
    if !(1..=20).contains(&level) {
        return Err(ApiError::bad_request("level must be between 1 and 20"));
    }
    Ok(())
}

/// Source of generated content. Results are drafts; persisting them is the caller's job.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate_npc(&self, request: &NpcRequest) -> Result<CharacterDraft, GenerationError>;

    async fn generate_encounter(&self, request: &EncounterRequest) -> Result<EncounterDraft, GenerationError>;

    async fn generate_loot(&self, request: &LootRequest) -> Result<TreasureDraft, GenerationError>;

    async fn health(&self) -> Result<(), GenerationError>;
}
