//! reqwest client for the generation service.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    EncounterRequest, GenerationError, Generator, LootRequest, NpcRequest, ENCOUNTER_ENDPOINT, HEALTH_ENDPOINT,
    LOOT_ENDPOINT, NPC_ENDPOINT,
};
use crate::config::GenerationConfig;
use crate::models::{Attributes, CharacterDraft, Difficulty, EncounterDraft, Hoard, Monster, SpellBook, TreasureDraft};

pub struct HttpGenerator {
    client: Client,
    base_url: String,
}

impl HttpGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, R>(&self, endpoint: &'static str, body: &B) -> Result<R, GenerationError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let request = self.client.post(format!("{}{}", self.base_url, endpoint)).json(body);
        self.send(endpoint, request).await
    }

    async fn send<R>(&self, endpoint: &'static str, request: reqwest::RequestBuilder) -> Result<R, GenerationError>
    where
        R: DeserializeOwned,
    {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_error(endpoint, e))?;
        if status != StatusCode::OK {
            warn!(
                "Generation service {} answered {}: {}",
                endpoint,
                status.as_u16(),
                String::from_utf8_lossy(&body[..body.len().min(512)])
            );
            return Err(GenerationError::Status { endpoint, status: status.as_u16() });
        }

        debug!("Generation service {} answered with {} bytes", endpoint, body.len());
        serde_json::from_slice(&body).map_err(|e| GenerationError::Decode {
            endpoint,
            message: e.to_string(),
        })
    }
}

fn transport_error(endpoint: &'static str, err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout { endpoint }
    } else {
        GenerationError::Transport { endpoint, message: err.to_string() }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate_npc(&self, request: &NpcRequest) -> Result<CharacterDraft, GenerationError> {
        let response: NpcResponse = self.post(NPC_ENDPOINT, request).await?;
        Ok(response.into_draft(request.level))
    }

    async fn generate_encounter(&self, request: &EncounterRequest) -> Result<EncounterDraft, GenerationError> {
        let wire = EncounterWire {
            player_level: request.player_level,
            player_count: request.player_count,
            difficulty: request.difficulty.wire_code(),
        };
        let response: EncounterResponse = self.post(ENCOUNTER_ENDPOINT, &wire).await?;
        Ok(response.into_draft(request))
    }

    async fn generate_loot(&self, request: &LootRequest) -> Result<TreasureDraft, GenerationError> {
        let wire = LootWire::from(request);
        let response: LootResponse = self.post(LOOT_ENDPOINT, &wire).await?;
        Ok(TreasureDraft {
            name: None,
            level: response.level.unwrap_or(request.level),
            total_value: response.total_value,
            hoards: response.hoards,
        })
    }

    async fn health(&self) -> Result<(), GenerationError> {
        let request = self.client.get(format!("{}{}", self.base_url, HEALTH_ENDPOINT));
        let response: HealthResponse = self.send(HEALTH_ENDPOINT, request).await?;
        if response.status != "healthy" {
            return Err(GenerationError::Unhealthy(response.status));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct NpcResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    level: Option<i32>,
    #[serde(default)]
    race: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    background: String,
    #[serde(default)]
    alignment: String,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
    #[serde(default)]
    abilities: Vec<Value>,
    #[serde(default)]
    equipment: Vec<Value>,
    #[serde(default)]
    hp: i32,
    #[serde(default, alias = "ca")]
    ac: Option<i32>,
    #[serde(default)]
    spells: Option<UpstreamSpells>,
}

/// Spell lists arrive either grouped by level or flat.
#[derive(Deserialize)]
#[serde(untagged)]
enum UpstreamSpells {
    ByLevel(SpellBook),
    Flat(Vec<String>),
    Other(Value),
}

impl NpcResponse {
    fn into_draft(self, requested_level: i32) -> CharacterDraft {
        let spells = match self.spells {
            Some(UpstreamSpells::ByLevel(book)) if !book.is_empty() => Some(book),
            Some(UpstreamSpells::Flat(list)) if !list.is_empty() => Some(BTreeMap::from([("known".to_string(), list)])),
            _ => None,
        };
        CharacterDraft {
            name: self.name,
            description: self.description,
            level: self.level.unwrap_or(requested_level),
            race: self.race,
            class: self.class,
            background: self.background,
            alignment: self.alignment,
            attributes: attributes_from(&self.attributes),
            abilities: self.abilities.iter().map(text).collect(),
            equipment: self.equipment.iter().map(text).collect(),
            hp: self.hp,
            ac: self.ac.unwrap_or(10),
            spells,
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// Reads scores under English names, their abbreviations or Portuguese names.
fn attributes_from(raw: &BTreeMap<String, Value>) -> Attributes {
    let mut attributes = Attributes::default();
    for (key, value) in raw {
        let Some(score) = value.as_i64().and_then(|v| i32::try_from(v).ok()) else {
            continue;
        };
        let slot = match key.to_lowercase().as_str() {
            "strength" | "str" | "força" | "forca" => &mut attributes.strength,
            "dexterity" | "dex" | "destreza" => &mut attributes.dexterity,
            "constitution" | "con" | "constituição" | "constituicao" => &mut attributes.constitution,
            "intelligence" | "int" | "inteligência" | "inteligencia" => &mut attributes.intelligence,
            "wisdom" | "wis" | "sabedoria" => &mut attributes.wisdom,
            "charisma" | "cha" | "carisma" => &mut attributes.charisma,
            _ => continue,
        };
        *slot = score;
    }
    attributes
}

#[derive(Serialize)]
struct EncounterWire {
    player_level: i32,
    player_count: i32,
    difficulty: &'static str,
}

#[derive(Deserialize)]
struct EncounterResponse {
    #[serde(default)]
    theme: String,
    #[serde(default)]
    difficulty: String,
    total_xp: Option<i32>,
    #[serde(default)]
    monsters: Vec<Monster>,
}

impl EncounterResponse {
    fn into_draft(self, request: &EncounterRequest) -> EncounterDraft {
        EncounterDraft {
            theme: self.theme,
            difficulty: Difficulty::from_upstream(&self.difficulty).unwrap_or(request.difficulty),
            total_xp: self.total_xp,
            player_level: request.player_level,
            player_count: request.player_count,
            monsters: self.monsters,
        }
    }
}

#[derive(Serialize)]
struct LootWire<'a> {
    level: i32,
    coin_type: &'a str,
    valuable_type: &'a str,
    item_type: &'a str,
    more_random_coins: bool,
    trade: &'a str,
    gems: bool,
    art_objects: bool,
    magic_items: bool,
    magic_item_categories: Vec<String>,
    ranks: &'a [String],
    max_value: i64,
    combine_hoards: bool,
    quantity: i32,
}

impl<'a> From<&'a LootRequest> for LootWire<'a> {
    fn from(request: &'a LootRequest) -> Self {
        Self {
            level: request.level,
            coin_type: &request.coin_type,
            valuable_type: &request.valuable_type,
            item_type: &request.item_type,
            more_random_coins: request.more_random_coins,
            trade: &request.trade,
            gems: request.gems,
            art_objects: request.art_objects,
            magic_items: request.magic_items,
            magic_item_categories: request.effective_categories(),
            ranks: &request.ranks,
            max_value: request.max_value,
            combine_hoards: request.combine_hoards,
            quantity: request.quantity,
        }
    }
}

#[derive(Deserialize)]
struct LootResponse {
    level: Option<i32>,
    total_value: Option<f64>,
    #[serde(default)]
    hoards: Vec<Hoard>,
}
