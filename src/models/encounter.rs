use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Deadly,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Deadly => "deadly",
        }
    }

    /// Code understood by the generation service.
    pub fn wire_code(self) -> &'static str {
        match self {
            Difficulty::Easy => "f",
            Difficulty::Medium => "m",
            Difficulty::Hard => "d",
            Difficulty::Deadly => "mo",
        }
    }

    /// Accepts the names above plus the generation service's codes and labels.
    pub fn from_upstream(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "easy" | "f" | "fácil" | "facil" => Some(Difficulty::Easy),
            "medium" | "m" | "médio" | "medio" => Some(Difficulty::Medium),
            "hard" | "d" | "difícil" | "dificil" => Some(Difficulty::Hard),
            "deadly" | "mo" | "mortal" => Some(Difficulty::Deadly),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "deadly" => Ok(Difficulty::Deadly),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    #[serde(default)]
    pub xp: i32,
    #[serde(default)]
    pub cr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encounter {
    pub id: Id,
    pub owner_id: Id,
    pub theme: String,
    pub difficulty: Difficulty,
    pub total_xp: i32,
    pub player_level: i32,
    pub player_count: i32,
    pub monsters: Vec<Monster>,
    pub created_at: DateTime<Utc>,
}

impl Encounter {
    pub fn from_draft(owner_id: Id, draft: EncounterDraft) -> Self {
        let total_xp = draft
            .total_xp
            .unwrap_or_else(|| draft.monsters.iter().map(|m| m.xp).sum());
        Self {
            id: 0,
            owner_id,
            theme: draft.theme.trim().to_string(),
            difficulty: draft.difficulty,
            total_xp,
            player_level: draft.player_level,
            player_count: draft.player_count,
            monsters: draft.monsters,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EncounterDraft {
    pub theme: String,
    pub difficulty: Difficulty,
    /// Defaults to the sum of monster XP.
    #[serde(default)]
    pub total_xp: Option<i32>,
    pub player_level: i32,
    pub player_count: i32,
    #[serde(default)]
    pub monsters: Vec<Monster>,
}

impl EncounterDraft {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.theme.trim().is_empty() {
            return Err(ApiError::bad_request("theme is required"));
        }
        validate_party(self.player_level, self.player_count)?;
        if self.total_xp.is_some_and(|xp| xp < 0) {
            return Err(ApiError::bad_request("total_xp must not be negative"));
        }
        for monster in &self.monsters {
            if monster.name.trim().is_empty() {
                return Err(ApiError::bad_request("monster name is required"));
            }
            if monster.xp < 0 || monster.cr < 0.0 || !monster.cr.is_finite() {
                return Err(ApiError::bad_request("monster xp and cr must not be negative"));
            }
        }
        Ok(())
    }
}

pub fn validate_party(player_level: i32, player_count: i32) -> Result<(), ApiError> {
    if !(1..=20).contains(&player_level) {
        return Err(ApiError::bad_request("player_level must be between 1 and 20"));
    }
    if !(1..=10).contains(&player_count) {
        return Err(ApiError::bad_request("player_count must be between 1 and 10"));
    }
    Ok(())
}
