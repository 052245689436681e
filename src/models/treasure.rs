use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;
use crate::error::ApiError;

/// Gems and art objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuable {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub rank: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasureItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub rank: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hoard {
    /// Amount per denomination (cp, sp, ep, gp, pp).
    #[serde(default)]
    pub coins: BTreeMap<String, i64>,
    #[serde(default)]
    pub valuables: Vec<Valuable>,
    #[serde(default)]
    pub items: Vec<TreasureItem>,
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Treasure {
    pub id: Id,
    pub owner_id: Id,
    pub name: String,
    pub level: i32,
    pub total_value: f64,
    pub hoards: Vec<Hoard>,
    pub created_at: DateTime<Utc>,
}

impl Treasure {
    pub fn from_draft(owner_id: Id, draft: TreasureDraft) -> Self {
        let total_value = draft
            .total_value
            .unwrap_or_else(|| draft.hoards.iter().map(|h| h.value).sum());
        let name = match draft.name.map(|n| n.trim().to_string()) {
            Some(name) if !name.is_empty() => name,
            _ => format!("Level {} treasure", draft.level),
        };
        Self {
            id: 0,
            owner_id,
            name,
            level: draft.level,
            total_value,
            hoards: draft.hoards,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreasureDraft {
    #[serde(default)]
    pub name: Option<String>,
    pub level: i32,
    /// Defaults to the sum of hoard values.
    #[serde(default)]
    pub total_value: Option<f64>,
    #[serde(default)]
    pub hoards: Vec<Hoard>,
}

impl TreasureDraft {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(1..=20).contains(&self.level) {
            return Err(ApiError::bad_request("level must be between 1 and 20"));
        }
        if self.total_value.is_some_and(|v| v < 0.0 || !v.is_finite()) {
            return Err(ApiError::bad_request("total_value must not be negative"));
        }
        for hoard in &self.hoards {
            if hoard.value < 0.0 || hoard.coins.values().any(|amount| *amount < 0) {
                return Err(ApiError::bad_request("hoard values must not be negative"));
            }
        }
        Ok(())
    }
}
