use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Id;
use crate::error::ApiError;

pub const HIT_DICE: [i32; 4] = [6, 8, 10, 12];
pub const SIZES: [&str; 6] = ["Tiny", "Small", "Medium", "Large", "Huge", "Gargantuan"];

/// User-authored races, classes and backgrounds. The path segment is plural
/// (`/api/homebrew/races`), the stored and serialized kind is singular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomebrewKind {
    #[serde(rename(serialize = "race", deserialize = "races"), alias = "race")]
    Race,
    #[serde(rename(serialize = "class", deserialize = "classes"), alias = "class")]
    Class,
    #[serde(rename(serialize = "background", deserialize = "backgrounds"), alias = "background")]
    Background,
}

impl HomebrewKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HomebrewKind::Race => "race",
            HomebrewKind::Class => "class",
            HomebrewKind::Background => "background",
        }
    }
}

impl fmt::Display for HomebrewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HomebrewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "race" => Ok(HomebrewKind::Race),
            "class" => Ok(HomebrewKind::Class),
            "background" => Ok(HomebrewKind::Background),
            other => Err(format!("unknown homebrew kind '{}'", other)),
        }
    }
}

/// A named rule snippet: racial trait, class feature, background feature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceDetails {
    pub speed: i32,
    pub size: String,
    pub languages: Vec<String>,
    pub traits: Vec<Feature>,
    /// Ability score increases, e.g. `{"strength": 2}`.
    pub abilities: BTreeMap<String, i32>,
    /// Keyed by category: weapons, armor, tools, skills.
    pub proficiencies: BTreeMap<String, Vec<String>>,
}

impl Default for RaceDetails {
    fn default() -> Self {
        Self {
            speed: 30,
            size: String::new(),
            languages: Vec::new(),
            traits: Vec::new(),
            abilities: BTreeMap::new(),
            proficiencies: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillChoices {
    pub count: i32,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDetails {
    pub hit_die: i32,
    pub primary_ability: String,
    pub saving_throws: Vec<String>,
    pub armor_proficiency: Vec<String>,
    pub weapon_proficiency: Vec<String>,
    pub tool_proficiency: Vec<String>,
    pub skill_choices: SkillChoices,
    /// Features gained per class level ("1", "2", ...).
    pub features: BTreeMap<String, Vec<Feature>>,
    pub spellcasting: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquipmentEntry {
    pub name: String,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundDetails {
    pub skill_proficiencies: Vec<String>,
    pub tool_proficiencies: Vec<String>,
    /// Number of extra languages granted.
    pub languages: i32,
    pub equipment: Vec<EquipmentEntry>,
    pub feature: Option<Feature>,
    /// personality, ideals, bonds, flaws.
    pub suggested_traits: BTreeMap<String, Vec<String>>,
}

/// The kind-specific half of a homebrew entry, flattened into its JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HomebrewDetails {
    Race(RaceDetails),
    Class(ClassDetails),
    Background(BackgroundDetails),
}

impl HomebrewDetails {
    /// Reads the fields of `kind` out of a JSON object; other keys are ignored.
    pub fn from_value(kind: HomebrewKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            HomebrewKind::Race => HomebrewDetails::Race(serde_json::from_value(value)?),
            HomebrewKind::Class => HomebrewDetails::Class(serde_json::from_value(value)?),
            HomebrewKind::Background => HomebrewDetails::Background(serde_json::from_value(value)?),
        })
    }

    pub fn kind(&self) -> HomebrewKind {
        match self {
            HomebrewDetails::Race(_) => HomebrewKind::Race,
            HomebrewDetails::Class(_) => HomebrewKind::Class,
            HomebrewDetails::Background(_) => HomebrewKind::Background,
        }
    }

    fn to_object(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        match self {
            HomebrewDetails::Race(race) => {
                if race.speed < 0 {
                    return Err(ApiError::bad_request("speed must not be negative"));
                }
                if !SIZES.contains(&race.size.as_str()) {
                    return Err(ApiError::bad_request(format!("size must be one of {}", SIZES.join(", "))));
                }
            }
            HomebrewDetails::Class(class) => {
                if !HIT_DICE.contains(&class.hit_die) {
                    return Err(ApiError::bad_request("hit_die must be one of 6, 8, 10 or 12"));
                }
                if class.primary_ability.trim().is_empty() {
                    return Err(ApiError::bad_request("primary_ability is required"));
                }
                if class.saving_throws.len() != 2 {
                    return Err(ApiError::bad_request("a class has exactly two saving_throws"));
                }
                if class.skill_choices.count < 0 {
                    return Err(ApiError::bad_request("skill_choices.count must not be negative"));
                }
            }
            HomebrewDetails::Background(background) => {
                if background.languages < 0 {
                    return Err(ApiError::bad_request("languages must not be negative"));
                }
                if background.equipment.iter().any(|e| e.quantity < 1) {
                    return Err(ApiError::bad_request("equipment quantity must be at least 1"));
                }
            }
        }
        Ok(())
    }
}

/// Everything the author controls, validated and typed.
#[derive(Debug, Clone, PartialEq)]
pub struct HomebrewContent {
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub details: HomebrewDetails,
}

impl HomebrewContent {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() {
            return Err(ApiError::bad_request("name is required"));
        }
        if self.name.chars().count() > 100 {
            return Err(ApiError::bad_request("name must be at most 100 characters"));
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::bad_request("description is required"));
        }
        self.details.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Homebrew {
    pub id: Id,
    pub kind: HomebrewKind,
    pub owner_id: Id,
    pub owner_username: String,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    #[serde(flatten)]
    pub details: HomebrewDetails,
    pub average_rating: f64,
    pub rating_count: i64,
    pub favorites_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn invalid_details(e: serde_json::Error) -> ApiError {
    ApiError::bad_request(format!("invalid body: {}", e))
}

/// Create body. Common fields are named; whatever else arrives is read as
/// the details of the kind in the path.
#[derive(Debug, Clone, Deserialize)]
pub struct HomebrewDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HomebrewDraft {
    pub fn into_content(self, kind: HomebrewKind) -> Result<HomebrewContent, ApiError> {
        let details = HomebrewDetails::from_value(kind, Value::Object(self.details)).map_err(invalid_details)?;
        let content = HomebrewContent {
            name: self.name.trim().to_string(),
            description: self.description,
            is_public: self.is_public,
            details,
        };
        content.validate()?;
        Ok(content)
    }
}

/// Partial update: absent keys keep their stored value, present detail keys
/// replace theirs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomebrewChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HomebrewChanges {
    pub fn merge(self, current: &Homebrew) -> Result<HomebrewContent, ApiError> {
        let mut merged = current.details.to_object();
        merged.extend(self.details);
        let details = HomebrewDetails::from_value(current.kind, Value::Object(merged)).map_err(invalid_details)?;
        let content = HomebrewContent {
            name: self.name.map(|n| n.trim().to_string()).unwrap_or_else(|| current.name.clone()),
            description: self.description.unwrap_or_else(|| current.description.clone()),
            is_public: self.is_public.unwrap_or(current.is_public),
            details,
        };
        content.validate()?;
        Ok(content)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RatingRequest {
    pub rating: i32,
}

impl RatingRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ApiError::bad_request("rating must be between 1 and 5"));
        }
        Ok(())
    }
}
