use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;
use crate::error::ApiError;

/// Spells keyed by spell level ("cantrips", "1", "2", ...).
pub type SpellBook = BTreeMap<String, Vec<String>>;

pub const MAX_LEVEL: i32 = 20;
pub const MAX_SCORE: i32 = 30;

/// Player characters and NPCs share one shape but live in separate tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterKind {
    #[default]
    Pc,
    Npc,
}

impl CharacterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CharacterKind::Pc => "pc",
            CharacterKind::Npc => "npc",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            CharacterKind::Pc => "pcs",
            CharacterKind::Npc => "npcs",
        }
    }

    /// Human label used in response messages.
    pub fn label(self) -> &'static str {
        match self {
            CharacterKind::Pc => "character",
            CharacterKind::Npc => "npc",
        }
    }
}

impl fmt::Display for CharacterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pc" => Ok(CharacterKind::Pc),
            "npc" => Ok(CharacterKind::Npc),
            other => Err(format!("unknown character kind '{}'", other)),
        }
    }
}

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Attributes {
    #[serde(alias = "str")]
    pub strength: i32,
    #[serde(alias = "dex")]
    pub dexterity: i32,
    #[serde(alias = "con")]
    pub constitution: i32,
    #[serde(alias = "int")]
    pub intelligence: i32,
    #[serde(alias = "wis")]
    pub wisdom: i32,
    #[serde(alias = "cha")]
    pub charisma: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl Attributes {
    fn scores(&self) -> [(&'static str, i32); 6] {
        [
            ("strength", self.strength),
            ("dexterity", self.dexterity),
            ("constitution", self.constitution),
            ("intelligence", self.intelligence),
            ("wisdom", self.wisdom),
            ("charisma", self.charisma),
        ]
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        for (name, score) in self.scores() {
            if !(1..=MAX_SCORE).contains(&score) {
                return Err(ApiError::bad_request(format!(
                    "{} must be between 1 and {}",
                    name, MAX_SCORE
                )));
            }
        }
        Ok(())
    }

    pub fn modifiers(&self) -> Attributes {
        Attributes {
            strength: modifier(self.strength),
            dexterity: modifier(self.dexterity),
            constitution: modifier(self.constitution),
            intelligence: modifier(self.intelligence),
            wisdom: modifier(self.wisdom),
            charisma: modifier(self.charisma),
        }
    }
}

/// Ability modifier, rounded toward negative infinity (score 9 gives -1).
pub fn modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

pub fn proficiency_bonus(level: i32) -> i32 {
    match level {
        17.. => 6,
        13..=16 => 5,
        9..=12 => 4,
        5..=8 => 3,
        _ => 2,
    }
}

/// Partial attribute update; absent scores keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeChanges {
    #[serde(alias = "str")]
    pub strength: Option<i32>,
    #[serde(alias = "dex")]
    pub dexterity: Option<i32>,
    #[serde(alias = "con")]
    pub constitution: Option<i32>,
    #[serde(alias = "int")]
    pub intelligence: Option<i32>,
    #[serde(alias = "wis")]
    pub wisdom: Option<i32>,
    #[serde(alias = "cha")]
    pub charisma: Option<i32>,
}

impl AttributeChanges {
    pub fn validate(&self) -> Result<(), ApiError> {
        let scores = [
            self.strength,
            self.dexterity,
            self.constitution,
            self.intelligence,
            self.wisdom,
            self.charisma,
        ];
        if scores.iter().flatten().any(|s| !(1..=MAX_SCORE).contains(s)) {
            return Err(ApiError::bad_request(format!(
                "attribute scores must be between 1 and {}",
                MAX_SCORE
            )));
        }
        Ok(())
    }

    pub fn apply(&self, attributes: &mut Attributes) {
        let pairs = [
            (self.strength, &mut attributes.strength),
            (self.dexterity, &mut attributes.dexterity),
            (self.constitution, &mut attributes.constitution),
            (self.intelligence, &mut attributes.intelligence),
            (self.wisdom, &mut attributes.wisdom),
            (self.charisma, &mut attributes.charisma),
        ];
        for (change, slot) in pairs {
            if let Some(value) = change {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Character {
    pub id: Id,
    pub kind: CharacterKind,
    pub owner_id: Id,
    pub name: String,
    pub description: String,
    pub level: i32,
    pub race: String,
    pub class: String,
    pub background: String,
    pub alignment: String,
    pub attributes: Attributes,
    pub modifiers: Attributes,
    pub proficiency_bonus: i32,
    pub abilities: Vec<String>,
    pub equipment: Vec<String>,
    pub hp: i32,
    pub ac: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spells: Option<SpellBook>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    /// Recompute the fields that follow from attributes and level.
    pub fn refresh_derived(&mut self) {
        self.modifiers = self.attributes.modifiers();
        self.proficiency_bonus = proficiency_bonus(self.level);
    }

    /// Materialize a draft that has not been persisted (id 0).
    pub fn from_draft(kind: CharacterKind, owner_id: Id, draft: CharacterDraft) -> Self {
        let now = Utc::now();
        let mut character = Character {
            id: 0,
            kind,
            owner_id,
            name: draft.name.trim().to_string(),
            description: draft.description,
            level: draft.level,
            race: draft.race,
            class: draft.class,
            background: draft.background,
            alignment: draft.alignment,
            attributes: draft.attributes,
            modifiers: Attributes::default(),
            proficiency_bonus: 2,
            abilities: draft.abilities,
            equipment: draft.equipment,
            hp: draft.hp,
            ac: draft.ac,
            spells: draft.spells,
            created_at: now,
            updated_at: now,
        };
        character.refresh_derived();
        character
    }
}

fn default_level() -> i32 {
    1
}

fn default_ac() -> i32 {
    10
}

/// Create body for PCs and NPCs. Owner fields in the body are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_level")]
    pub level: i32,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub alignment: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub hp: i32,
    #[serde(default = "default_ac")]
    pub ac: i32,
    #[serde(default)]
    pub spells: Option<SpellBook>,
}

impl CharacterDraft {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_sheet(&self.name, self.level, &self.attributes, self.hp, self.ac)
    }
}

/// Partial update body; absent fields leave prior values untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub level: Option<i32>,
    pub race: Option<String>,
    pub class: Option<String>,
    pub background: Option<String>,
    pub alignment: Option<String>,
    pub attributes: Option<AttributeChanges>,
    pub abilities: Option<Vec<String>>,
    pub equipment: Option<Vec<String>>,
    pub hp: Option<i32>,
    pub ac: Option<i32>,
    pub spells: Option<SpellBook>,
}

impl CharacterChanges {
    /// Every rule is per field, so checking the present fields is enough to
    /// keep the merged sheet valid.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ApiError::bad_request("name is required"));
        }
        if self.name.as_deref().is_some_and(|n| n.trim().chars().count() > 100) {
            return Err(ApiError::bad_request("name must be at most 100 characters"));
        }
        if self.level.is_some_and(|l| !(1..=MAX_LEVEL).contains(&l)) {
            return Err(ApiError::bad_request(format!("level must be between 1 and {}", MAX_LEVEL)));
        }
        if let Some(attributes) = &self.attributes {
            attributes.validate()?;
        }
        if self.hp.is_some_and(|hp| hp < 0) {
            return Err(ApiError::bad_request("hp must not be negative"));
        }
        if self.ac.is_some_and(|ac| ac < 0) {
            return Err(ApiError::bad_request("ac must not be negative"));
        }
        Ok(())
    }

    pub fn apply(self, character: &mut Character) {
        if let Some(name) = self.name {
            character.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            character.description = description;
        }
        if let Some(level) = self.level {
            character.level = level;
        }
        if let Some(race) = self.race {
            character.race = race;
        }
        if let Some(class) = self.class {
            character.class = class;
        }
        if let Some(background) = self.background {
            character.background = background;
        }
        if let Some(alignment) = self.alignment {
            character.alignment = alignment;
        }
        if let Some(changes) = self.attributes {
            changes.apply(&mut character.attributes);
        }
        if let Some(abilities) = self.abilities {
            character.abilities = abilities;
        }
        if let Some(equipment) = self.equipment {
            character.equipment = equipment;
        }
        if let Some(hp) = self.hp {
            character.hp = hp;
        }
        if let Some(ac) = self.ac {
            character.ac = ac;
        }
        if let Some(spells) = self.spells {
            character.spells = Some(spells);
        }
        character.refresh_derived();
        character.updated_at = Utc::now();
    }
}

/// Rules shared by characters and campaign instances.
pub fn validate_sheet(name: &str, level: i32, attributes: &Attributes, hp: i32, ac: i32) -> Result<(), ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    if name.chars().count() > 100 {
        return Err(ApiError::bad_request("name must be at most 100 characters"));
    }
    if !(1..=MAX_LEVEL).contains(&level) {
        return Err(ApiError::bad_request(format!("level must be between 1 and {}", MAX_LEVEL)));
    }
    attributes.validate()?;
    if hp < 0 {
        return Err(ApiError::bad_request("hp must not be negative"));
    }
    if ac < 0 {
        return Err(ApiError::bad_request("ac must not be negative"));
    }
    Ok(())
}
