use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::character::{validate_sheet, AttributeChanges, Attributes, Character, CharacterKind, SpellBook, MAX_LEVEL};
use super::Id;
use crate::error::ApiError;

/// Standard conditions a creature can be under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Blinded,
    Charmed,
    Deafened,
    Exhaustion,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
}

/// Fields copied from the source character at attach time and on every sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: i32,
    pub background: String,
    pub attributes: Attributes,
    pub abilities: Vec<String>,
    pub equipment: Vec<String>,
    pub hp: i32,
    pub ac: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spells: Option<SpellBook>,
}

impl From<&Character> for Template {
    fn from(source: &Character) -> Self {
        Self {
            name: source.name.clone(),
            race: source.race.clone(),
            class: source.class.clone(),
            level: source.level,
            background: source.background.clone(),
            attributes: source.attributes,
            abilities: source.abilities.clone(),
            equipment: source.equipment.clone(),
            hp: source.hp,
            ac: source.ac,
            spells: source.spells.clone(),
        }
    }
}

/// A character forked into one campaign.
///
/// The template layer tracks the source; the campaign layer (hit points,
/// conditions, xp, notes, inventory deltas) belongs to the table and is never
/// touched by a sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignCharacter {
    pub id: Id,
    pub campaign_id: Id,
    pub owner_id: Id,
    pub source_kind: CharacterKind,
    /// `None` once the source character has been deleted.
    pub source_character_id: Option<Id>,
    pub detached: bool,
    #[serde(flatten)]
    pub template: Template,
    pub modifiers: Attributes,
    pub current_hp: i32,
    pub temp_hp: i32,
    pub xp: i32,
    pub conditions: Vec<Condition>,
    pub session_notes: String,
    pub inventory_added: Vec<String>,
    pub inventory_removed: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
}

impl CampaignCharacter {
    /// Fresh instance of `source` with the campaign layer at its starting values.
    pub fn attach(campaign_id: Id, source: &Character) -> Self {
        let now = Utc::now();
        let template = Template::from(source);
        let mut instance = Self {
            id: 0,
            campaign_id,
            owner_id: source.owner_id,
            source_kind: source.kind,
            source_character_id: Some(source.id),
            detached: false,
            current_hp: template.hp,
            template,
            modifiers: Attributes::default(),
            temp_hp: 0,
            xp: 0,
            conditions: Vec::new(),
            session_notes: String::new(),
            inventory_added: Vec::new(),
            inventory_removed: Vec::new(),
            created_at: now,
            last_synced_at: now,
        };
        instance.refresh_derived();
        instance
    }

    pub fn refresh_derived(&mut self) {
        self.modifiers = self.template.attributes.modifiers();
        self.detached = self.source_character_id.is_none();
    }

    pub fn detach(&mut self) {
        self.source_character_id = None;
        self.refresh_derived();
    }
}

/// Changes to the campaign layer. Template fields in the same body are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateChanges {
    pub current_hp: Option<i32>,
    pub temp_hp: Option<i32>,
    pub xp: Option<i32>,
    pub conditions: Option<Vec<Condition>>,
    pub session_notes: Option<String>,
    pub inventory_added: Option<Vec<String>>,
    pub inventory_removed: Option<Vec<String>>,
}

impl StateChanges {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.current_hp.is_some_and(|hp| hp < 0) {
            return Err(ApiError::bad_request("current_hp must not be negative"));
        }
        if self.temp_hp.is_some_and(|hp| hp < 0) {
            return Err(ApiError::bad_request("temp_hp must not be negative"));
        }
        if self.xp.is_some_and(|xp| xp < 0) {
            return Err(ApiError::bad_request("xp must not be negative"));
        }
        Ok(())
    }

    fn apply(self, instance: &mut CampaignCharacter) {
        if let Some(current_hp) = self.current_hp {
            instance.current_hp = current_hp;
        }
        if let Some(temp_hp) = self.temp_hp {
            instance.temp_hp = temp_hp;
        }
        if let Some(xp) = self.xp {
            instance.xp = xp;
        }
        if let Some(mut conditions) = self.conditions {
            conditions.sort();
            conditions.dedup();
            instance.conditions = conditions;
        }
        if let Some(notes) = self.session_notes {
            instance.session_notes = notes;
        }
        if let Some(added) = self.inventory_added {
            instance.inventory_added = added;
        }
        if let Some(removed) = self.inventory_removed {
            instance.inventory_removed = removed;
        }
    }
}

/// DM overwrite of both layers. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FullChanges {
    pub name: Option<String>,
    pub race: Option<String>,
    pub class: Option<String>,
    pub level: Option<i32>,
    pub background: Option<String>,
    pub attributes: Option<AttributeChanges>,
    pub abilities: Option<Vec<String>>,
    pub equipment: Option<Vec<String>>,
    pub hp: Option<i32>,
    pub ac: Option<i32>,
    pub spells: Option<SpellBook>,
    #[serde(flatten)]
    pub state: StateChanges,
}

impl FullChanges {
    pub fn validate(&self) -> Result<(), ApiError> {
        self.state.validate()?;
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ApiError::bad_request("name is required"));
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

    fn apply(self, instance: &mut CampaignCharacter) {
        let template = &mut instance.template;
        if let Some(name) = self.name {
            template.name = name.trim().to_string();
        }
        if let Some(race) = self.race {
            template.race = race;
        }
        if let Some(class) = self.class {
            template.class = class;
        }
        if let Some(level) = self.level {
            template.level = level;
        }
        if let Some(background) = self.background {
            template.background = background;
        }
        if let Some(changes) = self.attributes {
            changes.apply(&mut template.attributes);
        }
        if let Some(abilities) = self.abilities {
            template.abilities = abilities;
        }
        if let Some(equipment) = self.equipment {
            template.equipment = equipment;
        }
        if let Some(hp) = self.hp {
            template.hp = hp;
        }
        if let Some(ac) = self.ac {
            template.ac = ac;
        }
        if let Some(spells) = self.spells {
            template.spells = Some(spells);
        }
        self.state.apply(instance);
    }
}

/// A change to an instance, applied by the store under a row lock.
#[derive(Debug, Clone)]
pub enum InstanceEdit {
    State(StateChanges),
    Full(FullChanges),
    Sync(Template),
}

impl InstanceEdit {
    /// Checks that need no knowledge of the stored row.
    pub fn validate(&self) -> Result<(), ApiError> {
        match self {
            InstanceEdit::State(changes) => changes.validate(),
            InstanceEdit::Full(changes) => changes.validate(),
            InstanceEdit::Sync(template) => validate_sheet(
                &template.name,
                template.level,
                &template.attributes,
                template.hp,
                template.ac,
            ),
        }
    }

    /// Apply to `instance`. Current hit points never exceed the template maximum.
    pub fn apply(self, instance: &mut CampaignCharacter) {
        match self {
            InstanceEdit::State(changes) => changes.apply(instance),
            InstanceEdit::Full(changes) => changes.apply(instance),
            InstanceEdit::Sync(template) => {
                instance.template = template;
                instance.last_synced_at = Utc::now();
            }
        }
        instance.current_hp = instance.current_hp.min(instance.template.hp);
        instance.refresh_derived();
    }
}

/// Entry of the "attach a character" picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableCharacter {
    pub id: Id,
    pub kind: CharacterKind,
    pub name: String,
    pub level: i32,
    pub race: String,
    pub class: String,
}

impl From<&Character> for AvailableCharacter {
    fn from(character: &Character) -> Self {
        Self {
            id: character.id,
            kind: character.kind,
            name: character.name.clone(),
            level: character.level,
            race: character.race.clone(),
            class: character.class.clone(),
        }
    }
}
