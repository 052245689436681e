//! Row shapes as Postgres returns them, and their conversion into domain types.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::database::manager::DatabaseError;
use crate::models::{
    Attributes, AvailableCharacter, Campaign, CampaignCharacter, Character, CharacterKind, Condition, Encounter,
    Hoard, Homebrew, HomebrewDetails, Id, Member, Monster, SpellBook, Template, Treasure,
};

fn parse<T>(value: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(DatabaseError::InvalidData)
}

pub(super) const CHARACTER_COLUMNS: &str = "id, owner_id, name, description, level, race, class, background, \
     alignment, attributes, abilities, equipment, hp, ac, spells, created_at, updated_at";

#[derive(FromRow)]
pub(super) struct CharacterRow {
    id: Id,
    owner_id: Id,
    name: String,
    description: String,
    level: i32,
    race: String,
    class: String,
    background: String,
    alignment: String,
    attributes: Json<Attributes>,
    abilities: Json<Vec<String>>,
    equipment: Json<Vec<String>>,
    hp: i32,
    ac: i32,
    spells: Option<Json<SpellBook>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CharacterRow {
    pub(super) fn into_character(self, kind: CharacterKind) -> Character {
        let mut character = Character {
            id: self.id,
            kind,
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            level: self.level,
            race: self.race,
            class: self.class,
            background: self.background,
            alignment: self.alignment,
            attributes: self.attributes.0,
            modifiers: Attributes::default(),
            proficiency_bonus: 2,
            abilities: self.abilities.0,
            equipment: self.equipment.0,
            hp: self.hp,
            ac: self.ac,
            spells: self.spells.map(|s| s.0),
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        character.refresh_derived();
        character
    }
}

#[derive(FromRow)]
pub(super) struct EncounterRow {
    id: Id,
    owner_id: Id,
    theme: String,
    difficulty: String,
    total_xp: i32,
    player_level: i32,
    player_count: i32,
    monsters: Json<Vec<Monster>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EncounterRow> for Encounter {
    type Error = DatabaseError;

    fn try_from(row: EncounterRow) -> Result<Self, Self::Error> {
        Ok(Encounter {
            id: row.id,
            owner_id: row.owner_id,
            theme: row.theme,
            difficulty: parse(&row.difficulty)?,
            total_xp: row.total_xp,
            player_level: row.player_level,
            player_count: row.player_count,
            monsters: row.monsters.0,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
pub(super) struct TreasureRow {
    id: Id,
    owner_id: Id,
    name: String,
    level: i32,
    total_value: f64,
    hoards: Json<Vec<Hoard>>,
    created_at: DateTime<Utc>,
}

impl From<TreasureRow> for Treasure {
    fn from(row: TreasureRow) -> Self {
        Treasure {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            level: row.level,
            total_value: row.total_value,
            hoards: row.hoards.0,
            created_at: row.created_at,
        }
    }
}

/// Campaign projection with the DM's name and the seat count.
pub(super) const CAMPAIGN_SELECT: &str = "SELECT c.id, c.dm_id, c.name, c.description, c.status, \
     c.allow_homebrew, c.max_players, c.current_session, c.invite_code, c.created_at, c.updated_at, \
     u.username AS dm_name, \
     (SELECT COUNT(*) FROM campaign_memberships m WHERE m.campaign_id = c.id) AS player_count \
     FROM campaigns c JOIN users u ON u.id = c.dm_id";

#[derive(FromRow)]
pub(super) struct CampaignRow {
    id: Id,
    dm_id: Id,
    name: String,
    description: String,
    status: String,
    allow_homebrew: bool,
    max_players: i32,
    current_session: i32,
    invite_code: String,
    dm_name: String,
    player_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = DatabaseError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Campaign {
            id: row.id,
            dm_id: row.dm_id,
            name: row.name,
            description: row.description,
            status: parse(&row.status)?,
            allow_homebrew: row.allow_homebrew,
            max_players: row.max_players,
            current_session: row.current_session,
            invite_code: Some(row.invite_code),
            dm_name: row.dm_name,
            player_count: row.player_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(super) const MEMBER_SELECT: &str = "SELECT m.user_id, u.username, m.role, m.joined_at \
     FROM campaign_memberships m JOIN users u ON u.id = m.user_id";

#[derive(FromRow)]
pub(super) struct MemberRow {
    user_id: Id,
    username: String,
    role: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for Member {
    type Error = DatabaseError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Member {
            user_id: row.user_id,
            username: row.username,
            role: parse(&row.role)?,
            joined_at: row.joined_at,
        })
    }
}

pub(super) const INSTANCE_COLUMNS: &str = "id, campaign_id, owner_id, source_kind, source_character_id, name, \
     race, class, level, background, attributes, abilities, equipment, hp, ac, spells, current_hp, temp_hp, xp, \
     conditions, session_notes, inventory_added, inventory_removed, created_at, last_synced_at";

#[derive(FromRow)]
pub(super) struct InstanceRow {
    id: Id,
    campaign_id: Id,
    owner_id: Id,
    source_kind: String,
    source_character_id: Option<Id>,
    name: String,
    race: String,
    class: String,
    level: i32,
    background: String,
    attributes: Json<Attributes>,
    abilities: Json<Vec<String>>,
    equipment: Json<Vec<String>>,
    hp: i32,
    ac: i32,
    spells: Option<Json<SpellBook>>,
    current_hp: i32,
    temp_hp: i32,
    xp: i32,
    conditions: Json<Vec<Condition>>,
    session_notes: String,
    inventory_added: Json<Vec<String>>,
    inventory_removed: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    last_synced_at: DateTime<Utc>,
}

impl TryFrom<InstanceRow> for CampaignCharacter {
    type Error = DatabaseError;

    fn try_from(row: InstanceRow) -> Result<Self, Self::Error> {
        let mut instance = CampaignCharacter {
            id: row.id,
            campaign_id: row.campaign_id,
            owner_id: row.owner_id,
            source_kind: parse(&row.source_kind)?,
            source_character_id: row.source_character_id,
            detached: false,
            template: Template {
                name: row.name,
                race: row.race,
                class: row.class,
                level: row.level,
                background: row.background,
                attributes: row.attributes.0,
                abilities: row.abilities.0,
                equipment: row.equipment.0,
                hp: row.hp,
                ac: row.ac,
                spells: row.spells.map(|s| s.0),
            },
            modifiers: Attributes::default(),
            current_hp: row.current_hp,
            temp_hp: row.temp_hp,
            xp: row.xp,
            conditions: row.conditions.0,
            session_notes: row.session_notes,
            inventory_added: row.inventory_added.0,
            inventory_removed: row.inventory_removed.0,
            created_at: row.created_at,
            last_synced_at: row.last_synced_at,
        };
        instance.refresh_derived();
        Ok(instance)
    }
}

#[derive(FromRow)]
pub(super) struct AvailableRow {
    id: Id,
    kind: String,
    name: String,
    level: i32,
    race: String,
    class: String,
}

impl TryFrom<AvailableRow> for AvailableCharacter {
    type Error = DatabaseError;

    fn try_from(row: AvailableRow) -> Result<Self, Self::Error> {
        Ok(AvailableCharacter {
            id: row.id,
            kind: parse(&row.kind)?,
            name: row.name,
            level: row.level,
            race: row.race,
            class: row.class,
        })
    }
}

/// Homebrew projection with the author's name and rating aggregates.
pub(super) const HOMEBREW_SELECT: &str = "SELECT h.id, h.kind, h.owner_id, u.username AS owner_username, \
     h.name, h.description, h.is_public, h.details, \
     (SELECT COALESCE(AVG(r.rating)::float8, 0) FROM homebrew_ratings r WHERE r.homebrew_id = h.id) AS average_rating, \
     (SELECT COUNT(*) FROM homebrew_ratings r WHERE r.homebrew_id = h.id) AS rating_count, \
     (SELECT COUNT(*) FROM homebrew_favorites f WHERE f.homebrew_id = h.id) AS favorites_count, \
     h.created_at, h.updated_at \
     FROM homebrew h JOIN users u ON u.id = h.owner_id";

#[derive(FromRow)]
pub(super) struct HomebrewRow {
    id: Id,
    kind: String,
    owner_id: Id,
    owner_username: String,
    name: String,
    description: String,
    is_public: bool,
    details: Json<Value>,
    average_rating: f64,
    rating_count: i64,
    favorites_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HomebrewRow> for Homebrew {
    type Error = DatabaseError;

    fn try_from(row: HomebrewRow) -> Result<Self, Self::Error> {
        let kind = parse(&row.kind)?;
        let details = HomebrewDetails::from_value(kind, row.details.0)
            .map_err(|e| DatabaseError::InvalidData(format!("homebrew {} details: {}", row.id, e)))?;
        Ok(Homebrew {
            id: row.id,
            kind,
            owner_id: row.owner_id,
            owner_username: row.owner_username,
            name: row.name,
            description: row.description,
            is_public: row.is_public,
            details,
            average_rating: row.average_rating,
            rating_count: row.rating_count,
            favorites_count: row.favorites_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
