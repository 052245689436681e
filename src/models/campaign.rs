use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;
use crate::error::ApiError;

pub const DEFAULT_MAX_PLAYERS: i32 = 4;
pub const MAX_PLAYERS_LIMIT: i32 = 10;

/// Campaign lifecycle. Any status may follow any other; `finished` is terminal
/// by convention and closes the campaign to new players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Planning,
    Active,
    Paused,
    Finished,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Planning => "planning",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(CampaignStatus::Planning),
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "finished" => Ok(CampaignStatus::Finished),
            other => Err(format!("unknown campaign status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    Dm,
    Player,
}

impl MembershipRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipRole::Dm => "dm",
            MembershipRole::Player => "player",
        }
    }
}

impl FromStr for MembershipRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dm" => Ok(MembershipRole::Dm),
            "player" => Ok(MembershipRole::Player),
            other => Err(format!("unknown membership role '{}'", other)),
        }
    }
}

/// Campaign as read back from the store, with the projected `dm_name` and `player_count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub id: Id,
    pub dm_id: Id,
    pub name: String,
    pub description: String,
    pub status: CampaignStatus,
    pub allow_homebrew: bool,
    pub max_players: i32,
    pub current_session: i32,
    /// Only present when the viewer is the DM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    pub dm_name: String,
    /// Seats taken at the table, the DM's included.
    pub player_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn without_invite_code(mut self) -> Self {
        self.invite_code = None;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub max_players: Option<i32>,
    #[serde(default)]
    pub allow_homebrew: bool,
}

impl CampaignDraft {
    pub fn max_players(&self) -> i32 {
        self.max_players.unwrap_or(DEFAULT_MAX_PLAYERS)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_max_players(self.max_players())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<CampaignStatus>,
    pub allow_homebrew: Option<bool>,
    pub max_players: Option<i32>,
    pub current_session: Option<i32>,
}

impl CampaignChanges {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(max_players) = self.max_players {
            validate_max_players(max_players)?;
        }
        if self.current_session.is_some_and(|s| s < 0) {
            return Err(ApiError::bad_request("current_session must not be negative"));
        }
        Ok(())
    }

    pub fn apply(self, campaign: &mut Campaign) {
        if let Some(name) = self.name {
            campaign.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            campaign.description = description;
        }
        if let Some(status) = self.status {
            campaign.status = status;
        }
        if let Some(allow_homebrew) = self.allow_homebrew {
            campaign.allow_homebrew = allow_homebrew;
        }
        if let Some(max_players) = self.max_players {
            campaign.max_players = max_players;
        }
        if let Some(current_session) = self.current_session {
            campaign.current_session = current_session;
        }
        campaign.updated_at = Utc::now();
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    if name.chars().count() > 120 {
        return Err(ApiError::bad_request("name must be at most 120 characters"));
    }
    Ok(())
}

fn validate_max_players(max_players: i32) -> Result<(), ApiError> {
    if !(1..=MAX_PLAYERS_LIMIT).contains(&max_players) {
        return Err(ApiError::bad_request(format!(
            "max_players must be between 1 and {}",
            MAX_PLAYERS_LIMIT
        )));
    }
    Ok(())
}

/// A seat at the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub user_id: Id,
    pub username: String,
    pub role: MembershipRole,
    pub joined_at: DateTime<Utc>,
}

/// What happened when a user presented an invite code.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined(Campaign),
    UnknownCode,
    AlreadyMember,
    Finished,
    Full,
}
