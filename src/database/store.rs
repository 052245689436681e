//! Persistence seams. Handlers and services only see these traits; Postgres
//! backs them in production and an in-memory store backs the router tests.

use async_trait::async_trait;

use super::manager::DatabaseError;
use crate::auth::Scope;
use crate::models::{
    AvailableCharacter, Campaign, CampaignChanges, CampaignCharacter, CampaignDraft, Character, CharacterChanges,
    CharacterDraft, CharacterKind, Encounter, EncounterDraft, Homebrew, HomebrewContent, HomebrewKind, Id, InstanceEdit,
    JoinOutcome, Member, NewUser, Page, Treasure, TreasureDraft, User, UserChanges,
};

/// A page of rows plus the total number of matching rows.
pub type Listing<T> = (Vec<T>, i64);

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn user_by_id(&self, id: Id) -> Result<Option<User>, DatabaseError>;
    /// Case-insensitive lookup.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn list_users(&self, page: Page) -> Result<Listing<User>, DatabaseError>;
    async fn update_user(&self, id: Id, changes: UserChanges) -> Result<Option<User>, DatabaseError>;
    /// Removes the account and, through cascades, everything it owns.
    async fn delete_user(&self, id: Id) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait CharacterStore: Send + Sync {
    async fn insert_character(&self, kind: CharacterKind, owner_id: Id, draft: CharacterDraft)
        -> Result<Character, DatabaseError>;
    async fn character(&self, kind: CharacterKind, id: Id, scope: Scope) -> Result<Option<Character>, DatabaseError>;
    async fn list_characters(&self, kind: CharacterKind, owner_id: Id, page: Page)
        -> Result<Listing<Character>, DatabaseError>;
    /// `Ok(None)` when the row is missing or outside `scope`.
    async fn update_character(&self, kind: CharacterKind, id: Id, scope: Scope, changes: CharacterChanges)
        -> Result<Option<Character>, DatabaseError>;
    /// Deletes the character and detaches its campaign instances in one transaction.
    async fn delete_character(&self, kind: CharacterKind, id: Id, scope: Scope) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait EncounterStore: Send + Sync {
    async fn insert_encounter(&self, owner_id: Id, draft: EncounterDraft) -> Result<Encounter, DatabaseError>;
    async fn encounter(&self, id: Id, scope: Scope) -> Result<Option<Encounter>, DatabaseError>;
    async fn list_encounters(&self, owner_id: Id, page: Page) -> Result<Listing<Encounter>, DatabaseError>;
    async fn delete_encounter(&self, id: Id, scope: Scope) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait TreasureStore: Send + Sync {
    async fn insert_treasure(&self, owner_id: Id, draft: TreasureDraft) -> Result<Treasure, DatabaseError>;
    async fn treasure(&self, id: Id, scope: Scope) -> Result<Option<Treasure>, DatabaseError>;
    async fn list_treasures(&self, owner_id: Id, page: Page) -> Result<Listing<Treasure>, DatabaseError>;
    async fn delete_treasure(&self, id: Id, scope: Scope) -> Result<bool, DatabaseError>;
}

/// Homebrew is readable by everyone once public; only the author (or an
/// admin, through `Scope::Any`) writes it.
#[async_trait]
pub trait HomebrewStore: Send + Sync {
    async fn insert_homebrew(&self, owner_id: Id, content: HomebrewContent) -> Result<Homebrew, DatabaseError>;
    /// Public entries, plus private ones `viewer` permits.
    async fn homebrew(&self, kind: HomebrewKind, id: Id, viewer: Scope) -> Result<Option<Homebrew>, DatabaseError>;
    /// Public entries and the viewer's own, by id.
    async fn list_homebrew(&self, kind: HomebrewKind, viewer_id: Id, page: Page)
        -> Result<Listing<Homebrew>, DatabaseError>;
    async fn update_homebrew(&self, kind: HomebrewKind, id: Id, scope: Scope, content: HomebrewContent)
        -> Result<Option<Homebrew>, DatabaseError>;
    /// Takes the entry's favorites and ratings with it.
    async fn delete_homebrew(&self, kind: HomebrewKind, id: Id, scope: Scope) -> Result<bool, DatabaseError>;
    /// Idempotent in both directions.
    async fn set_favorite(&self, id: Id, user_id: Id, favorite: bool) -> Result<(), DatabaseError>;
    /// The user's favorites of `kind` that they can still see, most recently favorited first.
    async fn favorite_homebrew(&self, kind: HomebrewKind, user_id: Id, page: Page)
        -> Result<Listing<Homebrew>, DatabaseError>;
    /// Upserts the user's rating, or removes it with `None`.
    async fn set_rating(&self, id: Id, user_id: Id, rating: Option<i32>) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Inserts the campaign and the DM membership atomically.
    /// A taken invite code fails with `DatabaseError::Conflict`.
    async fn create_campaign(&self, dm_id: Id, draft: CampaignDraft, invite_code: &str)
        -> Result<Campaign, DatabaseError>;
    async fn campaign(&self, id: Id) -> Result<Option<Campaign>, DatabaseError>;
    /// Campaigns where `user_id` holds a membership (the DM always does).
    async fn campaigns_for_member(&self, user_id: Id, page: Page) -> Result<Listing<Campaign>, DatabaseError>;
    async fn membership(&self, campaign_id: Id, user_id: Id) -> Result<Option<Member>, DatabaseError>;
    async fn members(&self, campaign_id: Id) -> Result<Vec<Member>, DatabaseError>;
    async fn update_campaign(&self, id: Id, changes: CampaignChanges) -> Result<Option<Campaign>, DatabaseError>;
    /// Cascades to memberships and instances.
    async fn delete_campaign(&self, id: Id) -> Result<bool, DatabaseError>;
    /// Swaps the invite code under a row lock; the old code stops resolving at commit.
    async fn replace_invite_code(&self, id: Id, invite_code: &str) -> Result<Option<Campaign>, DatabaseError>;
    /// Resolves the code and adds a player membership, all under the campaign row lock.
    async fn join_campaign(&self, invite_code: &str, user_id: Id) -> Result<JoinOutcome, DatabaseError>;
    /// Removes the membership and the user's instances in the campaign.
    async fn leave_campaign(&self, campaign_id: Id, user_id: Id) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait CampaignCharacterStore: Send + Sync {
    async fn available_characters(&self, campaign_id: Id, owner_id: Id)
        -> Result<Vec<AvailableCharacter>, DatabaseError>;
    /// A second instance of the same source fails with `DatabaseError::Conflict`.
    async fn insert_instance(&self, instance: CampaignCharacter) -> Result<CampaignCharacter, DatabaseError>;
    async fn instances(&self, campaign_id: Id) -> Result<Vec<CampaignCharacter>, DatabaseError>;
    async fn instance(&self, campaign_id: Id, id: Id) -> Result<Option<CampaignCharacter>, DatabaseError>;
    /// Applies `edit` under a row lock.
    async fn edit_instance(&self, campaign_id: Id, id: Id, edit: InstanceEdit)
        -> Result<Option<CampaignCharacter>, DatabaseError>;
    async fn delete_instance(&self, campaign_id: Id, id: Id) -> Result<bool, DatabaseError>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait Store:
    UserStore
    + CharacterStore
    + EncounterStore
    + TreasureStore
    + HomebrewStore
    + CampaignStore
    + CampaignCharacterStore
{
    async fn ping(&self) -> Result<(), DatabaseError>;
}
