//! In-memory `Store` with the same observable semantics as the Postgres one:
//! unique constraints, ownership scopes, cascades and row ordering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::Scope;
use crate::database::{
    constraints, CampaignCharacterStore, CampaignStore, CharacterStore, DatabaseError, EncounterStore,
    HomebrewStore, Listing, Store, TreasureStore, UserStore,
};
use crate::models::{
    AvailableCharacter, Campaign, CampaignChanges, CampaignCharacter, CampaignDraft, CampaignStatus, Character,
    CharacterChanges, CharacterDraft, CharacterKind, Encounter, EncounterDraft, Homebrew, HomebrewContent,
    HomebrewKind, Id, InstanceEdit, JoinOutcome, Member, MembershipRole, NewUser, Page, Treasure, TreasureDraft,
    User, UserChanges,
};

#[derive(Debug, Clone)]
struct CampaignRecord {
    campaign: Campaign,
    invite_code: String,
}

#[derive(Debug, Clone)]
struct Membership {
    campaign_id: Id,
    user_id: Id,
    role: MembershipRole,
    joined_at: DateTime<Utc>,
}

/// `seq` orders favorites the way `created_at DESC` does in SQL.
#[derive(Debug, Clone)]
struct Favorite {
    user_id: Id,
    homebrew_id: Id,
    seq: Id,
}

#[derive(Debug, Clone)]
struct Rating {
    user_id: Id,
    homebrew_id: Id,
    rating: i32,
}

#[derive(Default)]
struct Tables {
    next_id: Id,
    users: Vec<User>,
    characters: Vec<Character>,
    encounters: Vec<Encounter>,
    treasures: Vec<Treasure>,
    homebrew: Vec<Homebrew>,
    favorites: Vec<Favorite>,
    ratings: Vec<Rating>,
    campaigns: Vec<CampaignRecord>,
    memberships: Vec<Membership>,
    instances: Vec<CampaignCharacter>,
}

impl Tables {
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn username(&self, id: Id) -> String {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn project(&self, record: &CampaignRecord) -> Campaign {
        let mut campaign = record.campaign.clone();
        campaign.invite_code = Some(record.invite_code.clone());
        campaign.dm_name = self.username(campaign.dm_id);
        campaign.player_count = self.memberships.iter().filter(|m| m.campaign_id == campaign.id).count() as i64;
        campaign
    }

    fn member(&self, m: &Membership) -> Member {
        Member {
            user_id: m.user_id,
            username: self.username(m.user_id),
            role: m.role,
            joined_at: m.joined_at,
        }
    }

    /// Fills in the author's name and the rating aggregates.
    fn project_homebrew(&self, homebrew: &Homebrew) -> Homebrew {
        let mut homebrew = homebrew.clone();
        homebrew.owner_username = self.username(homebrew.owner_id);
        let ratings: Vec<i32> = self
            .ratings
            .iter()
            .filter(|r| r.homebrew_id == homebrew.id)
            .map(|r| r.rating)
            .collect();
        homebrew.rating_count = ratings.len() as i64;
        homebrew.average_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<i32>() as f64 / ratings.len() as f64
        };
        homebrew.favorites_count = self.favorites.iter().filter(|f| f.homebrew_id == homebrew.id).count() as i64;
        homebrew
    }

    fn drop_homebrew_links(&mut self, homebrew_ids: &[Id]) {
        self.favorites.retain(|f| !homebrew_ids.contains(&f.homebrew_id));
        self.ratings.retain(|r| !homebrew_ids.contains(&r.homebrew_id));
    }

    fn code_taken(&self, code: &str, except: Option<Id>) -> bool {
        self.campaigns
            .iter()
            .any(|r| r.invite_code == code && Some(r.campaign.id) != except)
    }
}

fn window<T: Clone>(rows: Vec<T>, page: Page) -> Listing<T> {
    let total = rows.len() as i64;
    (page.apply(&rows), total)
}

fn conflict(constraint: &str) -> DatabaseError {
    DatabaseError::Conflict(constraint.to_string())
}

/// Test double for the Postgres store. One lock guards every table, which
/// makes each call atomic the way the transactional SQL paths are.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes content inserts fail, to exercise the "generated but not saved" path.
    pub fn fail_inserts(&self, failing: bool) {
        self.failing_inserts.store(failing, Ordering::SeqCst);
    }

    pub fn promote_to_admin(&self, user_id: Id) {
        let mut tables = self.lock();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) {
            user.admin = true;
        }
    }

    pub fn invite_code_of(&self, campaign_id: Id) -> Option<String> {
        self.lock()
            .campaigns
            .iter()
            .find(|r| r.campaign.id == campaign_id)
            .map(|r| r.invite_code.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_insert(&self) -> Result<(), DatabaseError> {
        if self.failing_inserts.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(conflict(constraints::USERS_EMAIL));
        }
        if tables.users.iter().any(|u| u.username.eq_ignore_ascii_case(&user.username)) {
            return Err(conflict(constraints::USERS_USERNAME));
        }
        let now = Utc::now();
        let user = User {
            id: tables.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            admin: false,
            plan: 0,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Id) -> Result<Option<User>, DatabaseError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.lock().users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn list_users(&self, page: Page) -> Result<Listing<User>, DatabaseError> {
        Ok(window(self.lock().users.clone(), page))
    }

    async fn update_user(&self, id: Id, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.lock();
        let others = |u: &&User| u.id != id;
        if let Some(email) = &changes.email {
            if tables.users.iter().filter(others).any(|u| u.email.eq_ignore_ascii_case(email)) {
                return Err(conflict(constraints::USERS_EMAIL));
            }
        }
        if let Some(username) = &changes.username {
            if tables.users.iter().filter(others).any(|u| u.username.eq_ignore_ascii_case(username)) {
                return Err(conflict(constraints::USERS_USERNAME));
            }
        }
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            changes.apply(user);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Id) -> Result<bool, DatabaseError> {
        let mut tables = self.lock();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        let owned: Vec<Id> = tables
            .campaigns
            .iter()
            .filter(|r| r.campaign.dm_id == id)
            .map(|r| r.campaign.id)
            .collect();
        tables.campaigns.retain(|r| r.campaign.dm_id != id);
        tables
            .memberships
            .retain(|m| m.user_id != id && !owned.contains(&m.campaign_id));
        tables
            .instances
            .retain(|i| i.owner_id != id && !owned.contains(&i.campaign_id));
        tables.characters.retain(|c| c.owner_id != id);
        tables.encounters.retain(|e| e.owner_id != id);
        tables.treasures.retain(|t| t.owner_id != id);

        let authored: Vec<Id> = tables.homebrew.iter().filter(|h| h.owner_id == id).map(|h| h.id).collect();
        tables.homebrew.retain(|h| h.owner_id != id);
        tables.drop_homebrew_links(&authored);
        tables.favorites.retain(|f| f.user_id != id);
        tables.ratings.retain(|r| r.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn insert_character(
        &self,
        kind: CharacterKind,
        owner_id: Id,
        draft: CharacterDraft,
    ) -> Result<Character, DatabaseError> {
        self.check_insert()?;
        let mut tables = self.lock();
        let mut character = Character::from_draft(kind, owner_id, draft);
        character.id = tables.next_id();
        tables.characters.push(character.clone());
        Ok(character)
    }

    async fn character(&self, kind: CharacterKind, id: Id, scope: Scope) -> Result<Option<Character>, DatabaseError> {
        Ok(self
            .lock()
            .characters
            .iter()
            .find(|c| c.kind == kind && c.id == id && scope.permits(c.owner_id))
            .cloned())
    }

    async fn list_characters(
        &self,
        kind: CharacterKind,
        owner_id: Id,
        page: Page,
    ) -> Result<Listing<Character>, DatabaseError> {
        let rows = self
            .lock()
            .characters
            .iter()
            .filter(|c| c.kind == kind && c.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(window(rows, page))
    }

    async fn update_character(
        &self,
        kind: CharacterKind,
        id: Id,
        scope: Scope,
        changes: CharacterChanges,
    ) -> Result<Option<Character>, DatabaseError> {
        let mut tables = self.lock();
        Ok(tables
            .characters
            .iter_mut()
            .find(|c| c.kind == kind && c.id == id && scope.permits(c.owner_id))
            .map(|character| {
                changes.apply(character);
                character.clone()
            }))
    }

    async fn delete_character(&self, kind: CharacterKind, id: Id, scope: Scope) -> Result<bool, DatabaseError> {
        let mut tables = self.lock();
        let before = tables.characters.len();
        tables
            .characters
            .retain(|c| !(c.kind == kind && c.id == id && scope.permits(c.owner_id)));
        if tables.characters.len() == before {
            return Ok(false);
        }
        for instance in tables
            .instances
            .iter_mut()
            .filter(|i| i.source_kind == kind && i.source_character_id == Some(id))
        {
            instance.detach();
        }
        Ok(true)
    }
}

#[async_trait]
impl EncounterStore for MemoryStore {
    async fn insert_encounter(&self, owner_id: Id, draft: EncounterDraft) -> Result<Encounter, DatabaseError> {
        self.check_insert()?;
        let mut tables = self.lock();
        let mut encounter = Encounter::from_draft(owner_id, draft);
        encounter.id = tables.next_id();
        tables.encounters.push(encounter.clone());
        Ok(encounter)
    }

    async fn encounter(&self, id: Id, scope: Scope) -> Result<Option<Encounter>, DatabaseError> {
        Ok(self
            .lock()
            .encounters
            .iter()
            .find(|e| e.id == id && scope.permits(e.owner_id))
            .cloned())
    }

    async fn list_encounters(&self, owner_id: Id, page: Page) -> Result<Listing<Encounter>, DatabaseError> {
        let rows = self
            .lock()
            .encounters
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(window(rows, page))
    }

    async fn delete_encounter(&self, id: Id, scope: Scope) -> Result<bool, DatabaseError> {
        let mut tables = self.lock();
        let before = tables.encounters.len();
        tables.encounters.retain(|e| !(e.id == id && scope.permits(e.owner_id)));
        Ok(tables.encounters.len() != before)
    }
}

#[async_trait]
impl TreasureStore for MemoryStore {
    async fn insert_treasure(&self, owner_id: Id, draft: TreasureDraft) -> Result<Treasure, DatabaseError> {
        self.check_insert()?;
        let mut tables = self.lock();
        let mut treasure = Treasure::from_draft(owner_id, draft);
        treasure.id = tables.next_id();
        tables.treasures.push(treasure.clone());
        Ok(treasure)
    }

    async fn treasure(&self, id: Id, scope: Scope) -> Result<Option<Treasure>, DatabaseError> {
        Ok(self
            .lock()
            .treasures
            .iter()
            .find(|t| t.id == id && scope.permits(t.owner_id))
            .cloned())
    }

    async fn list_treasures(&self, owner_id: Id, page: Page) -> Result<Listing<Treasure>, DatabaseError> {
        let rows = self
            .lock()
            .treasures
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(window(rows, page))
    }

    async fn delete_treasure(&self, id: Id, scope: Scope) -> Result<bool, DatabaseError> {
        let mut tables = self.lock();
        let before = tables.treasures.len();
        tables.treasures.retain(|t| !(t.id == id && scope.permits(t.owner_id)));
        Ok(tables.treasures.len() != before)
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn create_campaign(
        &self,
        dm_id: Id,
        draft: CampaignDraft,
        invite_code: &str,
    ) -> Result<Campaign, DatabaseError> {
        let mut tables = self.lock();
        if tables.code_taken(invite_code, None) {
            return Err(conflict(constraints::CAMPAIGN_INVITE_CODE));
        }
        let now = Utc::now();
        let id = tables.next_id();
        let record = CampaignRecord {
            campaign: Campaign {
                id,
                dm_id,
                name: draft.name.trim().to_string(),
                max_players: draft.max_players(),
                description: draft.description,
                status: CampaignStatus::Planning,
                allow_homebrew: draft.allow_homebrew,
                current_session: 0,
                invite_code: None,
                dm_name: String::new(),
                player_count: 0,
                created_at: now,
                updated_at: now,
            },
            invite_code: invite_code.to_string(),
        };
        tables.campaigns.push(record.clone());
        tables.memberships.push(Membership {
            campaign_id: id,
            user_id: dm_id,
            role: MembershipRole::Dm,
            joined_at: now,
        });
        Ok(tables.project(&record))
    }

    async fn campaign(&self, id: Id) -> Result<Option<Campaign>, DatabaseError> {
        let tables = self.lock();
        Ok(tables
            .campaigns
            .iter()
            .find(|r| r.campaign.id == id)
            .map(|r| tables.project(r)))
    }

    async fn campaigns_for_member(&self, user_id: Id, page: Page) -> Result<Listing<Campaign>, DatabaseError> {
        let tables = self.lock();
        let mut rows: Vec<Campaign> = tables
            .campaigns
            .iter()
            .filter(|r| {
                tables
                    .memberships
                    .iter()
                    .any(|m| m.campaign_id == r.campaign.id && m.user_id == user_id)
            })
            .map(|r| tables.project(r))
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(window(rows, page))
    }

    async fn membership(&self, campaign_id: Id, user_id: Id) -> Result<Option<Member>, DatabaseError> {
        let tables = self.lock();
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.campaign_id == campaign_id && m.user_id == user_id)
            .map(|m| tables.member(m)))
    }

    async fn members(&self, campaign_id: Id) -> Result<Vec<Member>, DatabaseError> {
        let tables = self.lock();
        let mut members: Vec<&Membership> = tables
            .memberships
            .iter()
            .filter(|m| m.campaign_id == campaign_id)
            .collect();
        members.sort_by_key(|m| (m.role != MembershipRole::Dm, m.joined_at));
        Ok(members.into_iter().map(|m| tables.member(m)).collect())
    }

    async fn update_campaign(&self, id: Id, changes: CampaignChanges) -> Result<Option<Campaign>, DatabaseError> {
        let mut tables = self.lock();
        let Some(record) = tables.campaigns.iter_mut().find(|r| r.campaign.id == id) else {
            return Ok(None);
        };
        changes.apply(&mut record.campaign);
        let record = record.clone();
        Ok(Some(tables.project(&record)))
    }

    async fn delete_campaign(&self, id: Id) -> Result<bool, DatabaseError> {
        let mut tables = self.lock();
        let before = tables.campaigns.len();
        tables.campaigns.retain(|r| r.campaign.id != id);
        tables.memberships.retain(|m| m.campaign_id != id);
        tables.instances.retain(|i| i.campaign_id != id);
        Ok(tables.campaigns.len() != before)
    }

    async fn replace_invite_code(&self, id: Id, invite_code: &str) -> Result<Option<Campaign>, DatabaseError> {
        let mut tables = self.lock();
        if tables.code_taken(invite_code, Some(id)) {
            return Err(conflict(constraints::CAMPAIGN_INVITE_CODE));
        }
        let Some(record) = tables.campaigns.iter_mut().find(|r| r.campaign.id == id) else {
            return Ok(None);
        };
        record.invite_code = invite_code.to_string();
        record.campaign.updated_at = Utc::now();
        let record = record.clone();
        Ok(Some(tables.project(&record)))
    }

    async fn join_campaign(&self, invite_code: &str, user_id: Id) -> Result<JoinOutcome, DatabaseError> {
        let mut tables = self.lock();
        let Some(record) = tables.campaigns.iter().find(|r| r.invite_code == invite_code).cloned() else {
            return Ok(JoinOutcome::UnknownCode);
        };
        let id = record.campaign.id;
        if tables.memberships.iter().any(|m| m.campaign_id == id && m.user_id == user_id) {
            return Ok(JoinOutcome::AlreadyMember);
        }
        if record.campaign.status == CampaignStatus::Finished {
            return Ok(JoinOutcome::Finished);
        }
        let players = tables
            .memberships
            .iter()
            .filter(|m| m.campaign_id == id && m.role == MembershipRole::Player)
            .count() as i32;
        if players >= record.campaign.max_players {
            return Ok(JoinOutcome::Full);
        }
        tables.memberships.push(Membership {
            campaign_id: id,
            user_id,
            role: MembershipRole::Player,
            joined_at: Utc::now(),
        });
        Ok(JoinOutcome::Joined(tables.project(&record)))
    }

    async fn leave_campaign(&self, campaign_id: Id, user_id: Id) -> Result<bool, DatabaseError> {
        let mut tables = self.lock();
        let before = tables.memberships.len();
        tables.memberships.retain(|m| {
            !(m.campaign_id == campaign_id && m.user_id == user_id && m.role == MembershipRole::Player)
        });
        if tables.memberships.len() == before {
            return Ok(false);
        }
        tables
            .instances
            .retain(|i| !(i.campaign_id == campaign_id && i.owner_id == user_id));
        Ok(true)
    }
}

#[async_trait]
impl CampaignCharacterStore for MemoryStore {
    async fn available_characters(
        &self,
        campaign_id: Id,
        owner_id: Id,
    ) -> Result<Vec<AvailableCharacter>, DatabaseError> {
        let tables = self.lock();
        let mut rows: Vec<AvailableCharacter> = tables
            .characters
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .filter(|c| {
                !tables.instances.iter().any(|i| {
                    i.campaign_id == campaign_id && i.source_kind == c.kind && i.source_character_id == Some(c.id)
                })
            })
            .map(AvailableCharacter::from)
            .collect();
        rows.sort_by_key(|c| (c.kind, c.id));
        Ok(rows)
    }

    async fn insert_instance(&self, mut instance: CampaignCharacter) -> Result<CampaignCharacter, DatabaseError> {
        let mut tables = self.lock();
        let duplicate = tables.instances.iter().any(|i| {
            i.campaign_id == instance.campaign_id
                && i.source_kind == instance.source_kind
                && i.source_character_id.is_some()
                && i.source_character_id == instance.source_character_id
        });
        if duplicate {
            return Err(conflict(constraints::CAMPAIGN_CHARACTER_SOURCE));
        }
        instance.id = tables.next_id();
        tables.instances.push(instance.clone());
        Ok(instance)
    }

    async fn instances(&self, campaign_id: Id) -> Result<Vec<CampaignCharacter>, DatabaseError> {
        Ok(self
            .lock()
            .instances
            .iter()
            .filter(|i| i.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn instance(&self, campaign_id: Id, id: Id) -> Result<Option<CampaignCharacter>, DatabaseError> {
        Ok(self
            .lock()
            .instances
            .iter()
            .find(|i| i.campaign_id == campaign_id && i.id == id)
            .cloned())
    }

    async fn edit_instance(
        &self,
        campaign_id: Id,
        id: Id,
        edit: InstanceEdit,
    ) -> Result<Option<CampaignCharacter>, DatabaseError> {
        let mut tables = self.lock();
        Ok(tables
            .instances
            .iter_mut()
            .find(|i| i.campaign_id == campaign_id && i.id == id)
            .map(|instance| {
                edit.apply(instance);
                instance.clone()
            }))
    }

    async fn delete_instance(&self, campaign_id: Id, id: Id) -> Result<bool, DatabaseError> {
        let mut tables = self.lock();
        let before = tables.instances.len();
        tables.instances.retain(|i| !(i.campaign_id == campaign_id && i.id == id));
        Ok(tables.instances.len() != before)
    }
}

fn visible(homebrew: &Homebrew, kind: HomebrewKind, viewer: Scope) -> bool {
    homebrew.kind == kind && (homebrew.is_public || viewer.permits(homebrew.owner_id))
}

#[async_trait]
impl HomebrewStore for MemoryStore {
    async fn insert_homebrew(&self, owner_id: Id, content: HomebrewContent) -> Result<Homebrew, DatabaseError> {
        self.check_insert()?;
        let mut tables = self.lock();
        let now = Utc::now();
        let homebrew = Homebrew {
            id: tables.next_id(),
            kind: content.details.kind(),
            owner_id,
            owner_username: String::new(),
            name: content.name,
            description: content.description,
            is_public: content.is_public,
            details: content.details,
            average_rating: 0.0,
            rating_count: 0,
            favorites_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.homebrew.push(homebrew.clone());
        Ok(tables.project_homebrew(&homebrew))
    }

    async fn homebrew(&self, kind: HomebrewKind, id: Id, viewer: Scope) -> Result<Option<Homebrew>, DatabaseError> {
        let tables = self.lock();
        Ok(tables
            .homebrew
            .iter()
            .find(|h| h.id == id && visible(h, kind, viewer))
            .map(|h| tables.project_homebrew(h)))
    }

    async fn list_homebrew(
        &self,
        kind: HomebrewKind,
        viewer_id: Id,
        page: Page,
    ) -> Result<Listing<Homebrew>, DatabaseError> {
        let tables = self.lock();
        let rows = tables
            .homebrew
            .iter()
            .filter(|h| visible(h, kind, Scope::Owner(viewer_id)))
            .map(|h| tables.project_homebrew(h))
            .collect();
        Ok(window(rows, page))
    }

    async fn update_homebrew(
        &self,
        kind: HomebrewKind,
        id: Id,
        scope: Scope,
        content: HomebrewContent,
    ) -> Result<Option<Homebrew>, DatabaseError> {
        let mut tables = self.lock();
        let Some(homebrew) = tables
            .homebrew
            .iter_mut()
            .find(|h| h.kind == kind && h.id == id && scope.permits(h.owner_id))
        else {
            return Ok(None);
        };
        homebrew.name = content.name;
        homebrew.description = content.description;
        homebrew.is_public = content.is_public;
        homebrew.details = content.details;
        homebrew.updated_at = Utc::now();
        let homebrew = homebrew.clone();
        Ok(Some(tables.project_homebrew(&homebrew)))
    }

    async fn delete_homebrew(&self, kind: HomebrewKind, id: Id, scope: Scope) -> Result<bool, DatabaseError> {
        let mut tables = self.lock();
        let before = tables.homebrew.len();
        tables
            .homebrew
            .retain(|h| !(h.kind == kind && h.id == id && scope.permits(h.owner_id)));
        if tables.homebrew.len() == before {
            return Ok(false);
        }
        tables.drop_homebrew_links(&[id]);
        Ok(true)
    }

    async fn set_favorite(&self, id: Id, user_id: Id, favorite: bool) -> Result<(), DatabaseError> {
        let mut tables = self.lock();
        let exists = tables.favorites.iter().any(|f| f.homebrew_id == id && f.user_id == user_id);
        if favorite && !exists {
            let seq = tables.next_id();
            tables.favorites.push(Favorite { user_id, homebrew_id: id, seq });
        } else if !favorite {
            tables.favorites.retain(|f| !(f.homebrew_id == id && f.user_id == user_id));
        }
        Ok(())
    }

    async fn favorite_homebrew(
        &self,
        kind: HomebrewKind,
        user_id: Id,
        page: Page,
    ) -> Result<Listing<Homebrew>, DatabaseError> {
        let tables = self.lock();
        let mut favorites: Vec<&Favorite> = tables.favorites.iter().filter(|f| f.user_id == user_id).collect();
        favorites.sort_by_key(|f| std::cmp::Reverse(f.seq));
        let rows = favorites
            .into_iter()
            .filter_map(|f| tables.homebrew.iter().find(|h| h.id == f.homebrew_id))
            .filter(|h| visible(h, kind, Scope::Owner(user_id)))
            .map(|h| tables.project_homebrew(h))
            .collect();
        Ok(window(rows, page))
    }

    async fn set_rating(&self, id: Id, user_id: Id, rating: Option<i32>) -> Result<(), DatabaseError> {
        let mut tables = self.lock();
        tables.ratings.retain(|r| !(r.homebrew_id == id && r.user_id == user_id));
        if let Some(rating) = rating {
            tables.ratings.push(Rating { user_id, homebrew_id: id, rating });
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
