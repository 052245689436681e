pub mod campaign;
pub mod campaign_character;
pub mod character;
pub mod encounter;
pub mod homebrew;
pub mod pagination;
pub mod treasure;
pub mod user;

pub use campaign::{Campaign, CampaignChanges, CampaignDraft, CampaignStatus, JoinOutcome, Member, MembershipRole};
pub use campaign_character::{
    AvailableCharacter, CampaignCharacter, Condition, FullChanges, InstanceEdit, StateChanges, Template,
};
pub use character::{Attributes, Character, CharacterChanges, CharacterDraft, CharacterKind, SpellBook};
pub use encounter::{Difficulty, Encounter, EncounterDraft, Monster};
pub use homebrew::{
    Homebrew, HomebrewChanges, HomebrewContent, HomebrewDetails, HomebrewDraft, HomebrewKind, RatingRequest,
};
pub use pagination::{Page, PageQuery};
pub use treasure::{Hoard, Treasure, TreasureDraft};
pub use user::{NewUser, User, UserChanges};

/// Identifier type shared by every table (BIGSERIAL).
pub type Id = i64;
