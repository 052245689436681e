//! Business operations. Each service validates its input, applies the
//! ownership and campaign-role rules, and talks to the store traits.

pub mod campaigns;
pub mod characters;
pub mod content;
pub mod dice;
pub mod homebrew;
pub mod instances;
pub mod invites;
pub mod users;

pub use campaigns::{CampaignAccess, CampaignService};
pub use characters::CharacterService;
pub use content::{EncounterService, TreasureService};
pub use homebrew::HomebrewService;
pub use instances::{AttachRequest, InstanceService};
pub use users::{Session, UserService};

/// Outcome of a generate-and-persist call. A generated entity that could
/// not be stored is still handed back, with `id` 0.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub entity: T,
    pub saved: bool,
}

impl<T> Generated<T> {
    pub fn saved(entity: T) -> Self {
        Self { entity, saved: true }
    }

    pub fn unsaved(entity: T) -> Self {
        Self { entity, saved: false }
    }
}
