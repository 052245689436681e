pub mod manager;
pub mod postgres;
pub mod store;

pub use manager::{constraints, DatabaseError, DatabaseManager};
pub use postgres::PgStore;
pub use store::{
    CampaignCharacterStore, CampaignStore, CharacterStore, EncounterStore, HomebrewStore, Listing, Store, TreasureStore,
    UserStore,
};
