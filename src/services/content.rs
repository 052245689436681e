//! Encounters and treasures. Both are created whole (by hand or by the
//! generator) and never edited afterwards.

use std::sync::Arc;

use tracing::{info, warn};

use super::Generated;
use crate::auth::Principal;
use crate::database::{Listing, Store};
use crate::error::ApiError;
use crate::generation::{EncounterRequest, GenerationError, Generator, LootRequest};
use crate::models::{Encounter, EncounterDraft, Id, Page, Treasure, TreasureDraft};

#[derive(Clone)]
pub struct EncounterService {
    store: Arc<dyn Store>,
    generator: Arc<dyn Generator>,
}

impl EncounterService {
    pub fn new(store: Arc<dyn Store>, generator: Arc<dyn Generator>) -> Self {
        Self { store, generator }
    }

    pub async fn list(&self, principal: &Principal, page: Page) -> Result<Listing<Encounter>, ApiError> {
        Ok(self.store.list_encounters(principal.user_id, page).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Id) -> Result<Encounter, ApiError> {
        self.store
            .encounter(id, principal.scope())
            .await?
            .ok_or_else(|| ApiError::not_found("encounter not found"))
    }

    pub async fn create(&self, principal: &Principal, draft: EncounterDraft) -> Result<Encounter, ApiError> {
        draft.validate()?;
        let encounter = self.store.insert_encounter(principal.user_id, draft).await?;
        info!("Created encounter {} for user {}", encounter.id, principal.user_id);
        Ok(encounter)
    }

    pub async fn delete(&self, principal: &Principal, id: Id) -> Result<(), ApiError> {
        if !self.store.delete_encounter(id, principal.scope()).await? {
            return Err(ApiError::not_found("encounter not found"));
        }
        Ok(())
    }

    pub async fn generate(
        &self,
        principal: &Principal,
        request: EncounterRequest,
    ) -> Result<Generated<Encounter>, ApiError> {
        request.validate()?;
        let mut draft = self.generator.generate_encounter(&request).await?;
        if draft.theme.trim().is_empty() {
            draft.theme = "Random encounter".to_string();
        }
        draft
            .validate()
            .map_err(|e| GenerationError::Rejected(e.to_string()))?;

        match self.store.insert_encounter(principal.user_id, draft.clone()).await {
            Ok(encounter) => Ok(Generated::saved(encounter)),
            Err(e) => {
                warn!("Generated encounter for user {} could not be saved: {}", principal.user_id, e);
                Ok(Generated::unsaved(Encounter::from_draft(principal.user_id, draft)))
            }
        }
    }
}

#[derive(Clone)]
pub struct TreasureService {
    store: Arc<dyn Store>,
    generator: Arc<dyn Generator>,
}

impl TreasureService {
    pub fn new(store: Arc<dyn Store>, generator: Arc<dyn Generator>) -> Self {
        Self { store, generator }
    }

    pub async fn list(&self, principal: &Principal, page: Page) -> Result<Listing<Treasure>, ApiError> {
        Ok(self.store.list_treasures(principal.user_id, page).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Id) -> Result<Treasure, ApiError> {
        self.store
            .treasure(id, principal.scope())
            .await?
            .ok_or_else(|| ApiError::not_found("treasure not found"))
    }

    pub async fn create(&self, principal: &Principal, draft: TreasureDraft) -> Result<Treasure, ApiError> {
        draft.validate()?;
        let treasure = self.store.insert_treasure(principal.user_id, draft).await?;
        info!("Created treasure {} for user {}", treasure.id, principal.user_id);
        Ok(treasure)
    }

    pub async fn delete(&self, principal: &Principal, id: Id) -> Result<(), ApiError> {
        if !self.store.delete_treasure(id, principal.scope()).await? {
            return Err(ApiError::not_found("treasure not found"));
        }
        Ok(())
    }

    pub async fn generate(
        &self,
        principal: &Principal,
        request: LootRequest,
    ) -> Result<Generated<Treasure>, ApiError> {
        request.validate()?;
        let draft = self.generator.generate_loot(&request).await?;
        draft
            .validate()
            .map_err(|e| GenerationError::Rejected(e.to_string()))?;

        match self.store.insert_treasure(principal.user_id, draft.clone()).await {
            Ok(treasure) => Ok(Generated::saved(treasure)),
            Err(e) => {
                warn!("Generated treasure for user {} could not be saved: {}", principal.user_id, e);
                Ok(Generated::unsaved(Treasure::from_draft(principal.user_id, draft)))
            }
        }
    }
}
