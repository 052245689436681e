use std::sync::Arc;

use tracing::{info, warn};

use super::Generated;
use crate::auth::Principal;
use crate::database::{Listing, Store};
use crate::error::ApiError;
use crate::generation::{GenerationError, Generator, NpcRequest};
use crate::models::{Character, CharacterChanges, CharacterDraft, CharacterKind, Id, Page};

/// Owner-gated CRUD shared by player characters and NPCs.
#[derive(Clone)]
pub struct CharacterService {
    store: Arc<dyn Store>,
    generator: Arc<dyn Generator>,
}

fn not_found(kind: CharacterKind) -> ApiError {
    ApiError::not_found(format!("{} not found", kind.label()))
}

impl CharacterService {
    pub fn new(store: Arc<dyn Store>, generator: Arc<dyn Generator>) -> Self {
        Self { store, generator }
    }

    pub async fn list(
        &self,
        kind: CharacterKind,
        principal: &Principal,
        page: Page,
    ) -> Result<Listing<Character>, ApiError> {
        Ok(self.store.list_characters(kind, principal.user_id, page).await?)
    }

    pub async fn get(&self, kind: CharacterKind, principal: &Principal, id: Id) -> Result<Character, ApiError> {
        self.store
            .character(kind, id, principal.scope())
            .await?
            .ok_or_else(|| not_found(kind))
    }

    pub async fn create(
        &self,
        kind: CharacterKind,
        principal: &Principal,
        draft: CharacterDraft,
    ) -> Result<Character, ApiError> {
        draft.validate()?;
        let character = self.store.insert_character(kind, principal.user_id, draft).await?;
        info!("Created {} {} for user {}", kind, character.id, principal.user_id);
        Ok(character)
    }

    pub async fn update(
        &self,
        kind: CharacterKind,
        principal: &Principal,
        id: Id,
        changes: CharacterChanges,
    ) -> Result<Character, ApiError> {
        changes.validate()?;
        self.store
            .update_character(kind, id, principal.scope(), changes)
            .await?
            .ok_or_else(|| not_found(kind))
    }

    /// Campaign instances of the character survive, detached.
    pub async fn delete(&self, kind: CharacterKind, principal: &Principal, id: Id) -> Result<(), ApiError> {
        if !self.store.delete_character(kind, id, principal.scope()).await? {
            return Err(not_found(kind));
        }
        info!("Deleted {} {}", kind, id);
        Ok(())
    }

    pub async fn generate_npc(
        &self,
        principal: &Principal,
        request: NpcRequest,
    ) -> Result<Generated<Character>, ApiError> {
        request.validate()?;
        let draft = self.generator.generate_npc(&request).await?;
        draft
            .validate()
            .map_err(|e| GenerationError::Rejected(e.to_string()))?;

        match self
            .store
            .insert_character(CharacterKind::Npc, principal.user_id, draft.clone())
            .await
        {
            Ok(npc) => Ok(Generated::saved(npc)),
            Err(e) => {
                warn!("Generated NPC for user {} could not be saved: {}", principal.user_id, e);
                Ok(Generated::unsaved(Character::from_draft(
                    CharacterKind::Npc,
                    principal.user_id,
                    draft,
                )))
            }
        }
    }
}
