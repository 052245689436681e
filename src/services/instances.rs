//! Campaign-character instances: attach, edit, sync and detach.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::campaigns::{CampaignAccess, CampaignService};
use crate::auth::{Principal, Scope};
use crate::database::Store;
use crate::error::ApiError;
use crate::models::{
    AvailableCharacter, CampaignCharacter, CharacterKind, FullChanges, Id, InstanceEdit, StateChanges, Template,
};

#[derive(Debug, Clone, Deserialize)]
pub struct AttachRequest {
    pub character_id: Id,
    #[serde(default)]
    pub kind: CharacterKind,
}

#[derive(Clone)]
pub struct InstanceService {
    store: Arc<dyn Store>,
    campaigns: CampaignService,
}

fn instance_not_found() -> ApiError {
    ApiError::not_found("campaign character not found")
}

fn source_gone() -> ApiError {
    ApiError::conflict("source character no longer exists")
}

impl InstanceService {
    pub fn new(store: Arc<dyn Store>, campaigns: CampaignService) -> Self {
        Self { store, campaigns }
    }

    /// The caller's own characters that are not yet in the campaign.
    pub async fn available(&self, principal: &Principal, campaign_id: Id) -> Result<Vec<AvailableCharacter>, ApiError> {
        self.campaigns.access(principal, campaign_id).await?;
        Ok(self.store.available_characters(campaign_id, principal.user_id).await?)
    }

    pub async fn list(&self, principal: &Principal, campaign_id: Id) -> Result<Vec<CampaignCharacter>, ApiError> {
        self.campaigns.access(principal, campaign_id).await?;
        Ok(self.store.instances(campaign_id).await?)
    }

    pub async fn attach(
        &self,
        principal: &Principal,
        campaign_id: Id,
        request: AttachRequest,
    ) -> Result<CampaignCharacter, ApiError> {
        self.campaigns.access(principal, campaign_id).await?;
        let source = self
            .store
            .character(request.kind, request.character_id, principal.scope())
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} not found", request.kind.label())))?;

        let instance = self
            .store
            .insert_instance(CampaignCharacter::attach(campaign_id, &source))
            .await?;
        info!(
            "Attached {} {} to campaign {} as instance {}",
            source.kind, source.id, campaign_id, instance.id
        );
        Ok(instance)
    }

    pub async fn get(&self, principal: &Principal, campaign_id: Id, id: Id) -> Result<CampaignCharacter, ApiError> {
        self.campaigns.access(principal, campaign_id).await?;
        self.find(campaign_id, id).await
    }

    /// Campaign-layer changes: the instance owner or the DM.
    pub async fn update_state(
        &self,
        principal: &Principal,
        campaign_id: Id,
        id: Id,
        changes: StateChanges,
    ) -> Result<CampaignCharacter, ApiError> {
        let access = self.campaigns.access(principal, campaign_id).await?;
        let instance = self.find(campaign_id, id).await?;
        require_owner_or_dm(&access, &instance, principal)?;
        self.edit(campaign_id, id, InstanceEdit::State(changes)).await
    }

    /// Template and campaign layers together: DM only. Does not resync.
    pub async fn update_full(
        &self,
        principal: &Principal,
        campaign_id: Id,
        id: Id,
        changes: FullChanges,
    ) -> Result<CampaignCharacter, ApiError> {
        self.campaigns.access(principal, campaign_id).await?.require_dm()?;
        self.find(campaign_id, id).await?;
        self.edit(campaign_id, id, InstanceEdit::Full(changes)).await
    }

    /// Copies the source character's current sheet over the template layer.
    pub async fn sync(&self, principal: &Principal, campaign_id: Id, id: Id) -> Result<CampaignCharacter, ApiError> {
        let access = self.campaigns.access(principal, campaign_id).await?;
        let instance = self.find(campaign_id, id).await?;
        require_owner_or_dm(&access, &instance, principal)?;

        let source_id = instance.source_character_id.ok_or_else(source_gone)?;
        let source = self
            .store
            .character(instance.source_kind, source_id, Scope::Any)
            .await?
            .ok_or_else(source_gone)?;

        let synced = self
            .edit(campaign_id, id, InstanceEdit::Sync(Template::from(&source)))
            .await?;
        info!("Synced instance {} from {} {}", id, source.kind, source.id);
        Ok(synced)
    }

    pub async fn delete(&self, principal: &Principal, campaign_id: Id, id: Id) -> Result<(), ApiError> {
        let access = self.campaigns.access(principal, campaign_id).await?;
        let instance = self.find(campaign_id, id).await?;
        require_owner_or_dm(&access, &instance, principal)?;
        if !self.store.delete_instance(campaign_id, id).await? {
            return Err(instance_not_found());
        }
        info!("Removed instance {} from campaign {}", id, campaign_id);
        Ok(())
    }

    async fn find(&self, campaign_id: Id, id: Id) -> Result<CampaignCharacter, ApiError> {
        self.store
            .instance(campaign_id, id)
            .await?
            .ok_or_else(instance_not_found)
    }

    async fn edit(&self, campaign_id: Id, id: Id, edit: InstanceEdit) -> Result<CampaignCharacter, ApiError> {
        edit.validate()?;
        self.store
            .edit_instance(campaign_id, id, edit)
            .await?
            .ok_or_else(instance_not_found)
    }
}

fn require_owner_or_dm(
    access: &CampaignAccess,
    instance: &CampaignCharacter,
    principal: &Principal,
) -> Result<(), ApiError> {
    if access.dm || instance.owner_id == principal.user_id {
        Ok(())
    } else {
        Err(ApiError::forbidden("only the owner or the DM can change this character"))
    }
}
