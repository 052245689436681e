use std::sync::Arc;

use tracing::{error, info, warn};

use super::invites;
use crate::auth::Principal;
use crate::database::{constraints, DatabaseError, Listing, Store};
use crate::error::ApiError;
use crate::models::{Campaign, CampaignChanges, CampaignDraft, Id, JoinOutcome, Member, Page};

/// How the caller relates to a campaign they can see.
#[derive(Debug, Clone)]
pub struct CampaignAccess {
    pub campaign: Campaign,
    /// The campaign's DM, or an admin acting as one.
    pub dm: bool,
}

impl CampaignAccess {
    pub fn require_dm(&self) -> Result<(), ApiError> {
        if self.dm {
            Ok(())
        } else {
            Err(ApiError::forbidden("only the campaign DM can do this"))
        }
    }

    /// The campaign as the caller may see it: players never get the invite code.
    pub fn view(self) -> Campaign {
        if self.dm {
            self.campaign
        } else {
            self.campaign.without_invite_code()
        }
    }
}

#[derive(Clone)]
pub struct CampaignService {
    store: Arc<dyn Store>,
}

fn campaign_not_found() -> ApiError {
    ApiError::not_found("campaign not found")
}

impl CampaignService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolves a campaign the caller belongs to. Non-members get a 404 so
    /// the existence of other tables does not leak.
    pub async fn access(&self, principal: &Principal, id: Id) -> Result<CampaignAccess, ApiError> {
        let campaign = self.store.campaign(id).await?.ok_or_else(campaign_not_found)?;
        if principal.admin || campaign.dm_id == principal.user_id {
            return Ok(CampaignAccess { campaign, dm: true });
        }
        match self.store.membership(id, principal.user_id).await? {
            Some(_) => Ok(CampaignAccess { campaign, dm: false }),
            None => Err(campaign_not_found()),
        }
    }

    pub async fn create(&self, principal: &Principal, draft: CampaignDraft) -> Result<Campaign, ApiError> {
        draft.validate()?;
        for attempt in 1..=invites::MAX_ATTEMPTS {
            let code = invites::generate();
            match self.store.create_campaign(principal.user_id, draft.clone(), &code).await {
                Ok(campaign) => {
                    info!("Created campaign {} for DM {}", campaign.id, principal.user_id);
                    return Ok(campaign);
                }
                Err(DatabaseError::Conflict(c)) if c == constraints::CAMPAIGN_INVITE_CODE => {
                    warn!("Invite code collision on attempt {}", attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(invite_exhausted())
    }

    pub async fn list(&self, principal: &Principal, page: Page) -> Result<Listing<Campaign>, ApiError> {
        let (campaigns, total) = self.store.campaigns_for_member(principal.user_id, page).await?;
        let campaigns = campaigns
            .into_iter()
            .map(|c| {
                if principal.admin || c.dm_id == principal.user_id {
                    c
                } else {
                    c.without_invite_code()
                }
            })
            .collect();
        Ok((campaigns, total))
    }

    pub async fn get(&self, principal: &Principal, id: Id) -> Result<Campaign, ApiError> {
        Ok(self.access(principal, id).await?.view())
    }

    pub async fn update(&self, principal: &Principal, id: Id, changes: CampaignChanges) -> Result<Campaign, ApiError> {
        self.access(principal, id).await?.require_dm()?;
        changes.validate()?;
        self.store
            .update_campaign(id, changes)
            .await?
            .ok_or_else(campaign_not_found)
    }

    pub async fn delete(&self, principal: &Principal, id: Id) -> Result<(), ApiError> {
        self.access(principal, id).await?.require_dm()?;
        if !self.store.delete_campaign(id).await? {
            return Err(campaign_not_found());
        }
        info!("Deleted campaign {}", id);
        Ok(())
    }

    pub async fn invite_code(&self, principal: &Principal, id: Id) -> Result<String, ApiError> {
        let access = self.access(principal, id).await?;
        access.require_dm()?;
        access.campaign.invite_code.ok_or_else(ApiError::internal)
    }

    /// Issues a fresh code; the previous one stops working immediately.
    pub async fn rotate_invite_code(&self, principal: &Principal, id: Id) -> Result<String, ApiError> {
        self.access(principal, id).await?.require_dm()?;
        for attempt in 1..=invites::MAX_ATTEMPTS {
            let code = invites::generate();
            match self.store.replace_invite_code(id, &code).await {
                Ok(Some(_)) => {
                    info!("Rotated invite code for campaign {}", id);
                    return Ok(code);
                }
                Ok(None) => return Err(campaign_not_found()),
                Err(DatabaseError::Conflict(c)) if c == constraints::CAMPAIGN_INVITE_CODE => {
                    warn!("Invite code collision on attempt {}", attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(invite_exhausted())
    }

    pub async fn join(&self, principal: &Principal, code: &str) -> Result<Campaign, ApiError> {
        let code = invites::normalize(code);
        if code.is_empty() {
            return Err(ApiError::bad_request("invite_code is required"));
        }
        match self.store.join_campaign(&code, principal.user_id).await? {
            JoinOutcome::Joined(campaign) => {
                info!("User {} joined campaign {}", principal.user_id, campaign.id);
                Ok(campaign.without_invite_code())
            }
            JoinOutcome::UnknownCode => Err(ApiError::not_found("invalid invite code")),
            JoinOutcome::AlreadyMember => Err(ApiError::bad_request("already a member of this campaign")),
            JoinOutcome::Finished => Err(ApiError::bad_request("campaign is finished")),
            JoinOutcome::Full => Err(ApiError::bad_request("campaign is full")),
        }
    }

    /// Players leave taking their instances with them. The DM cannot leave.
    pub async fn leave(&self, principal: &Principal, id: Id) -> Result<(), ApiError> {
        let campaign = self.store.campaign(id).await?.ok_or_else(campaign_not_found)?;
        if campaign.dm_id == principal.user_id {
            return Err(ApiError::bad_request("the DM cannot leave their own campaign; delete it instead"));
        }
        if !self.store.leave_campaign(id, principal.user_id).await? {
            return Err(ApiError::not_found("not a member of this campaign"));
        }
        info!("User {} left campaign {}", principal.user_id, id);
        Ok(())
    }

    pub async fn members(&self, principal: &Principal, id: Id) -> Result<Vec<Member>, ApiError> {
        self.access(principal, id).await?;
        Ok(self.store.members(id).await?)
    }
}

fn invite_exhausted() -> ApiError {
    error!("Gave up allocating an invite code after {} attempts", invites::MAX_ATTEMPTS);
    ApiError::internal_server_error("could not allocate invite code")
}
