//! Homebrew races, classes and backgrounds. Private entries behave like the
//! rest of the owned content; public ones are readable, favoritable and
//! ratable by every user but still only editable by their author.

use std::sync::Arc;

use tracing::info;

use crate::auth::Principal;
use crate::database::{Listing, Store};
use crate::error::ApiError;
use crate::models::{Homebrew, HomebrewChanges, HomebrewDraft, HomebrewKind, Id, Page, RatingRequest};

#[derive(Clone)]
pub struct HomebrewService {
    store: Arc<dyn Store>,
}

fn not_found(kind: HomebrewKind) -> ApiError {
    ApiError::not_found(format!("homebrew {} not found", kind))
}

impl HomebrewService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        kind: HomebrewKind,
        principal: &Principal,
        page: Page,
    ) -> Result<Listing<Homebrew>, ApiError> {
        Ok(self.store.list_homebrew(kind, principal.user_id, page).await?)
    }

    pub async fn get(&self, kind: HomebrewKind, principal: &Principal, id: Id) -> Result<Homebrew, ApiError> {
        self.store
            .homebrew(kind, id, principal.scope())
            .await?
            .ok_or_else(|| not_found(kind))
    }

    pub async fn create(
        &self,
        kind: HomebrewKind,
        principal: &Principal,
        draft: HomebrewDraft,
    ) -> Result<Homebrew, ApiError> {
        let content = draft.into_content(kind)?;
        let homebrew = self.store.insert_homebrew(principal.user_id, content).await?;
        info!("Created homebrew {} {} for user {}", kind, homebrew.id, principal.user_id);
        Ok(homebrew)
    }

    /// Fetches the entry the caller may see, then refuses unless they wrote it.
    async fn authored(&self, kind: HomebrewKind, principal: &Principal, id: Id) -> Result<Homebrew, ApiError> {
        let homebrew = self.get(kind, principal, id).await?;
        if !principal.scope().permits(homebrew.owner_id) {
            return Err(ApiError::forbidden("only the author can change this homebrew"));
        }
        Ok(homebrew)
    }

    pub async fn update(
        &self,
        kind: HomebrewKind,
        principal: &Principal,
        id: Id,
        changes: HomebrewChanges,
    ) -> Result<Homebrew, ApiError> {
        let current = self.authored(kind, principal, id).await?;
        let content = changes.merge(&current)?;
        self.store
            .update_homebrew(kind, id, principal.scope(), content)
            .await?
            .ok_or_else(|| not_found(kind))
    }

    pub async fn delete(&self, kind: HomebrewKind, principal: &Principal, id: Id) -> Result<(), ApiError> {
        self.authored(kind, principal, id).await?;
        if !self.store.delete_homebrew(kind, id, principal.scope()).await? {
            return Err(not_found(kind));
        }
        info!("Deleted homebrew {} {}", kind, id);
        Ok(())
    }

    pub async fn favorites(
        &self,
        kind: HomebrewKind,
        principal: &Principal,
        page: Page,
    ) -> Result<Listing<Homebrew>, ApiError> {
        Ok(self.store.favorite_homebrew(kind, principal.user_id, page).await?)
    }

    pub async fn set_favorite(
        &self,
        kind: HomebrewKind,
        principal: &Principal,
        id: Id,
        favorite: bool,
    ) -> Result<Homebrew, ApiError> {
        self.get(kind, principal, id).await?;
        self.store.set_favorite(id, principal.user_id, favorite).await?;
        self.get(kind, principal, id).await
    }

    pub async fn rate(
        &self,
        kind: HomebrewKind,
        principal: &Principal,
        id: Id,
        request: Option<RatingRequest>,
    ) -> Result<Homebrew, ApiError> {
        if let Some(request) = &request {
            request.validate()?;
        }
        self.get(kind, principal, id).await?;
        self.store
            .set_rating(id, principal.user_id, request.map(|r| r.rating))
            .await?;
        self.get(kind, principal, id).await
    }
}
