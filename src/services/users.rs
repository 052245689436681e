use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::auth::password::{PasswordError, PasswordHasher};
use crate::auth::{Principal, TokenService};
use crate::database::{Listing, Store};
use crate::error::ApiError;
use crate::models::user::{
    validate_email, validate_password, validate_username, LoginRequest, RegisterRequest, UpdateUserRequest,
};
use crate::models::{Id, NewUser, Page, User, UserChanges};

/// A freshly issued token and the account it belongs to.
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Accounts, credentials and token issuance.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, hasher: PasswordHasher) -> Self {
        Self { store, tokens, hasher }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<Session, ApiError> {
        let username = validate_username(&request.username)?;
        let email = validate_email(&request.email)?;
        validate_password(&request.password)?;
        self.ensure_tokens()?;

        let password_hash = self.hasher.hash(&request.password).await.map_err(hash_failure)?;
        let user = self
            .store
            .insert_user(NewUser { username, email, password_hash })
            .await?;
        info!("Registered user {} ({})", user.id, user.username);

        let token = self.issue(&user)?;
        Ok(Session { token, user })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session, ApiError> {
        self.ensure_tokens()?;
        let rejected = || ApiError::unauthorized("invalid email or password");

        let Some(user) = self.store.user_by_email(request.email.trim()).await? else {
            return Err(rejected());
        };
        let matches = self
            .hasher
            .verify(&request.password, &user.password_hash)
            .await
            .map_err(hash_failure)?;
        if !matches {
            warn!("Failed login for user {}", user.id);
            return Err(rejected());
        }

        let token = self.issue(&user)?;
        Ok(Session { token, user })
    }

    pub async fn me(&self, principal: &Principal) -> Result<User, ApiError> {
        self.find(principal.user_id).await
    }

    pub async fn update_me(&self, principal: &Principal, request: UpdateUserRequest) -> Result<User, ApiError> {
        let username = request.username.as_deref().map(validate_username).transpose()?;
        let email = request.email.as_deref().map(validate_email).transpose()?;
        let password_hash = match request.password {
            Some(password) => {
                validate_password(&password)?;
                Some(self.hasher.hash(&password).await.map_err(hash_failure)?)
            }
            None => None,
        };

        let changes = UserChanges { username, email, password_hash };
        self.store
            .update_user(principal.user_id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))
    }

    pub async fn delete_me(&self, principal: &Principal) -> Result<(), ApiError> {
        self.delete(principal.user_id).await
    }

    pub async fn list(&self, principal: &Principal, page: Page) -> Result<Listing<User>, ApiError> {
        require_admin(principal)?;
        Ok(self.store.list_users(page).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Id) -> Result<User, ApiError> {
        require_admin(principal)?;
        self.find(id).await
    }

    pub async fn remove(&self, principal: &Principal, id: Id) -> Result<(), ApiError> {
        require_admin(principal)?;
        self.delete(id).await
    }

    async fn find(&self, id: Id) -> Result<User, ApiError> {
        self.store
            .user_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))
    }

    async fn delete(&self, id: Id) -> Result<(), ApiError> {
        if !self.store.delete_user(id).await? {
            return Err(ApiError::not_found("user not found"));
        }
        info!("Deleted user {}", id);
        Ok(())
    }

    fn ensure_tokens(&self) -> Result<(), ApiError> {
        if self.tokens.is_configured() {
            Ok(())
        } else {
            error!("JWT_SECRET is not set; cannot issue tokens");
            Err(ApiError::internal_server_error("authentication not configured"))
        }
    }

    fn issue(&self, user: &User) -> Result<String, ApiError> {
        self.tokens.issue(user).map_err(|e| {
            error!("Token issue failed for user {}: {}", user.id, e);
            ApiError::internal()
        })
    }
}

fn require_admin(principal: &Principal) -> Result<(), ApiError> {
    if principal.admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("admin access required"))
    }
}

fn hash_failure(err: PasswordError) -> ApiError {
    error!("Password hashing failed: {}", err);
    ApiError::internal()
}
