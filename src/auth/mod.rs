pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Id, User};

pub const ISSUER: &str = "taverna-do-mestre";
pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Id,
    pub email: String,
    pub admin: bool,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated caller, derived from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Id,
    pub email: String,
    pub admin: bool,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            admin: claims.admin,
        }
    }
}

impl Principal {
    /// Row filter for reads and writes: admins see everything.
    pub fn scope(&self) -> Scope {
        if self.admin {
            Scope::Any
        } else {
            Scope::Owner(self.user_id)
        }
    }
}

/// Ownership predicate handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Owner(Id),
    Any,
}

impl Scope {
    pub fn owner(self) -> Option<Id> {
        match self {
            Scope::Owner(id) => Some(id),
            Scope::Any => None,
        }
    }

    pub fn permits(self, owner_id: Id) -> bool {
        match self {
            Scope::Owner(id) => id == owner_id,
            Scope::Any => true,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    NotConfigured,

    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Invalid JWT token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies session tokens with one HS256 secret.
#[derive(Clone)]
pub struct TokenService {
    keys: Option<(EncodingKey, DecodingKey)>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: Option<&str>, ttl_hours: i64) -> Self {
        let keys = secret
            .filter(|s| !s.is_empty())
            .map(|s| (EncodingKey::from_secret(s.as_bytes()), DecodingKey::from_secret(s.as_bytes())));
        Self {
            keys,
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let (encoding_key, _) = self.keys.as_ref().ok_or(TokenError::NotConfigured)?;
        let now = Utc::now();
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            admin: user.admin,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (_, decoding_key) = self.keys.as_ref().ok_or(TokenError::NotConfigured)?;

        // Only HS256 is accepted, whatever the header claims.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "iat"]);
        validation.leeway = 0;

        Ok(decode::<Claims>(token, decoding_key, &validation)?.claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("configured", &self.is_configured())
            .field("ttl_hours", &self.ttl.num_hours())
            .finish()
    }
}
