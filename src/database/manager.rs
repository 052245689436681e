use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, DatabaseConfig};

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique violation, carrying the name of the constraint that fired.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                return DatabaseError::Conflict(constraint);
            }
        }
        DatabaseError::Sqlx(err)
    }
}

impl From<ConfigError> for DatabaseError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidDatabaseUrl(msg) => DatabaseError::InvalidDatabaseUrl(msg),
        }
    }
}

/// Names of the unique constraints the API turns into 409 responses.
pub mod constraints {
    pub const USERS_EMAIL: &str = "users_email_lower_idx";
    pub const USERS_USERNAME: &str = "users_username_lower_idx";
    pub const CAMPAIGN_INVITE_CODE: &str = "campaigns_invite_code_key";
    pub const CAMPAIGN_MEMBERSHIP: &str = "campaign_memberships_pkey";
    pub const CAMPAIGN_CHARACTER_SOURCE: &str = "campaign_characters_source_key";
}

/// Owns the shared Postgres pool
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Build the pool without opening a connection; the first query connects.
    ///
    /// Startup must survive an unreachable database so `/health` can report it.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let connection_string = config.connection_string()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&connection_string)?;

        info!(
            "Configured database pool for {}:{}/{} (max {} connections)",
            config.host, config.port, config.name, config.max_connections
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
