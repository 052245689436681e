use std::env;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub generation: GenerationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub request_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full connection string; when set it wins over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub sslmode: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: u64,
    pub cors_origin: String,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = v.parse().unwrap_or(self.server.request_timeout_secs);
        }
        if let Some(v) = lookup("SHUTDOWN_TIMEOUT_SECS") {
            self.server.shutdown_timeout_secs = v.parse().unwrap_or(self.server.shutdown_timeout_secs);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DB_SSLMODE") {
            self.database.sslmode = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Generation service overrides (AI_SERVICE_URL and PYTHON_TIMEOUT are older names)
        if let Some(v) = lookup("GENERATION_SERVICE_URL").or_else(|| lookup("AI_SERVICE_URL")) {
            self.generation.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("GENERATION_TIMEOUT_SECS").or_else(|| lookup("PYTHON_TIMEOUT")) {
            self.generation.timeout_secs = v.parse().unwrap_or(self.generation.timeout_secs);
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("CORS_ORIGIN") {
            self.security.cors_origin = v.trim().to_string();
        }
        if let Some(v) = lookup("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        self.security.bcrypt_cost = self.security.bcrypt_cost.clamp(10, 31);

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8080,
                request_timeout_secs: 30,
                shutdown_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: "postgres".to_string(),
                name: "taverna".to_string(),
                sslmode: "disable".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            generation: GenerationConfig {
                base_url: "http://localhost:5000".to_string(),
                timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: None,
                jwt_expiry_hours: 24,
                cors_origin: "http://localhost:5173".to_string(),
                bcrypt_cost: 10,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.sslmode = "prefer".to_string();
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.bcrypt_cost = 12;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.sslmode = "require".to_string();
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.security.bcrypt_cost = 12;
        config
    }
}

impl DatabaseConfig {
    /// Connection string for the pool, assembled from the DB_* parts unless DATABASE_URL is set.
    pub fn connection_string(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            url::Url::parse(url).map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
            return Ok(url.clone());
        }

        let invalid = || ConfigError::InvalidDatabaseUrl(format!("{}:{}", self.host, self.port));
        let mut url = url::Url::parse("postgres://localhost").map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
        url.set_host(Some(&self.host)).map_err(|_| invalid())?;
        url.set_port(Some(self.port)).map_err(|_| invalid())?;
        url.set_username(&self.user).map_err(|_| invalid())?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password)).map_err(|_| invalid())?;
        }
        url.set_path(&format!("/{}", self.name));
        url.query_pairs_mut().append_pair("sslmode", &self.sslmode);
        Ok(url.into())
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<set>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("name", &self.name)
            .field("sslmode", &self.sslmode)
            .field("max_connections", &self.max_connections)
            .field("connection_timeout", &self.connection_timeout)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("cors_origin", &self.cors_origin)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}
