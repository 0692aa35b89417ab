use std::net::SocketAddr;

use chrono::Duration;
use clinic_db::DbConfig;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "clinic-dev-secret-change-me";

#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// Which backend the stores run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError(format!("unknown CLINIC_STORE backend: {other}"))),
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub backend: StoreBackend,
    pub relational_db: DbConfig<'static>,
    pub document_db: DbConfig<'static>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: Duration::minutes(600),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cors_origins: Vec::new(),
            backend: StoreBackend::Postgres,
            relational_db: DbConfig::default(),
            document_db: DbConfig {
                database: "clinic_docs".into(),
                ..DbConfig::default()
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Database
    /// parts are always read from the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match lookup("CLINIC_BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError(format!("invalid CLINIC_BIND_ADDR: {raw}")))?,
            None => defaults.bind_addr,
        };

        let jwt_secret = match lookup("CLINIC_JWT_SECRET") {
            Some(secret) if secret.is_empty() => {
                return Err(ConfigError("CLINIC_JWT_SECRET must not be empty".to_string()))
            }
            Some(secret) => secret,
            None => {
                tracing::warn!("CLINIC_JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        let token_ttl = match lookup("CLINIC_TOKEN_TTL_MINUTES") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if minutes > 0 => Duration::minutes(minutes),
                _ => {
                    return Err(ConfigError(format!(
                        "invalid CLINIC_TOKEN_TTL_MINUTES: {raw}"
                    )))
                }
            },
            None => defaults.token_ttl,
        };

        let bcrypt_cost = match lookup("CLINIC_BCRYPT_COST") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => return Err(ConfigError(format!("invalid CLINIC_BCRYPT_COST: {raw}"))),
            },
            None => defaults.bcrypt_cost,
        };

        let cors_origins = lookup("CLINIC_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let backend = match lookup("CLINIC_STORE") {
            Some(raw) => raw.parse()?,
            None => defaults.backend,
        };

        let relational_db =
            DbConfig::from_env("CLINIC_DB", "DATABASE_URL", "clinic_db").map_err(ConfigError)?;
        let document_db = DbConfig::from_env("CLINIC_DOCS", "DOCUMENT_DATABASE_URL", "clinic_docs")
            .map_err(ConfigError)?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            bcrypt_cost,
            cors_origins,
            backend,
            relational_db,
            document_db,
        })
    }
}
