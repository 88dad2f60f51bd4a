use std::env;

use thiserror::Error;

/// Process configuration, read once at startup and injected everywhere else.
///
/// The signing secret and database URL are required; missing values are a
/// fatal startup error, never a per-request one.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub security: SecurityConfig,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// HS256 signing secret for access tokens. Never logged.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default 1 hour).
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds (default 2 weeks).
    pub refresh_token_ttl_secs: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("environment variable {0} has an invalid value: {1}")]
    InvalidVar(&'static str, String),
}

const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 60;
const DEFAULT_REFRESH_TTL_SECS: i64 = 60 * 60 * 24 * 14;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = require_var("TASKDECK_JWT_SECRET")?;
        let database_url = require_var("DATABASE_URL")?;

        let access_token_ttl_secs =
            parse_var("TASKDECK_ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_token_ttl_secs =
            parse_var("TASKDECK_REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?;
        let port = parse_var("TASKDECK_PORT", 3000u16)?;

        Ok(Self {
            database_url,
            security: SecurityConfig {
                jwt_secret,
                access_token_ttl_secs,
                refresh_token_ttl_secs,
            },
            port,
        })
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidVar(name, v)),
        Err(_) => Ok(default),
    }
}
