use serde::Deserialize;
use thiserror::Error;

use crate::config::env::{self, EnvKey};

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    /// Unset means the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub cookie_secure: bool,
    pub auto_migrate: bool,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let jwt_secret = env::get_opt(EnvKey::JwtSecret).ok_or(ConfigError::Missing(EnvKey::JwtSecret.as_str()))?;

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            database_url: env::get_opt(EnvKey::DatabaseUrl),
            jwt_secret,
            token_ttl_secs: env::get_parsed(EnvKey::TokenTtlSecs, DEFAULT_TOKEN_TTL_SECS),
            cookie_secure: env::get_parsed(EnvKey::CookieSecure, true),
            auto_migrate: env::get_parsed(EnvKey::AutoMigrate, true),
        })
    }
}
