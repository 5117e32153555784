//! Store API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults, so a development instance starts with no setup at all.

use serde::{Deserialize, Serialize};
use std::env;

/// Store API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file path
    pub database_path: String,

    /// HMAC secret for verifying bearer tokens
    pub jwt_secret: String,

    /// Exchange-rate provider base URL (without trailing slash)
    pub exchange_api_url: String,

    /// Exchange-rate provider API key
    pub exchange_api_key: String,

    /// Timeout for a single rate lookup, in seconds. A timeout is treated
    /// exactly like a provider failure: the original amount is returned.
    pub exchange_timeout_secs: u64,

    /// How long a fetched (from, to) rate stays usable, in seconds.
    pub rate_cache_ttl_secs: u64,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = StoreConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./tribune.db".to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // Development fallback only; production MUST set JWT_SECRET
                "tribune-dev-secret-change-in-production".to_string()
            }),

            exchange_api_url: env::var("EXCHANGE_API_URL")
                .unwrap_or_else(|_| "https://v6.exchangerate-api.com/v6".to_string()),

            exchange_api_key: env::var("EXCHANGE_API_KEY").unwrap_or_default(),

            exchange_timeout_secs: env::var("EXCHANGE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EXCHANGE_TIMEOUT_SECS".to_string()))?,

            rate_cache_ttl_secs: env::var("RATE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("RATE_CACHE_TTL_SECS".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
