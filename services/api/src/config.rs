//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::Duration;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    /// Shared secret used to sign and verify access tokens.
    pub secret_key: String,
    pub token_ttl: Duration,
    pub openai_api_key: String,
    pub generation_model: String,
    pub cors_allow_origin: String,
    /// Serve generate/refine/node-detail without authentication.
    pub public_node_endpoints: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address_str = or_default("BIND_ADDRESS", "0.0.0.0:8000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;

        let max_connections_str = or_default("DATABASE_MAX_CONNECTIONS", "5");
        let database_max_connections = max_connections_str.parse::<u32>().map_err(|e| {
            ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string(), e.to_string())
        })?;

        let log_level_str = or_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Credentials ---
        let secret_key = required("SECRET_KEY")?;
        if secret_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "SECRET_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let ttl_str = or_default("TOKEN_TTL_MINUTES", "1440");
        let ttl_minutes = ttl_str.parse::<i64>().map_err(|e| {
            ConfigError::InvalidValue("TOKEN_TTL_MINUTES".to_string(), e.to_string())
        })?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_MINUTES".to_string(),
                "must be positive".to_string(),
            ));
        }

        // --- Generation Settings ---
        let openai_api_key = required("OPENAI_API_KEY")?;
        let generation_model = or_default("GENERATION_MODEL", "gpt-4o-mini");

        // --- HTTP Surface ---
        let cors_allow_origin = or_default("CORS_ALLOW_ORIGIN", "http://localhost:5173");
        if axum::http::HeaderValue::from_str(&cors_allow_origin).is_err() {
            return Err(ConfigError::InvalidValue(
                "CORS_ALLOW_ORIGIN".to_string(),
                format!("'{}' is not a valid origin header value", cors_allow_origin),
            ));
        }
        let public_str = or_default("PUBLIC_NODE_ENDPOINTS", "false");
        let public_node_endpoints = match public_str.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "PUBLIC_NODE_ENDPOINTS".to_string(),
                    format!("'{}' is not a boolean", other),
                ))
            }
        };

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            secret_key,
            token_ttl: Duration::minutes(ttl_minutes),
            openai_api_key,
            generation_model,
            cors_allow_origin,
            public_node_endpoints,
        })
    }
}
