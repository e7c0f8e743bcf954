//! Migration configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Only `DATABASE_URL` is needed for a
//! real run; everything else has a default.

use std::time::Duration;

use crate::error::MigrationError;

/// Default marketplace asset endpoint base.
pub const DEFAULT_OPENSEA_API_URL: &str = "https://api.opensea.io/api/v1";

/// Top-level migration configuration.
///
/// Loaded once at startup via [`MigrationConfig::from_env`].
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// PostgreSQL connection string. Optional so dry runs work without a
    /// database.
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Base URL of the marketplace asset API (no trailing slash).
    pub opensea_api_url: String,

    /// Optional marketplace API key, sent as `X-API-KEY`.
    pub opensea_api_key: Option<String>,

    /// Maximum number of in-flight enrichment requests.
    pub enrichment_concurrency: usize,

    /// Per-request enrichment timeout in seconds.
    pub enrichment_timeout_secs: u64,

    /// Number of documents per bulk insert statement.
    pub insert_batch_size: usize,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl MigrationConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or does not parse.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Config`] if a budget is set to zero.
    pub fn from_env() -> Result<Self, MigrationError> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let opensea_api_url = std::env::var("OPENSEA_API_URL")
            .unwrap_or_else(|_| DEFAULT_OPENSEA_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let opensea_api_key = std::env::var("OPENSEA_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let config = Self {
            database_url,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5),
            database_connect_timeout_secs: parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5),
            opensea_api_url,
            opensea_api_key,
            enrichment_concurrency: parse_env("ENRICHMENT_CONCURRENCY", 5),
            enrichment_timeout_secs: parse_env("ENRICHMENT_TIMEOUT_SECS", 5),
            insert_batch_size: parse_env("INSERT_BATCH_SIZE", 1000),
            log_json: parse_env_bool("LOG_JSON", false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every budget is usable.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<(), MigrationError> {
        if self.enrichment_concurrency == 0 {
            return Err(MigrationError::Config(
                "ENRICHMENT_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if self.enrichment_timeout_secs == 0 {
            return Err(MigrationError::Config(
                "ENRICHMENT_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        if self.insert_batch_size == 0 {
            return Err(MigrationError::Config(
                "INSERT_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        if self.database_max_connections == 0 {
            return Err(MigrationError::Config(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-request enrichment timeout.
    #[must_use]
    pub const fn enrichment_timeout(&self) -> Duration {
        Duration::from_secs(self.enrichment_timeout_secs)
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            database_connect_timeout_secs: 5,
            opensea_api_url: DEFAULT_OPENSEA_API_URL.to_string(),
            opensea_api_key: None,
            enrichment_concurrency: 5,
            enrichment_timeout_secs: 5,
            insert_batch_size: 1000,
            log_json: false,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
