//! Configuration management for interlog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::MAX_RECENT_LIMIT;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "interlog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "interactions.db";

/// Environment variable prefix.
const ENV_PREFIX: &str = "INTERLOG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `INTERLOG_`, sections split on `__`)
/// 2. TOML config file at `~/.config/interlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Ingestion configuration.
    pub ingest: IngestConfig,
    /// Operator query configuration.
    pub query: QueryConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server listens on.
    pub bind_address: String,
    /// Bearer token operators present to the admin endpoint.
    /// When unset the admin endpoint refuses every request. Never serialized.
    #[serde(skip_serializing)]
    pub admin_token: Option<String>,
    /// Request header carrying the caller's resolved user id.
    pub identity_header: String,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/interlog/interactions.db`
    pub database_path: Option<PathBuf>,
    /// How long a statement waits on a locked database file, in milliseconds.
    pub busy_timeout_ms: u64,
    /// How long an operation waits for the store connection, in milliseconds.
    pub lock_timeout_ms: u64,
}

/// Ingestion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Re-check consent preferences carried by a submission.
    pub recheck_consent: bool,
}

/// Operator query configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Result count used when a query gives none. At most 1000.
    pub default_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8787".to_string(),
            admin_token: None,
            identity_header: "x-user-id".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            busy_timeout_ms: 1_000,
            lock_timeout_ms: 250,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            recheck_consent: true,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: MAX_RECENT_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Self::figment(&config_file))
    }

    /// The provider stack used by [`Config::load_from`].
    #[must_use]
    pub fn figment(config_file: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_address()?;

        if self.server.identity_header.trim().is_empty() {
            return Err(Error::config_validation("identity_header cannot be empty"));
        }
        if axum::http::HeaderName::try_from(self.server.identity_header.as_str()).is_err() {
            return Err(Error::config_validation(format!(
                "identity_header is not a valid header name: {}",
                self.server.identity_header
            )));
        }

        if self.server.max_body_bytes == 0 {
            return Err(Error::config_validation(
                "max_body_bytes must be greater than 0",
            ));
        }

        if matches!(&self.server.admin_token, Some(token) if token.trim().is_empty()) {
            return Err(Error::config_validation(
                "admin_token cannot be empty; remove it to disable the admin endpoint",
            ));
        }

        if self.storage.busy_timeout_ms == 0 {
            return Err(Error::config_validation(
                "busy_timeout_ms must be greater than 0",
            ));
        }

        if self.storage.lock_timeout_ms == 0 {
            return Err(Error::config_validation(
                "lock_timeout_ms must be greater than 0",
            ));
        }

        if self.query.default_limit == 0 || self.query.default_limit > MAX_RECENT_LIMIT {
            return Err(Error::config_validation(format!(
                "default_limit ({}) must be between 1 and {MAX_RECENT_LIMIT}",
                self.query.default_limit
            )));
        }

        Ok(())
    }

    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not a valid socket address.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        self.server.bind_address.parse().map_err(|_| {
            Error::config_validation(format!(
                "invalid bind_address: {}",
                self.server.bind_address
            ))
        })
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the busy timeout as a Duration.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.busy_timeout_ms)
    }

    /// Get the lock timeout as a Duration.
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.lock_timeout_ms)
    }
}
