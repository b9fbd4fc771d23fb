//! Configuration management for resqlink.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "resqlink";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "resqlink.db";

/// Secret shipped in the defaults; `serve` warns when it is still in use.
pub const DEVELOPMENT_JWT_SECRET: &str = "resqlink-development-secret";

/// Placeholder printed instead of the signing secret.
const REDACTED: &str = "[redacted]";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `RESQLINK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/resqlink/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Inventory ledger configuration.
    pub inventory: InventoryConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API listens on.
    pub bind_address: String,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/resqlink/resqlink.db`
    pub database_path: Option<PathBuf>,
}

/// Authentication configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign login tokens.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: u32,
}

/// Inventory ledger configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Low-stock threshold given to newly created inventory lines.
    pub default_minimum_threshold: u32,
    /// A line expires "soon" when its expiry date is within this many days.
    pub expiring_soon_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_minimum_threshold: 10,
            expiring_soon_days: 30,
        }
    }
}

impl InventoryConfig {
    /// The expiring-soon window as a duration.
    #[must_use]
    pub fn expiring_soon_window(&self) -> Duration {
        Duration::days(i64::from(self.expiring_soon_days))
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

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("RESQLINK_").split("__"));

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
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid bind_address: {}", self.server.bind_address),
            });
        }

        if self.server.max_body_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "max_body_bytes must be greater than 0".to_string(),
            });
        }

        if self.auth.jwt_secret.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "jwt_secret must not be empty".to_string(),
            });
        }

        if self.auth.token_ttl_hours == 0 {
            return Err(Error::ConfigValidation {
                message: "token_ttl_hours must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Whether the signing secret is still the shipped development value.
    #[must_use]
    pub fn uses_development_secret(&self) -> bool {
        self.auth.jwt_secret == DEVELOPMENT_JWT_SECRET
    }

    /// Copy safe to print: the signing secret is masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        shown.auth.jwt_secret = REDACTED.to_string();
        shown
    }
}
