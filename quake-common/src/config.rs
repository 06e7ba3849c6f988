//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error. A TOML file that exists but cannot be
//! parsed is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the database path
pub const ENV_DATABASE: &str = "QUAKE_API_DATABASE";
/// Environment variable overriding the listen address
pub const ENV_BIND: &str = "QUAKE_API_BIND";
/// Environment variable overriding the store query timeout (seconds)
pub const ENV_QUERY_TIMEOUT: &str = "QUAKE_API_QUERY_TIMEOUT";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const APP_DIR: &str = "quake-api";
const DATABASE_FILE: &str = "quake.db";

/// Contents of `config.toml`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub query_timeout_secs: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load a config file; `Ok(None)` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map(Some)
    }

    /// Load the config file at `path`, if any, and report where the TOML
    /// layer came from
    ///
    /// Logs nothing; call `ConfigSource::log` once tracing is installed.
    pub fn load_optional(path: Option<PathBuf>) -> Result<(Option<Self>, ConfigSource)> {
        let Some(path) = path else {
            return Ok((None, ConfigSource::Defaults));
        };
        match Self::load(&path)? {
            Some(config) => Ok((Some(config), ConfigSource::File(path))),
            None => Ok((None, ConfigSource::Missing(path))),
        }
    }
}

/// Origin of the TOML layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// This file was named but does not exist
    Missing(PathBuf),
    /// No config file was named or found
    Defaults,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config file: {}", path.display()),
            ConfigSource::Missing(path) => {
                warn!("Config file not found: {} (using defaults)", path.display())
            }
            ConfigSource::Defaults => info!("No config file; using environment and defaults"),
        }
    }
}

/// Settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub query_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub query_timeout: Duration,
    pub log_level: String,
}

impl ServiceConfig {
    /// Resolve every setting from CLI overrides, environment, TOML and defaults
    pub fn resolve(overrides: ConfigOverrides, toml_config: Option<TomlConfig>) -> Result<Self> {
        let toml_config = toml_config.unwrap_or_default();

        let database_path = overrides
            .database_path
            .or_else(|| std::env::var(ENV_DATABASE).ok().map(PathBuf::from))
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        let bind_address = overrides
            .bind_address
            .or_else(|| std::env::var(ENV_BIND).ok())
            .or(toml_config.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let env_timeout = match std::env::var(ENV_QUERY_TIMEOUT) {
            Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("{} must be a whole number of seconds: {}", ENV_QUERY_TIMEOUT, raw))
            })?),
            Err(_) => None,
        };

        let query_timeout_secs = overrides
            .query_timeout_secs
            .or(env_timeout)
            .or(toml_config.query_timeout_secs)
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS);

        if query_timeout_secs == 0 {
            return Err(Error::Config("query timeout must be at least 1 second".to_string()));
        }

        let log_level = overrides.log_level.unwrap_or(toml_config.logging.level);

        Ok(Self {
            database_path,
            bind_address,
            query_timeout: Duration::from_secs(query_timeout_secs),
            log_level,
        })
    }
}

/// Locate the default config file
///
/// Tries `~/.config/quake-api/config.toml`, then `/etc/quake-api/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
    system_config.exists().then_some(system_config)
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}
