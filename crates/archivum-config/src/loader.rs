//! Configuration loading
//!
//! Precedence: defaults < config file < environment. Command-line
//! overrides are applied by the caller on the returned value.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{AncestryFields, ConfigError, ConfigResult, QueryLimits};

/// Environment variable overriding `limits.max_request_size`
pub const ENV_MAX_REQUEST_SIZE: &str = "ARCHIVUM_MAX_REQUEST_SIZE";
/// Environment variable overriding `limits.max_nesting_depth`
pub const ENV_MAX_NESTING_DEPTH: &str = "ARCHIVUM_MAX_NESTING_DEPTH";
/// Environment variable overriding `limits.default_limit`
pub const ENV_DEFAULT_LIMIT: &str = "ARCHIVUM_DEFAULT_LIMIT";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivumConfig {
    /// Request limits
    #[serde(default)]
    pub limits: QueryLimits,

    /// Ancestry field names
    #[serde(default)]
    pub ancestry: AncestryFields,
}

impl ArchivumConfig {
    /// Load configuration with precedence: defaults < file < env
    ///
    /// When `config_file` is `None` the default location is used if it
    /// exists. A missing default file is not an error; a missing explicit
    /// file is.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Ok(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("archivum");
        Ok(config_dir.join("config.toml"))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        if let Some(size) = env_number(ENV_MAX_REQUEST_SIZE)? {
            self.limits.max_request_size = size;
        }
        if let Some(depth) = env_number(ENV_MAX_NESTING_DEPTH)? {
            self.limits.max_nesting_depth = depth;
        }
        if let Some(limit) = env_number(ENV_DEFAULT_LIMIT)? {
            self.limits.default_limit = limit;
        }
        Ok(())
    }

    /// Validate limits and field names
    pub fn validate(&self) -> ConfigResult<()> {
        self.limits.validate()?;
        self.ancestry.validate()
    }

    /// Display the current configuration as TOML
    pub fn display_as_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config as TOML")
    }

    /// Display the current configuration as JSON
    pub fn display_as_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config as JSON")
    }
}

fn env_number<T: std::str::FromStr>(var: &'static str) -> ConfigResult<Option<T>> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}
