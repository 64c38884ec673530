//! Configuration file loading
//!
//! The file holds a partial coordinator configuration; the credential may come
//! from the environment. Validation happens in
//! [`validate_config`](crate::coordinator::validate_config).

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::admission::AdmissionThrottle;
use crate::coordinator::{ConfigError, CoordinatorConfig, PartialCoordinatorConfig, validate_config};

/// Environment variable read for the credential by default
pub const DEFAULT_API_KEY_ENV: &str = "CLAUDE_API_KEY";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coordinator settings; unset fields take their defaults
    #[serde(flatten)]
    pub coordinator: PartialCoordinatorConfig,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Per-caller submissions allowed per minute; defaults to `rate-limit-per-minute`
    #[serde(rename = "admission-limit-per-minute", skip_serializing_if = "Option::is_none")]
    pub admission_limit_per_minute: Option<i64>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coordinator: PartialCoordinatorConfig::default(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            admission_limit_per_minute: None,
            log_level: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .pacequeue.yml
        let local_config = PathBuf::from(".pacequeue.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/pacequeue/pacequeue.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pacequeue").join("pacequeue.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Credential from the file, falling back to the environment
    pub fn resolve_credential(&self) -> Option<String> {
        self.coordinator
            .credential
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
    }

    /// Validated coordinator configuration
    pub fn coordinator_config(&self) -> Result<CoordinatorConfig, ConfigError> {
        let partial = PartialCoordinatorConfig {
            credential: self.resolve_credential(),
            ..self.coordinator.clone()
        };
        validate_config(partial)
    }

    /// Per-caller admission limit, falling back to the outbound rate limit
    pub fn admission_limit(&self) -> Result<usize> {
        let limit = match self.admission_limit_per_minute {
            Some(limit) => limit,
            None => i64::from(self.coordinator_config()?.rate_limit_per_minute()),
        };
        if limit < 1 {
            return Err(eyre::eyre!("admission-limit-per-minute must be >= 1 (got {})", limit));
        }
        Ok(limit as usize)
    }

    /// Inbound throttle for the gateway
    pub fn admission_throttle(&self) -> Result<AdmissionThrottle> {
        Ok(AdmissionThrottle::per_minute(self.admission_limit()?))
    }
}
