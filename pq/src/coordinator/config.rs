//! Coordinator configuration and validation

use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-2";
pub const DEFAULT_MAX_RETRIES: i64 = 3;
pub const DEFAULT_TIMEOUT_MS: i64 = 30_000;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: i64 = 50;

/// Lowest accepted per-attempt timeout
pub const MIN_TIMEOUT_MS: i64 = 1000;

/// A single violated configuration constraint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("API credential is required")]
    MissingCredential,

    #[error("max-retries must be >= 0 (got {0})")]
    NegativeRetries(i64),

    #[error("timeout-ms must be >= {MIN_TIMEOUT_MS}ms (got {0})")]
    TimeoutTooLow(i64),

    #[error("rate-limit-per-minute must be >= 1 (got {0})")]
    RateLimitTooLow(i64),
}

/// Coordinator settings before defaults are applied
///
/// Numeric fields are signed so that out-of-range values survive parsing and
/// are reported by [`validate_config`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialCoordinatorConfig {
    #[serde(rename = "api-key", skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,

    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    #[serde(rename = "max-retries")]
    pub max_retries: Option<i64>,

    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<i64>,

    #[serde(rename = "rate-limit-per-minute")]
    pub rate_limit_per_minute: Option<i64>,

    #[serde(rename = "default-model")]
    pub default_model: Option<String>,
}

/// Validated coordinator configuration, immutable once built
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorConfig {
    #[serde(rename = "api-key", serialize_with = "redact")]
    credential: String,

    #[serde(rename = "base-url")]
    base_url: String,

    #[serde(rename = "max-retries")]
    max_retries: u32,

    #[serde(rename = "timeout-ms")]
    timeout_ms: u64,

    #[serde(rename = "rate-limit-per-minute")]
    rate_limit_per_minute: u32,

    #[serde(rename = "default-model")]
    default_model: String,
}

fn redact<S: Serializer>(credential: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&mask(credential))
}

fn mask(credential: &str) -> String {
    let tail: String = credential.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if credential.chars().count() > 8 {
        format!("****{}", tail)
    } else {
        "****".to_string()
    }
}

impl std::fmt::Debug for CoordinatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorConfig")
            .field("credential", &mask(&self.credential))
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("timeout_ms", &self.timeout_ms)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Merge a partial configuration over the defaults and check every constraint
///
/// Constraints are checked in order (credential, retries, timeout, rate limit)
/// and the first violation is returned.
pub fn validate_config(partial: PartialCoordinatorConfig) -> Result<CoordinatorConfig, ConfigError> {
    debug!("validate_config: called");

    let credential = partial
        .credential
        .filter(|c| !c.trim().is_empty())
        .ok_or(ConfigError::MissingCredential)?;

    let max_retries = partial.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
    if max_retries < 0 {
        debug!(max_retries, "validate_config: negative retries");
        return Err(ConfigError::NegativeRetries(max_retries));
    }

    let timeout_ms = partial.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    if timeout_ms < MIN_TIMEOUT_MS {
        debug!(timeout_ms, "validate_config: timeout below floor");
        return Err(ConfigError::TimeoutTooLow(timeout_ms));
    }

    let rate_limit_per_minute = partial.rate_limit_per_minute.unwrap_or(DEFAULT_RATE_LIMIT_PER_MINUTE);
    if rate_limit_per_minute < 1 {
        debug!(rate_limit_per_minute, "validate_config: rate limit below 1");
        return Err(ConfigError::RateLimitTooLow(rate_limit_per_minute));
    }

    let base_url = partial
        .base_url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let default_model = partial
        .default_model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    Ok(CoordinatorConfig {
        credential,
        base_url: base_url.trim_end_matches('/').to_string(),
        max_retries: u32::try_from(max_retries).unwrap_or(u32::MAX),
        timeout_ms: timeout_ms as u64,
        rate_limit_per_minute: u32::try_from(rate_limit_per_minute).unwrap_or(u32::MAX),
        default_model,
    })
}

impl CoordinatorConfig {
    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Per-attempt transport timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay enforced after each completion: one minute divided by the rate limit
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_secs(60) / self.rate_limit_per_minute
    }
}
