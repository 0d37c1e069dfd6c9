//! Client settings and their validation

use std::path::PathBuf;
use std::time::Duration;

use adreach_common::resilience::retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_JITTER,
};
use adreach_common::resilience::{ExponentialBackoff, Tier};
use adreach_domain::constants::{ACCOUNT_ID_PREFIX, DEFAULT_API_VERSION, DEFAULT_GRAPH_URL};
use serde::Deserialize;
use thiserror::Error;

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("No config file found in any of the standard locations")]
    NoConfigFile,

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {format} format: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Exponential backoff parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryTuning {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryTuning {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryTuning {
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.base_delay, self.max_delay, self.max_jitter)
    }
}

/// Everything the API client needs except the access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub graph_url: String,
    pub api_version: String,
    /// Ad account id, always `act_`-prefixed once normalised
    pub account_id: String,
    pub tier: Tier,
    pub timeout: Duration,
    pub allow_mutations: bool,
    pub retry: RetryTuning,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            graph_url: DEFAULT_GRAPH_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            account_id: String::new(),
            tier: Tier::default(),
            timeout: Duration::from_secs(30),
            allow_mutations: false,
            retry: RetryTuning::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults plus the given account id
    pub fn for_account(account_id: &str) -> Self {
        Self { account_id: normalize_account_id(account_id), ..Self::default() }
    }

    /// Reject settings the client cannot run with.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account_id.trim().is_empty() || self.account_id == ACCOUNT_ID_PREFIX {
            return Err(ConfigError::Invalid("account_id must not be empty".into()));
        }
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::Invalid("api_version must not be empty".into()));
        }
        if self.graph_url.trim().is_empty() {
            return Err(ConfigError::Invalid("graph_url must not be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be greater than zero".into()));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(ConfigError::Invalid(format!(
                "retry base_delay ({:?}) exceeds max_delay ({:?})",
                self.retry.base_delay, self.retry.max_delay
            )));
        }
        Ok(())
    }
}

/// Prefix a bare ad account id with `act_`
pub fn normalize_account_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with(ACCOUNT_ID_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{ACCOUNT_ID_PREFIX}{trimmed}")
    }
}

/// On-disk shape; every field optional so files can stay small
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    graph_url: Option<String>,
    api_version: Option<String>,
    account_id: Option<String>,
    tier: Option<String>,
    timeout_secs: Option<u64>,
    allow_mutations: Option<bool>,
    #[serde(default)]
    retry: FileRetry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileRetry {
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    max_jitter_ms: Option<u64>,
}

impl FileConfig {
    pub(crate) fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let defaults = ClientConfig::default();
        let tier = match self.tier {
            Some(raw) => raw
                .parse::<Tier>()
                .map_err(|message| ConfigError::InvalidValue { key: "tier".into(), message })?,
            None => defaults.tier,
        };

        let ms = |value: Option<u64>, fallback: Duration| {
            value.map_or(fallback, Duration::from_millis)
        };

        Ok(ClientConfig {
            graph_url: self.graph_url.unwrap_or(defaults.graph_url),
            api_version: self.api_version.unwrap_or(defaults.api_version),
            account_id: self.account_id.as_deref().map(normalize_account_id).unwrap_or_default(),
            tier,
            timeout: self.timeout_secs.map_or(defaults.timeout, Duration::from_secs),
            allow_mutations: self.allow_mutations.unwrap_or(defaults.allow_mutations),
            retry: RetryTuning {
                base_delay: ms(self.retry.base_delay_ms, defaults.retry.base_delay),
                max_delay: ms(self.retry.max_delay_ms, defaults.retry.max_delay),
                max_jitter: ms(self.retry.max_jitter_ms, defaults.retry.max_jitter),
            },
        })
    }
}
