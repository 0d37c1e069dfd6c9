//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the account id is not set there, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `META_AD_ACCOUNT_ID`: Ad account id, with or without `act_` (required)
//! - `META_GRAPH_URL`: Graph API base URL
//! - `META_API_VERSION`: API version segment, e.g. `v23.0`
//! - `META_API_TIER`: `development` or `standard`
//! - `META_REQUEST_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `ALLOW_MUTATIONS`: Enables write operations (`1`/`true`)
//!
//! The access token is not configuration; see
//! [`EnvTokenProvider`](crate::api::EnvTokenProvider).
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./adreach.toml`, `./adreach.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent directory

use std::path::{Path, PathBuf};
use std::time::Duration;

use adreach_common::resilience::Tier;

use super::settings::{ClientConfig, ConfigError, FileConfig};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["adreach.toml", "adreach.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns [`ConfigError`] if neither source yields a valid configuration.
pub fn load() -> Result<ClientConfig, ConfigError> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(ConfigError::MissingVar(var)) => {
            tracing::debug!(%var, "Environment incomplete, trying config file");
            load_from_file(None)
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from environment variables
///
/// Only `META_AD_ACCOUNT_ID` is required; everything else has a default.
///
/// # Errors
/// Returns [`ConfigError::MissingVar`] when the account id is unset and
/// [`ConfigError::InvalidValue`] for unparseable values.
pub fn load_from_env() -> Result<ClientConfig, ConfigError> {
    let account_id = env_var("META_AD_ACCOUNT_ID")?;
    let mut config = ClientConfig::for_account(&account_id);

    if let Some(url) = env_opt("META_GRAPH_URL") {
        config.graph_url = url;
    }
    if let Some(version) = env_opt("META_API_VERSION") {
        config.api_version = version;
    }
    if let Some(tier) = env_opt("META_API_TIER") {
        config.tier = tier.parse::<Tier>().map_err(|message| ConfigError::InvalidValue {
            key: "META_API_TIER".into(),
            message,
        })?;
    }
    if let Some(secs) = env_opt("META_REQUEST_TIMEOUT_SECS") {
        let secs = secs.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
            key: "META_REQUEST_TIMEOUT_SECS".into(),
            message: e.to_string(),
        })?;
        config.timeout = Duration::from_secs(secs);
    }
    config.allow_mutations = env_bool("ALLOW_MUTATIONS", false);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns [`ConfigError`] if the file is missing, unreadable, malformed or
/// fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p));
            }
            p
        }
        None => probe_config_paths().ok_or(ConfigError::NoConfigFile)?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|source| ConfigError::Read { path: config_path.clone(), source })?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let raw: FileConfig = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConfigError::Parse { format: "TOML", message: e.to_string() })?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConfigError::Parse { format: "JSON", message: e.to_string() })?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };

    raw.into_config()
}

/// First existing config file in the working directory or its parent
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    probe_from(&cwd)
}

fn probe_from(dir: &Path) -> Option<PathBuf> {
    let parent = dir.parent();
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .chain(parent.into_iter().flat_map(|p| CONFIG_FILE_NAMES.iter().map(move |n| p.join(n))))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> Result<String, ConfigError> {
    env_opt(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
