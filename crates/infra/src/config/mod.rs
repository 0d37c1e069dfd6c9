//! Configuration loading and management
//!
//! This module provides [`ClientConfig`] and utilities for loading it from
//! environment variables and files.

pub mod loader;
pub mod settings;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
pub use settings::{normalize_account_id, ClientConfig, ConfigError, RetryTuning};
