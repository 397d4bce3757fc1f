// crates/policy-rules-config/src/config.rs
// ============================================================================
// Module: Policy Rules Configuration
// Description: Configuration loading and validation for the rule store.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: policy-rules-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The file path is taken from the caller, then the `POLICY_RULES_CONFIG`
//! environment variable, then `policy-rules.toml` in the working directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use policy_rules_store_sqlite::SqliteAdapter;
use policy_rules_store_sqlite::SqliteAdapterConfig;
use policy_rules_store_sqlite::SqliteAdapterError;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "policy-rules.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "POLICY_RULES_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Top-level `policy-rules.toml` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyRulesConfig {
    /// Rule store settings.
    pub store: SqliteAdapterConfig,
}

impl PolicyRulesConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the store settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store
            .validate()
            .map(|_| ())
            .map_err(|err| ConfigError::Invalid(format!("store: {err}")))
    }

    /// Opens the configured rule store adapter.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError`] when the database cannot be opened.
    pub fn open_adapter(&self) -> Result<SqliteAdapter, SqliteAdapterError> {
        SqliteAdapter::new(self.store.clone())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use policy_rules_store_sqlite::SqliteJournalMode;
    use policy_rules_store_sqlite::SqliteSyncMode;

    use super::*;
    use crate::examples::config_toml_example;

    #[test]
    fn explicit_path_wins() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }

    #[test]
    fn validate_path_rejects_long_component() {
        let path = PathBuf::from(format!("dir/{}.toml", "a".repeat(300)));
        let err = validate_path(&path).unwrap_err();
        assert!(err.to_string().contains("component too long"));
    }

    #[test]
    fn store_defaults_apply() {
        let config = PolicyRulesConfig::from_toml_str("[store]\nconnection = \":memory:\"\n").unwrap();
        assert_eq!(config.store.busy_timeout_ms, 5_000);
        assert_eq!(config.store.journal_mode, SqliteJournalMode::Wal);
        assert_eq!(config.store.sync_mode, SqliteSyncMode::Full);
        assert!(!config.store.filtered);
    }

    #[test]
    fn missing_store_section_is_a_parse_error() {
        let err = PolicyRulesConfig::from_toml_str("").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_journal_mode_is_a_parse_error() {
        let err = PolicyRulesConfig::from_toml_str(
            "[store]\nconnection = \":memory:\"\njournal_mode = \"truncate\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn foreign_scheme_is_invalid() {
        let err = PolicyRulesConfig::from_toml_str(
            "[store]\nconnection = \"postgres://localhost/rules\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.starts_with("store:")));
    }

    #[test]
    fn zero_busy_timeout_is_invalid() {
        let err = PolicyRulesConfig::from_toml_str(
            "[store]\nconnection = \":memory:\"\nbusy_timeout_ms = 0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn example_config_parses() {
        let config = PolicyRulesConfig::from_toml_str(&config_toml_example()).unwrap();
        assert_eq!(config.store.connection, "sqlite://policy-rules.db");
    }
}
