// crates/synclite-config/src/config.rs
// ============================================================================
// Module: Synclite Configuration
// Description: Configuration loading and validation for synclite hosts.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: synclite-core, synclite-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The file names the store directory and pragmas, the store identity used to
//! derive the store file name, and the functions region. Unknown keys and
//! empty identities are rejected rather than defaulted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use synclite_core::DEFAULT_DATABASE_ID;
use synclite_core::DEFAULT_PERSISTENCE_KEY;
use synclite_core::DatabaseId;
use synclite_core::PersistenceKey;
use synclite_core::ProjectId;
use synclite_core::resolve_store_name;
use synclite_store_sqlite::SqliteStoreConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "synclite.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SYNCLITE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of an identity field.
const MAX_IDENTITY_LENGTH: usize = 256;
/// Maximum length of a functions region.
const MAX_REGION_LENGTH: usize = 63;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root synclite configuration.
///
/// # Invariants
/// - A loaded config has passed [`SyncliteConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncliteConfig {
    /// Store directory and `SQLite` pragmas.
    pub store: SqliteStoreConfig,
    /// Store identity.
    pub identity: IdentityConfig,
    /// Functions endpoint settings.
    #[serde(default)]
    pub functions: FunctionsConfig,
}

/// Store identity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Application instance key.
    #[serde(default = "default_persistence_key")]
    pub persistence_key: String,
    /// Backend project id.
    pub project_id: String,
    /// Database id within the project.
    #[serde(default = "default_database_id")]
    pub database_id: String,
}

/// Functions endpoint settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionsConfig {
    /// Deployment region; the default region is used when unset.
    #[serde(default)]
    pub region: Option<String>,
}

impl SyncliteConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is `path` when given, else `SYNCLITE_CONFIG`, else
    /// `synclite.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = config_file_path(path)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.directory", &self.store.directory.to_string_lossy())?;
        self.store.validate().map_err(|err| ConfigError::Invalid(err.to_string()))?;
        self.identity.validate()?;
        let store_name = resolve_store_name(&self.persistence_key(), &self.database_id());
        if store_name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "identity resolves to a store file name of {} bytes (max {MAX_PATH_COMPONENT_LENGTH})",
                store_name.len()
            )));
        }
        self.functions.validate()
    }

    /// Returns the configured persistence key.
    #[must_use]
    pub fn persistence_key(&self) -> PersistenceKey {
        PersistenceKey::new(self.identity.persistence_key.as_str())
    }

    /// Returns the configured database id.
    #[must_use]
    pub fn database_id(&self) -> DatabaseId {
        DatabaseId::named(
            ProjectId::new(self.identity.project_id.as_str()),
            self.identity.database_id.as_str(),
        )
    }

    /// Returns the store settings.
    #[must_use]
    pub const fn store_config(&self) -> &SqliteStoreConfig {
        &self.store
    }
}

impl IdentityConfig {
    /// Validates identity fields.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_identity_field("identity.persistence_key", &self.persistence_key)?;
        validate_identity_field("identity.project_id", &self.project_id)?;
        validate_identity_field("identity.database_id", &self.database_id)
    }
}

impl FunctionsConfig {
    /// Validates the region label.
    fn validate(&self) -> Result<(), ConfigError> {
        let Some(region) = &self.region else {
            return Ok(());
        };
        if region.is_empty() || region.len() > MAX_REGION_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "functions.region must be 1..={MAX_REGION_LENGTH} characters"
            )));
        }
        if !region.bytes().all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-')
        {
            return Err(ConfigError::Invalid(
                "functions.region must contain only lowercase letters, digits, and '-'".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the default persistence key.
fn default_persistence_key() -> String {
    DEFAULT_PERSISTENCE_KEY.to_string()
}

/// Returns the default database id.
fn default_database_id() -> String {
    DEFAULT_DATABASE_ID.to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
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

/// Picks the config file: explicit path, then `SYNCLITE_CONFIG`, then
/// `synclite.toml`.
fn config_file_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let (source, resolved) = match path {
        Some(path) => ("--config", path.to_path_buf()),
        None => match env::var_os(CONFIG_ENV_VAR) {
            Some(value) => (CONFIG_ENV_VAR, PathBuf::from(value)),
            None => return Ok(PathBuf::from(DEFAULT_CONFIG_NAME)),
        },
    };
    check_path_limits(source, &resolved)?;
    Ok(resolved)
}

/// Validates a configured store directory string.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    check_path_limits(field, Path::new(trimmed))
}

/// Rejects paths the store layout cannot hold: a total over 4096 bytes or a
/// single segment over 255 bytes.
fn check_path_limits(field: &str, path: &Path) -> Result<(), ConfigError> {
    let total = path.as_os_str().len();
    if total > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} is {total} bytes (max {MAX_TOTAL_PATH_LENGTH})"
        )));
    }
    if let Some(segment) =
        path.components().find(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(ConfigError::Invalid(format!(
            "{field} segment `{}` exceeds {MAX_PATH_COMPONENT_LENGTH} bytes",
            segment.as_os_str().to_string_lossy()
        )));
    }
    Ok(())
}

/// Validates a non-empty, bounded identity field.
fn validate_identity_field(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_IDENTITY_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds max length {MAX_IDENTITY_LENGTH}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::MAX_PATH_COMPONENT_LENGTH;
    use super::check_path_limits;
    use super::config_file_path;
    use super::validate_identity_field;
    use super::validate_path_string;

    #[test]
    fn path_string_rejects_whitespace_only() {
        assert!(validate_path_string("store.directory", "   ").is_err());
    }

    #[test]
    fn path_string_rejects_long_component() {
        let path = format!("./{}", "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        assert!(validate_path_string("store.directory", &path).is_err());
    }

    #[test]
    fn path_string_accepts_nested_directory() {
        assert!(validate_path_string("store.directory", "./var/synclite").is_ok());
    }

    #[test]
    fn explicit_config_path_names_its_source_when_too_long() {
        let path = format!("cfg/{}.toml", "c".repeat(MAX_PATH_COMPONENT_LENGTH));
        let Err(err) = config_file_path(Some(Path::new(&path))) else {
            unreachable!("overlong segment must fail");
        };
        let message = err.to_string();
        assert!(message.contains("--config"));
        assert!(message.contains("exceeds 255 bytes"));
    }

    #[test]
    fn path_limits_report_total_length() {
        let path = "d/".repeat(2100);
        let Err(err) = check_path_limits("store.directory", Path::new(&path)) else {
            unreachable!("overlong path must fail");
        };
        assert!(err.to_string().contains("store.directory is 4200 bytes"));
    }

    #[test]
    fn identity_field_rejects_blank() {
        let Err(err) = validate_identity_field("identity.project_id", " ") else {
            unreachable!("blank identity must fail");
        };
        assert!(err.to_string().contains("non-empty"));
    }
}
