// crates/synclite-config/tests/config_load.rs
// ============================================================================
// Module: Config Loading Tests
// Description: File loading, defaults, and fail-closed validation.
// Purpose: Ensure synclite.toml is parsed strictly.
// ============================================================================

//! ## Overview
//! Loads configuration files from temporary directories and checks that
//! defaults are applied and invalid input is rejected.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::PathBuf;

use synclite_config::ConfigError;
use synclite_config::MAX_CONFIG_FILE_SIZE;
use synclite_config::SyncliteConfig;
use synclite_core::resolve_store_name;
use synclite_store_sqlite::JournalMode;
use synclite_store_sqlite::SyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const MINIMAL: &str = r#"
[store]
directory = "./data"

[identity]
project_id = "my-project"
"#;

fn write_config(temp: &TempDir, content: &str) -> PathBuf {
    let path = temp.path().join("synclite.toml");
    fs::write(&path, content).unwrap();
    path
}

fn invalid_message(content: &str) -> String {
    match SyncliteConfig::from_toml_str(content) {
        Err(ConfigError::Invalid(message)) => message,
        other => panic!("expected invalid config, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn minimal_config_applies_defaults() {
    let temp = TempDir::new().unwrap();
    let config = SyncliteConfig::load(Some(&write_config(&temp, MINIMAL))).unwrap();
    assert_eq!(config.store.busy_timeout_ms, 5_000);
    assert_eq!(config.store.journal_mode, JournalMode::Wal);
    assert_eq!(config.store.sync_mode, SyncMode::Full);
    assert_eq!(config.identity.persistence_key, "[DEFAULT]");
    assert!(config.database_id().is_default_database());
    assert_eq!(config.functions.region, None);
    assert_eq!(
        resolve_store_name(&config.persistence_key(), &config.database_id()),
        "firestore.%5BDEFAULT%5D.my-project.%28default%29"
    );
}

#[test]
fn full_config_round_trips_every_section() {
    let config = SyncliteConfig::from_toml_str(
        r#"
[store]
directory = "/var/lib/app"
busy_timeout_ms = 250
journal_mode = "delete"
sync_mode = "normal"

[identity]
persistence_key = "secondary"
project_id = "my-project"
database_id = "my-database"

[functions]
region = "europe-west1"
"#,
    )
    .unwrap();
    assert_eq!(config.store.journal_mode, JournalMode::Delete);
    assert_eq!(config.store.sync_mode, SyncMode::Normal);
    assert_eq!(config.database_id().database_id(), "my-database");
    assert_eq!(config.persistence_key().as_str(), "secondary");
    assert_eq!(config.functions.region.as_deref(), Some("europe-west1"));
}

#[test]
fn unknown_keys_are_rejected() {
    let content = format!("{MINIMAL}\nextra = true\n");
    assert!(matches!(SyncliteConfig::from_toml_str(&content), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_project_is_rejected() {
    let result = SyncliteConfig::from_toml_str("[store]\ndirectory = \"./data\"\n[identity]\n");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn blank_identity_fields_are_rejected() {
    let message = invalid_message(
        "[store]\ndirectory = \"./data\"\n[identity]\nproject_id = \"  \"\n",
    );
    assert!(message.contains("identity.project_id"));
}

#[test]
fn identity_with_overlong_store_name_is_rejected() {
    let project = "[".repeat(200);
    let message = invalid_message(&format!(
        "[store]\ndirectory = \"./data\"\n[identity]\nproject_id = \"{project}\"\n"
    ));
    assert!(message.contains("store file name"));
}

#[test]
fn busy_timeout_bounds_are_enforced() {
    let message = invalid_message(
        "[store]\ndirectory = \"./data\"\nbusy_timeout_ms = 0\n[identity]\nproject_id = \"p\"\n",
    );
    assert!(message.contains("busy_timeout_ms"));
}

#[test]
fn malformed_region_is_rejected() {
    let content = format!("{MINIMAL}\n[functions]\nregion = \"Europe West\"\n");
    let message = invalid_message(&content);
    assert!(message.contains("functions.region"));
}

#[test]
fn oversized_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let padding = "#".repeat(MAX_CONFIG_FILE_SIZE);
    let path = write_config(&temp, &format!("{MINIMAL}\n{padding}\n"));
    let err = SyncliteConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = SyncliteConfig::load(Some(&temp.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
