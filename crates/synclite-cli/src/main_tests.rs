// crates/synclite-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and identity helpers.
// Purpose: Ensure CLI arguments map onto store identities correctly.
// Dependencies: synclite-cli main helpers
// ============================================================================

//! ## Overview
//! Parses argument vectors with clap and checks the identity helpers used by
//! `store-name`.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::Parser;

use super::Cli;
use super::Commands;
use super::StoreNameCommand;
use super::store_name_for;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_name_args(args: &[&str]) -> StoreNameCommand {
    let cli = Cli::try_parse_from(args).expect("parse args");
    match cli.command {
        Some(Commands::StoreName(command)) => command,
        other => panic!("unexpected command: {other:?}"),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn store_name_defaults_key_and_database() {
    let command = store_name_args(&["synclite", "store-name", "--project", "my-project"]);
    assert_eq!(command.key, "[DEFAULT]");
    assert_eq!(
        store_name_for(&command).unwrap(),
        "firestore.%5BDEFAULT%5D.my-project.%28default%29"
    );
}

#[test]
fn store_name_uses_named_database() {
    let command = store_name_args(&[
        "synclite",
        "store-name",
        "--project",
        "my-project",
        "--database",
        "my-database",
    ]);
    assert_eq!(store_name_for(&command).unwrap(), "firestore.%5BDEFAULT%5D.my-project.my-database");
}

#[test]
fn store_name_rejects_empty_database() {
    let command =
        store_name_args(&["synclite", "store-name", "--project", "p", "--database", ""]);
    assert!(store_name_for(&command).is_err());
}

#[test]
fn migrate_parses_target_version() {
    let cli = Cli::try_parse_from(["synclite", "migrate", "--to", "3"]).unwrap();
    match cli.command {
        Some(Commands::Migrate(command)) => {
            assert_eq!(command.to, Some(3));
            assert!(command.config.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn migrate_rejects_negative_version() {
    assert!(Cli::try_parse_from(["synclite", "migrate", "--to", "-1"]).is_err());
}
