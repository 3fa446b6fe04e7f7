// crates/synclite-core/src/runtime/mod.rs
// ============================================================================
// Module: Synclite Migration Runtime
// Description: Schema version tracking, migration catalog, and runner.
// Purpose: Upgrade a local store's schema atomically on open.
// Dependencies: crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! The runtime applies ordered schema migrations through the row store
//! contract. One runner call is one transaction: every selected step and the
//! final version write commit together or not at all.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod catalog;
pub mod runner;
pub mod schema;
pub mod version;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogError;
pub use catalog::MigrationCatalog;
pub use catalog::MigrationFn;
pub use catalog::MigrationStep;
pub use runner::MigrationError;
pub use runner::MigrationReport;
pub use runner::MigrationRunner;
pub use schema::standard_steps;
pub use version::SchemaVersionTracker;
