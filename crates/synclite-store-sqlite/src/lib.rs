// crates/synclite-store-sqlite/src/lib.rs
// ============================================================================
// Module: Synclite SQLite Store
// Description: SQLite row store adapter and local sync cache handle.
// Purpose: Provide the embedded persistence the migration engine upgrades.
// Dependencies: synclite-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate implements the [`synclite_core::RowStore`] contract on top of
//! `SQLite` and wraps it in [`SqliteLocalStore`], the handle a host opens at
//! startup. Opening resolves the store file name, applies durability pragmas,
//! and migrates the schema to the newest version before any other access.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod local;
pub mod mutations;
pub mod store;
pub mod targets;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use local::SqliteLocalStore;
pub use local::StoreStatus;
pub use mutations::MutationRecord;
pub use store::SqliteRowStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::JournalMode;
pub use store::SyncMode;
