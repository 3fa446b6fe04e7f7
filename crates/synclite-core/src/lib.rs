// crates/synclite-core/src/lib.rs
// ============================================================================
// Module: Synclite Core Library
// Description: Public API surface for the local sync cache schema engine.
// Purpose: Expose identifiers, the row store contract, and the migration runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Synclite core owns the versioned schema of the local sync cache: the
//! ordered migration catalog, the runner that applies it atomically, and the
//! schema version tracker. Storage is reached only through the
//! [`RowStore`] / [`RowTransaction`] contract so the engine stays backend
//! agnostic. Store naming and the functions endpoint formatter live here as
//! pure helpers the host composes before opening a store.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::RowStore;
pub use interfaces::RowStoreError;
pub use interfaces::RowTransaction;
pub use interfaces::SqlValue;
pub use runtime::CatalogError;
pub use runtime::MigrationCatalog;
pub use runtime::MigrationError;
pub use runtime::MigrationFn;
pub use runtime::MigrationReport;
pub use runtime::MigrationRunner;
pub use runtime::MigrationStep;
pub use runtime::SchemaVersionTracker;
