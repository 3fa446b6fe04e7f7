// crates/synclite-core/src/runtime/version.rs
// ============================================================================
// Module: Schema Version Tracker
// Description: Reads and writes the store's recorded schema version.
// Purpose: Keep the version in the same transactional store as the schema.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! The schema version is a single row in `store_meta`. A store that has never
//! recorded a version (no table, or an empty table) is at version 0. Writes
//! happen only inside the runner's transaction, as its last statement, so the
//! version can never commit without the schema change it describes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::interfaces::RowStore;
use crate::interfaces::RowTransaction;
use crate::interfaces::SqlValue;
use crate::runtime::runner::MigrationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Table holding the schema version row.
const VERSION_TABLE: &str = "store_meta";

// ============================================================================
// SECTION: Tracker
// ============================================================================

/// Accessor for the persisted schema version.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaVersionTracker;

impl SchemaVersionTracker {
    /// Reads the recorded schema version, 0 for a fresh store.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] when the query fails or the stored value is
    /// outside the valid version range.
    pub fn read(tx: &mut dyn RowTransaction) -> Result<u32, MigrationError> {
        if !tx.table_exists(VERSION_TABLE)? {
            return Ok(0);
        }
        let Some(raw) = tx.query_i64("SELECT MAX(version) FROM store_meta", &[])? else {
            return Ok(0);
        };
        u32::try_from(raw)
            .map_err(|_| MigrationError::Corrupt(format!("schema version out of range: {raw}")))
    }

    /// Persists `version` as the current schema version.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::VersionRegression`] when `version` is lower
    /// than the recorded version, or a store error when the write fails.
    pub fn write(tx: &mut dyn RowTransaction, version: u32) -> Result<(), MigrationError> {
        let recorded = Self::read(tx)?;
        if version < recorded {
            return Err(MigrationError::VersionRegression {
                recorded,
                requested: version,
            });
        }
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);
             DELETE FROM store_meta;",
        )?;
        tx.execute("INSERT INTO store_meta (version) VALUES (?1)", &[SqlValue::from(version)])?;
        Ok(())
    }

    /// Reads the recorded version in a throwaway transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] when the transaction or query fails.
    pub fn read_current(store: &mut dyn RowStore) -> Result<u32, MigrationError> {
        let mut tx = store.begin()?;
        Self::read(&mut *tx)
    }
}
