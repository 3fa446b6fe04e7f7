// crates/synclite-store-sqlite/src/local.rs
// ============================================================================
// Module: Local Sync Cache Store
// Description: Open sequence and status for the local sync cache.
// Purpose: Resolve, open, and migrate a store before handing it to the host.
// Dependencies: synclite-core, rusqlite, serde, tracing
// ============================================================================

//! ## Overview
//! [`SqliteLocalStore::open`] is the only way a host obtains a store handle.
//! It resolves the file name from store identity, opens the file, and runs
//! every pending migration in one transaction. A migration failure fails the
//! open; nothing else is attempted and nothing is retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use rusqlite::OptionalExtension;
use serde::Serialize;
use synclite_core::DatabaseId;
use synclite_core::MigrationReport;
use synclite_core::MigrationRunner;
use synclite_core::PersistenceKey;
use synclite_core::SchemaVersionTracker;
use synclite_core::resolve_store_name;
use tracing::info;

use crate::store::SqliteRowStore;
use crate::store::SqliteStoreConfig;
use crate::store::SqliteStoreError;
use crate::store::db_error;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Snapshot of a store's schema and cache counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    /// Store file path.
    pub path: PathBuf,
    /// Recorded schema version.
    pub schema_version: u32,
    /// Newest schema version known to this build.
    pub latest_version: u32,
    /// Cached target count from target globals.
    pub target_count: i64,
    /// Highest target id ever allocated.
    pub highest_target_id: i64,
    /// Mutations awaiting acknowledgment across all owners.
    pub pending_mutations: i64,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Migrated local sync cache.
///
/// # Invariants
/// - The schema is at the runner's newest version for the lifetime of the handle.
#[derive(Debug)]
pub struct SqliteLocalStore {
    /// Row store holding the cache tables.
    row_store: SqliteRowStore,
    /// Resolved store file path.
    path: PathBuf,
    /// Outcome of the open-time migration.
    migration: MigrationReport,
    /// Newest schema version of the runner used at open.
    latest_version: u32,
}

impl SqliteLocalStore {
    /// Opens the store for an identity and migrates it to the newest schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the store cannot be opened or the
    /// migration fails.
    pub fn open(
        config: &SqliteStoreConfig,
        persistence_key: &PersistenceKey,
        database_id: &DatabaseId,
    ) -> Result<Self, SqliteStoreError> {
        Self::open_with_runner(config, persistence_key, database_id, &MigrationRunner::default())
    }

    /// Opens the store using a caller-supplied migration runner.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the store cannot be opened or the
    /// migration fails.
    pub fn open_with_runner(
        config: &SqliteStoreConfig,
        persistence_key: &PersistenceKey,
        database_id: &DatabaseId,
        runner: &MigrationRunner,
    ) -> Result<Self, SqliteStoreError> {
        let path = Self::store_path(config, persistence_key, database_id);
        let mut row_store = SqliteRowStore::open(&path, config)?;
        let migration = runner.run_migrations(&mut row_store)?;
        info!(
            path = %path.display(),
            from_version = migration.from_version,
            to_version = migration.to_version,
            "local store opened"
        );
        Ok(Self {
            row_store,
            path,
            migration,
            latest_version: runner.latest_version(),
        })
    }

    /// Returns the file path a store identity resolves to under `config`.
    #[must_use]
    pub fn store_path(
        config: &SqliteStoreConfig,
        persistence_key: &PersistenceKey,
        database_id: &DatabaseId,
    ) -> PathBuf {
        config.directory.join(resolve_store_name(persistence_key, database_id))
    }

    /// Returns the store file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the migration performed when the store was opened.
    #[must_use]
    pub const fn migration_report(&self) -> &MigrationReport {
        &self.migration
    }

    /// Returns the row store for direct reads.
    #[must_use]
    pub const fn row_store(&self) -> &SqliteRowStore {
        &self.row_store
    }

    /// Returns the row store for crate-local transactions.
    pub(crate) const fn row_store_mut(&mut self) -> &mut SqliteRowStore {
        &mut self.row_store
    }

    /// Reads the recorded schema version.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the version cannot be read.
    pub fn schema_version(&mut self) -> Result<u32, SqliteStoreError> {
        Ok(SchemaVersionTracker::read_current(&mut self.row_store)?)
    }

    /// Returns the schema and counter snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when any read fails.
    pub fn status(&mut self) -> Result<StoreStatus, SqliteStoreError> {
        let schema_version = self.schema_version()?;
        Ok(StoreStatus {
            path: self.path.clone(),
            schema_version,
            latest_version: self.latest_version,
            target_count: self.target_count()?,
            highest_target_id: self.highest_target_id()?,
            pending_mutations: self.pending_mutation_count()?,
        })
    }

    /// Reads one integer column from the target globals row.
    pub(crate) fn target_global(&self, column: TargetGlobal) -> Result<i64, SqliteStoreError> {
        let sql = match column {
            TargetGlobal::Count => "SELECT target_count FROM target_globals LIMIT 1",
            TargetGlobal::HighestTargetId => "SELECT highest_target_id FROM target_globals LIMIT 1",
        };
        let value: Option<Option<i64>> = self
            .row_store
            .connection()
            .query_row(sql, [], |row| row.get(0))
            .optional()
            .map_err(|err| db_error(&err))?;
        value.flatten().ok_or_else(|| {
            SqliteStoreError::Corrupt("target_globals row missing after migration".to_string())
        })
    }
}

/// Target globals columns readable through [`SqliteLocalStore::target_global`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum TargetGlobal {
    /// `target_count`.
    Count,
    /// `highest_target_id`.
    HighestTargetId,
}
