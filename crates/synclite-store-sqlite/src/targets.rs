// crates/synclite-store-sqlite/src/targets.rs
// ============================================================================
// Module: Target Cache Operations
// Description: Target registration that keeps target globals consistent.
// Purpose: Maintain `target_count == |targets|` outside of migrations.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! Every operation that changes `targets` updates `target_globals` in the
//! same transaction, so the counter the backfill migration introduced stays
//! exact. Removing a target also removes its document associations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::params;

use crate::local::SqliteLocalStore;
use crate::local::TargetGlobal;
use crate::store::SqliteStoreError;
use crate::store::db_error;

// ============================================================================
// SECTION: Operations
// ============================================================================

impl SqliteLocalStore {
    /// Registers a target and bumps the target counters.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the target id is taken, or a
    /// database error.
    pub fn add_target(&mut self, target_id: i64, canonical_id: &str) -> Result<(), SqliteStoreError> {
        let tx = self.row_store_mut().connection_mut().transaction().map_err(|err| db_error(&err))?;
        tx.execute(
            "INSERT INTO targets (target_id, canonical_id) VALUES (?1, ?2)",
            params![target_id, canonical_id],
        )
        .map_err(|err| db_error(&err))?;
        tx.execute(
            "UPDATE target_globals SET
                 target_count = target_count + 1,
                 highest_target_id = MAX(COALESCE(highest_target_id, 0), ?1)",
            params![target_id],
        )
        .map_err(|err| db_error(&err))?;
        tx.commit().map_err(|err| db_error(&err))
    }

    /// Removes a target and its document associations.
    ///
    /// Returns false when the target was not cached.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the delete fails.
    pub fn remove_target(&mut self, target_id: i64) -> Result<bool, SqliteStoreError> {
        let tx = self.row_store_mut().connection_mut().transaction().map_err(|err| db_error(&err))?;
        tx.execute("DELETE FROM target_documents WHERE target_id = ?1", params![target_id])
            .map_err(|err| db_error(&err))?;
        let removed = tx
            .execute("DELETE FROM targets WHERE target_id = ?1", params![target_id])
            .map_err(|err| db_error(&err))?;
        if removed > 0 {
            tx.execute(
                "UPDATE target_globals SET target_count = target_count - ?1",
                params![i64::try_from(removed).unwrap_or(i64::MAX)],
            )
            .map_err(|err| db_error(&err))?;
        }
        tx.commit().map_err(|err| db_error(&err))?;
        Ok(removed > 0)
    }

    /// Associates a document path with a cached target.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::UnknownTarget`] when the target is not cached.
    pub fn add_target_document(&mut self, target_id: i64, path: &str) -> Result<(), SqliteStoreError> {
        let tx = self.row_store_mut().connection_mut().transaction().map_err(|err| db_error(&err))?;
        let exists: i64 = tx
            .query_row("SELECT COUNT(*) FROM targets WHERE target_id = ?1", params![target_id], |row| {
                row.get(0)
            })
            .map_err(|err| db_error(&err))?;
        if exists == 0 {
            return Err(SqliteStoreError::UnknownTarget(target_id));
        }
        tx.execute(
            "INSERT OR IGNORE INTO target_documents (target_id, path) VALUES (?1, ?2)",
            params![target_id, path],
        )
        .map_err(|err| db_error(&err))?;
        tx.commit().map_err(|err| db_error(&err))
    }

    /// Returns the document paths associated with a target, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn target_documents(&self, target_id: i64) -> Result<Vec<String>, SqliteStoreError> {
        let mut stmt = self
            .row_store()
            .connection()
            .prepare_cached("SELECT path FROM target_documents WHERE target_id = ?1 ORDER BY path")
            .map_err(|err| db_error(&err))?;
        let rows = stmt
            .query_map(params![target_id], |row| row.get::<_, String>(0))
            .map_err(|err| db_error(&err))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| db_error(&err))
    }

    /// Returns the cached target count.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the globals row is missing or unreadable.
    pub fn target_count(&self) -> Result<i64, SqliteStoreError> {
        self.target_global(TargetGlobal::Count)
    }

    /// Returns the highest target id ever registered.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the globals row is missing or unreadable.
    pub fn highest_target_id(&self) -> Result<i64, SqliteStoreError> {
        self.target_global(TargetGlobal::HighestTargetId)
    }
}
