// crates/synclite-store-sqlite/src/mutations.rs
// ============================================================================
// Module: Mutation Queue Operations
// Description: Pending local write batches per owner.
// Purpose: Queue, list, and acknowledge mutation batches.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! Each owner has one queue row in `mutation_queues` and zero or more pending
//! batches in `mutations`, keyed by `(owner_id, batch_id)`. Acknowledging a
//! batch removes it together with its per-document index rows and advances
//! the queue's `last_acknowledged_batch_id`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::params;

use crate::local::SqliteLocalStore;
use crate::store::SqliteStoreError;
use crate::store::db_error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One pending mutation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Owner of the queue the batch belongs to.
    pub owner_id: String,
    /// Batch id, unique per owner.
    pub batch_id: i64,
    /// Opaque encoded batch.
    pub payload: Vec<u8>,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl SqliteLocalStore {
    /// Appends a mutation batch to an owner's queue.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the batch id is already
    /// queued for the owner, or a database error.
    pub fn enqueue_mutation(
        &mut self,
        owner_id: &str,
        batch_id: i64,
        payload: &[u8],
    ) -> Result<(), SqliteStoreError> {
        let tx = self.row_store_mut().connection_mut().transaction().map_err(|err| db_error(&err))?;
        tx.execute(
            "INSERT OR IGNORE INTO mutation_queues (owner_id, last_acknowledged_batch_id)
                 VALUES (?1, -1)",
            params![owner_id],
        )
        .map_err(|err| db_error(&err))?;
        tx.execute(
            "INSERT INTO mutations (owner_id, batch_id, payload) VALUES (?1, ?2, ?3)",
            params![owner_id, batch_id, payload],
        )
        .map_err(|err| db_error(&err))?;
        tx.commit().map_err(|err| db_error(&err))
    }

    /// Removes an acknowledged batch and advances the owner's queue.
    ///
    /// Returns false when the batch was not pending.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the update fails.
    pub fn acknowledge_batch(&mut self, owner_id: &str, batch_id: i64) -> Result<bool, SqliteStoreError> {
        let tx = self.row_store_mut().connection_mut().transaction().map_err(|err| db_error(&err))?;
        let removed = tx
            .execute(
                "DELETE FROM mutations WHERE owner_id = ?1 AND batch_id = ?2",
                params![owner_id, batch_id],
            )
            .map_err(|err| db_error(&err))?;
        if removed == 0 {
            return Ok(false);
        }
        tx.execute(
            "DELETE FROM document_mutations WHERE owner_id = ?1 AND batch_id = ?2",
            params![owner_id, batch_id],
        )
        .map_err(|err| db_error(&err))?;
        tx.execute(
            "UPDATE mutation_queues
                 SET last_acknowledged_batch_id = MAX(COALESCE(last_acknowledged_batch_id, -1), ?2)
                 WHERE owner_id = ?1",
            params![owner_id, batch_id],
        )
        .map_err(|err| db_error(&err))?;
        tx.commit().map_err(|err| db_error(&err))?;
        Ok(true)
    }

    /// Lists an owner's pending batches in batch order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn pending_mutations(&self, owner_id: &str) -> Result<Vec<MutationRecord>, SqliteStoreError> {
        let mut stmt = self
            .row_store()
            .connection()
            .prepare_cached(
                "SELECT owner_id, batch_id, payload FROM mutations
                     WHERE owner_id = ?1 ORDER BY batch_id",
            )
            .map_err(|err| db_error(&err))?;
        let rows = stmt
            .query_map(params![owner_id], |row| {
                Ok(MutationRecord {
                    owner_id: row.get(0)?,
                    batch_id: row.get(1)?,
                    payload: row.get::<_, Option<Vec<u8>>>(2)?.unwrap_or_default(),
                })
            })
            .map_err(|err| db_error(&err))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| db_error(&err))
    }

    /// Counts pending batches across every owner.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn pending_mutation_count(&self) -> Result<i64, SqliteStoreError> {
        self.row_store()
            .connection()
            .query_row("SELECT COUNT(*) FROM mutations", [], |row| row.get(0))
            .map_err(|err| db_error(&err))
    }
}
