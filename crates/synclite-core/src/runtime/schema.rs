// crates/synclite-core/src/runtime/schema.rs
// ============================================================================
// Module: Local Cache Schema Steps
// Description: The built-in migration steps for the local sync cache.
// Purpose: Define table layouts and the transformations between versions.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! | from | step | effect |
//! |------|------|--------|
//! | 0 | `create_core_tables` | mutation queue, targets, target documents |
//! | 1 | `create_target_globals` | target globals, remote document cache |
//! | 2 | `invalidate_target_cache` | drops every cached target row |
//! | 3 | `backfill_target_count` | adds and recomputes `target_count` |
//! | 4 | `prune_orphaned_target_documents` | drops documents of dead targets |
//!
//! Steps that create tables use `IF NOT EXISTS` and steps that add columns
//! check for them first, so re-running a step on an upgraded store is safe.
//!
//! Step 2 deletes rather than converts: older builds wrote targets in a layout
//! newer builds cannot read, and the sync layer re-registers every active
//! target on its next connect.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::interfaces::RowStoreError;
use crate::interfaces::RowTransaction;
use crate::runtime::catalog::MigrationStep;

// ============================================================================
// SECTION: Table Definitions
// ============================================================================

/// Mutation queue and query target tables.
const CORE_TABLES_SQL: &str = "
    CREATE TABLE IF NOT EXISTS mutation_queues (
        owner_id TEXT PRIMARY KEY,
        last_acknowledged_batch_id INTEGER,
        last_stream_token BLOB
    );
    CREATE TABLE IF NOT EXISTS mutations (
        owner_id TEXT,
        batch_id INTEGER,
        payload BLOB,
        PRIMARY KEY (owner_id, batch_id)
    );
    CREATE TABLE IF NOT EXISTS document_mutations (
        owner_id TEXT,
        path TEXT,
        batch_id INTEGER,
        PRIMARY KEY (owner_id, path, batch_id)
    );
    CREATE TABLE IF NOT EXISTS targets (
        target_id INTEGER PRIMARY KEY,
        canonical_id TEXT,
        snapshot_version_seconds INTEGER,
        snapshot_version_nanos INTEGER,
        resume_token BLOB,
        last_listen_sequence_number INTEGER,
        target_proto BLOB
    );
    CREATE INDEX IF NOT EXISTS query_targets ON targets (canonical_id, target_id);
    CREATE TABLE IF NOT EXISTS target_documents (
        target_id INTEGER,
        path TEXT,
        PRIMARY KEY (target_id, path)
    );
    CREATE INDEX IF NOT EXISTS document_targets ON target_documents (path, target_id);";

/// Target metadata singleton and the remote document cache.
const TARGET_GLOBALS_SQL: &str = "
    CREATE TABLE IF NOT EXISTS target_globals (
        highest_target_id INTEGER,
        highest_listen_sequence_number INTEGER,
        last_remote_snapshot_version_seconds INTEGER,
        last_remote_snapshot_version_nanos INTEGER
    );
    CREATE TABLE IF NOT EXISTS remote_documents (
        path TEXT PRIMARY KEY,
        contents BLOB
    );";

// ============================================================================
// SECTION: Steps
// ============================================================================

/// Returns the built-in steps in ascending version order.
#[must_use]
pub fn standard_steps() -> Vec<MigrationStep> {
    vec![
        MigrationStep::new(0, "create_core_tables", create_core_tables),
        MigrationStep::new(1, "create_target_globals", create_target_globals),
        MigrationStep::new(2, "invalidate_target_cache", invalidate_target_cache),
        MigrationStep::new(3, "backfill_target_count", backfill_target_count),
        MigrationStep::new(4, "prune_orphaned_target_documents", prune_orphaned_target_documents),
    ]
}

/// Creates the mutation queue and target tables.
fn create_core_tables(tx: &mut dyn RowTransaction) -> Result<(), RowStoreError> {
    tx.execute_batch(CORE_TABLES_SQL)
}

/// Creates the target globals and remote document tables.
fn create_target_globals(tx: &mut dyn RowTransaction) -> Result<(), RowStoreError> {
    tx.execute_batch(TARGET_GLOBALS_SQL)
}

/// Discards every cached target, its globals, and its document associations.
fn invalidate_target_cache(tx: &mut dyn RowTransaction) -> Result<(), RowStoreError> {
    tx.execute_batch(
        "DELETE FROM targets;
         DELETE FROM target_globals;
         DELETE FROM target_documents;",
    )
}

/// Introduces `target_count` and recomputes it from the target rows.
///
/// `target_globals` ends with exactly one row: extra rows are dropped, a
/// missing row is inserted, `highest_target_id` never moves below the largest
/// live target id, and `target_count` is overwritten with the row count.
fn backfill_target_count(tx: &mut dyn RowTransaction) -> Result<(), RowStoreError> {
    if !tx.column_exists("target_globals", "target_count")? {
        tx.execute_batch(
            "ALTER TABLE target_globals ADD COLUMN target_count INTEGER NOT NULL DEFAULT 0;",
        )?;
    }
    tx.execute_batch(
        "DELETE FROM target_globals
             WHERE rowid NOT IN (SELECT MIN(rowid) FROM target_globals);
         INSERT INTO target_globals (
             highest_target_id,
             highest_listen_sequence_number,
             last_remote_snapshot_version_seconds,
             last_remote_snapshot_version_nanos,
             target_count
         )
         SELECT 0, 0, 0, 0, 0 WHERE NOT EXISTS (SELECT 1 FROM target_globals);
         UPDATE target_globals SET
             highest_target_id = MAX(
                 COALESCE(highest_target_id, 0),
                 COALESCE((SELECT MAX(target_id) FROM targets), 0)
             ),
             target_count = (SELECT COUNT(*) FROM targets);",
    )
}

/// Removes document associations whose target no longer exists.
fn prune_orphaned_target_documents(tx: &mut dyn RowTransaction) -> Result<(), RowStoreError> {
    tx.execute_batch(
        "DELETE FROM target_documents
             WHERE NOT EXISTS (
                 SELECT 1 FROM targets WHERE targets.target_id = target_documents.target_id
             );",
    )
}
