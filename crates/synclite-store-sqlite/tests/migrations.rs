// crates/synclite-store-sqlite/tests/migrations.rs
// ============================================================================
// Module: SQLite Migration Tests
// Description: Built-in migration steps applied to real SQLite files.
// Purpose: Validate version ranges, cache invalidation, backfill, and rollback.
// ============================================================================

//! ## Overview
//! Drives [`MigrationRunner`] against [`SqliteRowStore`] files in temporary
//! directories and inspects the resulting tables through the same connection:
//! - Fresh stores reach the newest version with empty tables
//! - Version 2 to 3 discards all cached targets
//! - Version 3 to 5 backfills an exact target count
//! - Equal bounds, re-runs, and failing steps leave the store untouched

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

use rusqlite::Connection;
use rusqlite::params;
use synclite_core::MigrationCatalog;
use synclite_core::MigrationError;
use synclite_core::MigrationRunner;
use synclite_core::MigrationStep;
use synclite_core::RowStoreError;
use synclite_core::RowTransaction;
use synclite_core::SchemaVersionTracker;
use synclite_core::runtime::standard_steps;
use synclite_store_sqlite::SqliteRowStore;
use synclite_store_sqlite::SqliteStoreConfig;
use synclite_store_sqlite::SqliteStoreError;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn open_store(temp: &TempDir) -> SqliteRowStore {
    let config = SqliteStoreConfig::new(temp.path());
    SqliteRowStore::open(&temp.path().join("store.db"), &config).expect("open store")
}

fn count(connection: &Connection, table: &str) -> i64 {
    connection
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .expect("count rows")
}

fn table_exists(connection: &Connection, table: &str) -> bool {
    connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .expect("inspect schema")
        > 0
}

fn version(store: &mut SqliteRowStore) -> u32 {
    SchemaVersionTracker::read_current(store).expect("read version")
}

fn insert_targets(connection: &Connection, ids: std::ops::RangeInclusive<i64>) {
    for target_id in ids {
        connection
            .execute(
                "INSERT INTO targets (target_id, canonical_id) VALUES (?1, ?2)",
                params![target_id, format!("query-{target_id}")],
            )
            .expect("insert target");
    }
}

fn broken_backfill(tx: &mut dyn RowTransaction) -> Result<(), RowStoreError> {
    tx.execute_batch("DELETE FROM targets;")?;
    Err(RowStoreError::Db("backfill interrupted".to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn fresh_store_reaches_newest_version_with_empty_tables() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let report = MigrationRunner::default().run_migrations(&mut store).unwrap();
    assert_eq!(report.from_version, 0);
    assert_eq!(report.to_version, 5);
    assert_eq!(report.applied.len(), 5);
    assert_eq!(version(&mut store), 5);

    let connection = store.connection();
    for table in [
        "mutation_queues",
        "mutations",
        "document_mutations",
        "targets",
        "target_documents",
        "remote_documents",
    ] {
        assert!(table_exists(connection, table), "missing table {table}");
        assert_eq!(count(connection, table), 0, "table {table} not empty");
    }
    assert_eq!(count(connection, "target_globals"), 1);

    connection
        .execute(
            "INSERT INTO mutations (owner_id, batch_id, payload) VALUES (?1, ?2, ?3)",
            params!["user-a", 1_i64, b"batch".to_vec()],
        )
        .unwrap();
    let rows: Vec<(String, i64, Vec<u8>)> = connection
        .prepare("SELECT owner_id, batch_id, payload FROM mutations")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows, vec![("user-a".to_string(), 1, b"batch".to_vec())]);
}

#[test]
fn upgrade_to_three_discards_cached_targets() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let runner = MigrationRunner::default();
    runner.run_migrations_range(&mut store, 0, 2).unwrap();

    let connection = store.connection();
    insert_targets(connection, 1 ..= 3);
    connection
        .execute_batch(
            "INSERT INTO target_documents (target_id, path) VALUES (1, 'rooms/a');
             INSERT INTO target_documents (target_id, path) VALUES (2, 'rooms/b');
             INSERT INTO target_globals (highest_target_id, highest_listen_sequence_number)
                 VALUES (3, 10);",
        )
        .unwrap();

    let report = runner.run_migrations_range(&mut store, 2, 3).unwrap();
    assert_eq!(report.applied, ["invalidate_target_cache"]);
    let connection = store.connection();
    assert_eq!(count(connection, "targets"), 0);
    assert_eq!(count(connection, "target_documents"), 0);
    assert_eq!(count(connection, "target_globals"), 0);
    assert_eq!(version(&mut store), 3);
}

#[test]
fn upgrade_to_five_backfills_target_count() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let runner = MigrationRunner::default();
    runner.run_migrations_range(&mut store, 0, 3).unwrap();
    insert_targets(store.connection(), 1 ..= 50);

    runner.run_migrations_range(&mut store, 3, 5).unwrap();
    let connection = store.connection();
    assert_eq!(count(connection, "target_globals"), 1);
    let (target_count, highest): (i64, i64) = connection
        .query_row("SELECT target_count, highest_target_id FROM target_globals", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(target_count, 50);
    assert_eq!(highest, 50);
    assert_eq!(version(&mut store), 5);
}

#[test]
fn backfill_collapses_duplicate_globals_rows() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let runner = MigrationRunner::default();
    runner.run_migrations_range(&mut store, 0, 3).unwrap();
    let connection = store.connection();
    insert_targets(connection, 4 ..= 5);
    connection
        .execute_batch(
            "INSERT INTO target_globals (highest_target_id) VALUES (9);
             INSERT INTO target_globals (highest_target_id) VALUES (2);",
        )
        .unwrap();

    runner.run_migrations_range(&mut store, 3, 4).unwrap();
    let connection = store.connection();
    assert_eq!(count(connection, "target_globals"), 1);
    let (target_count, highest): (i64, i64) = connection
        .query_row("SELECT target_count, highest_target_id FROM target_globals", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(target_count, 2);
    assert_eq!(highest, 9);
}

#[test]
fn prune_removes_documents_of_missing_targets() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let runner = MigrationRunner::default();
    runner.run_migrations_range(&mut store, 0, 4).unwrap();
    let connection = store.connection();
    insert_targets(connection, 1 ..= 1);
    connection
        .execute_batch(
            "INSERT INTO target_documents (target_id, path) VALUES (1, 'rooms/live');
             INSERT INTO target_documents (target_id, path) VALUES (7, 'rooms/orphan');",
        )
        .unwrap();

    runner.run_migrations_range(&mut store, 4, 5).unwrap();
    let paths: Vec<String> = store
        .connection()
        .prepare("SELECT path FROM target_documents")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(paths, ["rooms/live"]);
}

#[test]
fn equal_bounds_leave_store_untouched() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let runner = MigrationRunner::default();
    let report = runner.run_migrations_range(&mut store, 2, 2).unwrap();
    assert!(report.is_noop());
    assert!(!table_exists(store.connection(), "targets"));
    assert!(!table_exists(store.connection(), "store_meta"));
}

#[test]
fn equal_bounds_beyond_catalog_leave_store_untouched() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let report = MigrationRunner::default().run_migrations_range(&mut store, 7, 7).unwrap();
    assert!(report.is_noop());
    assert_eq!(report.to_version, 7);
    assert!(!table_exists(store.connection(), "store_meta"));
}

#[test]
fn retrying_completed_range_keeps_live_targets() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let runner = MigrationRunner::default();
    runner.run_migrations(&mut store).unwrap();
    insert_targets(store.connection(), 1 ..= 1);

    let report = runner.run_migrations_range(&mut store, 2, 5).unwrap();
    assert!(report.is_noop());
    assert_eq!(count(store.connection(), "targets"), 1);
    assert_eq!(version(&mut store), 5);
}

#[test]
fn interrupted_range_resumes_from_recorded_version() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let runner = MigrationRunner::default();
    runner.run_migrations_range(&mut store, 0, 3).unwrap();
    insert_targets(store.connection(), 1 ..= 2);

    let report = runner.run_migrations_range(&mut store, 2, 5).unwrap();
    assert_eq!(report.from_version, 3);
    assert_eq!(report.applied, ["backfill_target_count", "prune_orphaned_target_documents"]);
    assert_eq!(count(store.connection(), "targets"), 2);
}

#[test]
fn rerunning_current_store_is_noop() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let runner = MigrationRunner::default();
    runner.run_migrations(&mut store).unwrap();
    insert_targets(store.connection(), 1 ..= 2);

    let report = runner.run_migrations(&mut store).unwrap();
    assert!(report.is_noop());
    assert_eq!(report.to_version, 5);
    assert_eq!(count(store.connection(), "targets"), 2);
}

#[test]
fn failing_step_rolls_back_the_whole_run() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    MigrationRunner::default().run_migrations_range(&mut store, 0, 3).unwrap();
    insert_targets(store.connection(), 1 ..= 4);

    let mut steps = standard_steps();
    steps[3] = MigrationStep::new(3, "broken_backfill", broken_backfill);
    let runner = MigrationRunner::new(MigrationCatalog::new(steps).unwrap());
    let err = runner.run_migrations(&mut store).unwrap_err();
    assert!(matches!(
        err,
        MigrationError::StepFailed {
            from_version: 3,
            step: "broken_backfill",
            ..
        }
    ));

    assert_eq!(version(&mut store), 3);
    assert_eq!(count(store.connection(), "targets"), 4);
    let has_count_column: i64 = store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('target_globals') WHERE name = 'target_count'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(has_count_column, 0);
}

#[test]
fn newer_store_is_rejected_without_changes() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    store
        .connection()
        .execute_batch(
            "CREATE TABLE store_meta (version INTEGER NOT NULL);
             INSERT INTO store_meta (version) VALUES (9);",
        )
        .unwrap();
    let err = MigrationRunner::default().run_migrations(&mut store).unwrap_err();
    assert_eq!(
        err,
        MigrationError::SchemaMismatch {
            recorded: 9,
            supported: 5
        }
    );
    assert!(!table_exists(store.connection(), "targets"));
}

#[test]
fn newer_store_is_rejected_by_explicit_range() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    store
        .connection()
        .execute_batch(
            "CREATE TABLE store_meta (version INTEGER NOT NULL);
             INSERT INTO store_meta (version) VALUES (9);",
        )
        .unwrap();
    let err = MigrationRunner::default().run_migrations_range(&mut store, 0, 5).unwrap_err();
    assert_eq!(
        err,
        MigrationError::SchemaMismatch {
            recorded: 9,
            supported: 5
        }
    );
    assert_eq!(version(&mut store), 9);
}

#[test]
fn directory_store_path_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = SqliteStoreConfig::new(temp.path());
    let err = SqliteRowStore::open(temp.path(), &config).unwrap_err();
    let SqliteStoreError::Invalid(message) = &err else {
        panic!("expected invalid store path, got {err:?}");
    };
    assert!(message.ends_with("is a directory"));
}

#[test]
fn zero_busy_timeout_is_rejected() {
    let temp = TempDir::new().unwrap();
    let mut config = SqliteStoreConfig::new(temp.path());
    config.busy_timeout_ms = 0;
    let err = SqliteRowStore::open(&temp.path().join("store.db"), &config).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}
