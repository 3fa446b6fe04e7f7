// crates/synclite-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Row Store
// Description: RowStore adapter over a single rusqlite connection.
// Purpose: Give the migration engine scoped, rollback-on-drop transactions.
// Dependencies: synclite-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteRowStore`] owns exactly one `SQLite` connection. Transactions are
//! started `IMMEDIATE` so the write lock is held from the first statement,
//! and they roll back when dropped without a commit. Store files are opened
//! with `foreign_keys`, the configured journal and sync modes, and a busy
//! timeout. Path inputs are validated before anything touches the disk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Deserialize;
use serde::Serialize;
use synclite_core::MigrationError;
use synclite_core::RowStore;
use synclite_core::RowStoreError;
use synclite_core::RowTransaction;
use synclite_core::SqlValue;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Largest accepted busy timeout (ms).
pub const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Journal mode applied to each store file when it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// Write-ahead log; readers do not block the migration writer.
    #[default]
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
}

impl JournalMode {
    /// Returns the `journal_mode` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// How hard the store flushes committed migrations and writes to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Flush on every commit.
    #[default]
    Full,
    /// Flush at WAL checkpoints only.
    Normal,
}

impl SyncMode {
    /// Returns the `synchronous` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for local store files.
///
/// # Invariants
/// - `directory` holds every store file; file names come from store identity.
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Directory containing the store files.
    pub directory: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: JournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config with default pragmas for `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            sync_mode: SyncMode::default(),
        }
    }

    /// Validates runtime limits.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when a limit is out of range.
    pub fn validate(&self) -> Result<(), SqliteStoreError> {
        if self.busy_timeout_ms == 0 || self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(SqliteStoreError::Invalid(format!(
                "busy_timeout_ms out of range: {} (max {MAX_BUSY_TIMEOUT_MS})",
                self.busy_timeout_ms
            )));
        }
        if self.directory.as_os_str().is_empty() {
            return Err(SqliteStoreError::Invalid("store directory must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding document payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// The store file could not be opened.
    #[error("sqlite store unavailable: {0}")]
    Unavailable(String),
    /// Invalid configuration or input.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Stored data violates a cache invariant.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// A target operation referenced a target that is not cached.
    #[error("sqlite store unknown target: {0}")]
    UnknownTarget(i64),
    /// Schema migration failed during open.
    #[error("sqlite store migration failed: {0}")]
    Migration(MigrationError),
}

impl From<MigrationError> for SqliteStoreError {
    fn from(error: MigrationError) -> Self {
        match error {
            MigrationError::StoreUnavailable(message) => Self::Unavailable(message),
            other => Self::Migration(other),
        }
    }
}

impl From<RowStoreError> for SqliteStoreError {
    fn from(error: RowStoreError) -> Self {
        match error {
            RowStoreError::Unavailable(message) => Self::Unavailable(message),
            RowStoreError::Constraint(message) => Self::Invalid(message),
            RowStoreError::Db(message) => Self::Db(message),
        }
    }
}

// ============================================================================
// SECTION: Row Store
// ============================================================================

/// Single-connection `SQLite` row store.
///
/// # Invariants
/// - All access goes through `&mut self`, so a migration transaction can
///   never overlap another statement on the same store.
#[derive(Debug)]
pub struct SqliteRowStore {
    /// Owned connection.
    connection: Connection,
}

impl SqliteRowStore {
    /// Opens or creates the store file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid or the file
    /// cannot be opened.
    pub fn open(path: &Path, config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        config.validate()?;
        prepare_store_file(path)?;
        let connection = open_connection(path, config)?;
        Ok(Self {
            connection,
        })
    }

    /// Opens a private in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when `SQLite` cannot allocate the store.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection = Connection::open_in_memory()
            .map_err(|err| SqliteStoreError::Unavailable(err.to_string()))?;
        connection
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(Self {
            connection,
        })
    }

    /// Returns the underlying connection for direct reads.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the underlying connection for crate-local transactions.
    pub(crate) const fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }
}

impl RowStore for SqliteRowStore {
    fn begin(&mut self) -> Result<Box<dyn RowTransaction + '_>, RowStoreError> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| row_store_error(&err))?;
        Ok(Box::new(SqliteTransaction {
            tx,
        }))
    }
}

/// Open `SQLite` transaction; rolls back on drop.
struct SqliteTransaction<'conn> {
    /// Wrapped rusqlite transaction.
    tx: rusqlite::Transaction<'conn>,
}

impl RowTransaction for SqliteTransaction<'_> {
    fn execute_batch(&mut self, sql: &str) -> Result<(), RowStoreError> {
        self.tx.execute_batch(sql).map_err(|err| row_store_error(&err))
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, RowStoreError> {
        self.tx
            .execute(sql, params_from_iter(params.iter().map(sqlite_value)))
            .map_err(|err| row_store_error(&err))
    }

    fn query_i64(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<i64>, RowStoreError> {
        self.tx
            .query_row(sql, params_from_iter(params.iter().map(sqlite_value)), |row| {
                row.get::<_, Option<i64>>(0)
            })
            .optional()
            .map(Option::flatten)
            .map_err(|err| row_store_error(&err))
    }

    fn commit(self: Box<Self>) -> Result<(), RowStoreError> {
        self.tx.commit().map_err(|err| row_store_error(&err))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a bound parameter into a rusqlite value.
fn sqlite_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(value) => Value::Integer(*value),
        SqlValue::Text(value) => Value::Text(value.clone()),
        SqlValue::Blob(value) => Value::Blob(value.clone()),
    }
}

/// Classifies a rusqlite error for the row store contract.
fn row_store_error(err: &rusqlite::Error) -> RowStoreError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation => RowStoreError::Constraint(err.to_string()),
            ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::PermissionDenied => {
                RowStoreError::Unavailable(err.to_string())
            }
            _ => RowStoreError::Db(err.to_string()),
        },
        _ => RowStoreError::Db(err.to_string()),
    }
}

/// Maps a rusqlite error into a store error.
pub(crate) fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::from(row_store_error(err))
}

/// Checks that `path` can hold a store file and creates its directory.
fn prepare_store_file(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(file_name) = path.file_name() else {
        return Err(SqliteStoreError::Invalid(format!(
            "local store path `{}` has no file name",
            path.display()
        )));
    };
    if file_name.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(SqliteStoreError::Invalid(format!(
            "local store file name is {} bytes (max {MAX_PATH_COMPONENT_LENGTH})",
            file_name.len()
        )));
    }
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid(format!(
            "local store path is longer than {MAX_TOTAL_PATH_LENGTH} bytes"
        )));
    }
    if path.components().any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH) {
        return Err(SqliteStoreError::Invalid(format!(
            "local store directory has a segment over {MAX_PATH_COMPONENT_LENGTH} bytes"
        )));
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(format!(
            "local store path `{}` is a directory",
            path.display()
        )));
    }
    if let Some(directory) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(directory).map_err(|err| {
            SqliteStoreError::Io(format!("create store directory {}: {err}", directory.display()))
        })?;
    }
    Ok(())
}

/// Opens an `SQLite` connection with durability pragmas.
fn open_connection(path: &Path, config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags)
        .map_err(|err| SqliteStoreError::Unavailable(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
