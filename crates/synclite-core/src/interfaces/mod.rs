// crates/synclite-core/src/interfaces/mod.rs
// ============================================================================
// Module: Synclite Interfaces
// Description: Backend-agnostic contract for the embedded row store.
// Purpose: Define the execute/query/transaction primitives migrations rely on.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The migration engine never touches a database driver directly. It works
//! against [`RowStore`], which hands out scoped [`RowTransaction`] values.
//! A transaction that is dropped without [`RowTransaction::commit`] must roll
//! back; this is the only way the engine guarantees all-or-nothing upgrades.
//!
//! Statements use the `SQLite` dialect. Introspection helpers have default
//! implementations built on `sqlite_master` and `pragma_table_info`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Values
// ============================================================================

/// Bound parameter value for row store statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Row store adapter errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowStoreError {
    /// The underlying store could not be opened or reached.
    #[error("row store unavailable: {0}")]
    Unavailable(String),
    /// A statement violated a table constraint.
    #[error("row store constraint violation: {0}")]
    Constraint(String),
    /// Any other engine or I/O failure.
    #[error("row store db error: {0}")]
    Db(String),
}

// ============================================================================
// SECTION: Row Store
// ============================================================================

/// Embedded relational store that can open scoped transactions.
pub trait RowStore {
    /// Begins a transaction with exclusive access to every table.
    ///
    /// # Errors
    ///
    /// Returns [`RowStoreError`] when the transaction cannot be started.
    fn begin(&mut self) -> Result<Box<dyn RowTransaction + '_>, RowStoreError>;
}

/// Open transaction on a [`RowStore`].
///
/// # Invariants
/// - Dropping the transaction without calling [`RowTransaction::commit`]
///   discards every statement executed through it.
pub trait RowTransaction {
    /// Executes one or more statements without parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RowStoreError`] when any statement fails.
    fn execute_batch(&mut self, sql: &str) -> Result<(), RowStoreError>;

    /// Executes one statement with bound parameters, returning changed rows.
    ///
    /// # Errors
    ///
    /// Returns [`RowStoreError`] when the statement fails.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, RowStoreError>;

    /// Returns the first column of the first row as an integer.
    ///
    /// Yields `None` when the query returns no rows or the value is `NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`RowStoreError`] when the query fails or the value is not an
    /// integer.
    fn query_i64(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<i64>, RowStoreError>;

    /// Commits every statement executed through this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`RowStoreError`] when the commit fails; nothing is persisted.
    fn commit(self: Box<Self>) -> Result<(), RowStoreError>;

    /// Returns true when a table with the given name exists.
    ///
    /// # Errors
    ///
    /// Returns [`RowStoreError`] when the catalog query fails.
    fn table_exists(&mut self, table: &str) -> Result<bool, RowStoreError> {
        let count = self.query_i64(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            &[SqlValue::from(table)],
        )?;
        Ok(count.unwrap_or(0) > 0)
    }

    /// Returns true when `table` has a column named `column`.
    ///
    /// # Errors
    ///
    /// Returns [`RowStoreError`] when the catalog query fails.
    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, RowStoreError> {
        let count = self.query_i64(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
            &[SqlValue::from(table), SqlValue::from(column)],
        )?;
        Ok(count.unwrap_or(0) > 0)
    }
}
