// crates/synclite-core/src/runtime/runner.rs
// ============================================================================
// Module: Migration Runner
// Description: Applies catalog steps to a row store in one transaction.
// Purpose: Upgrade the local store schema all-or-nothing.
// Dependencies: crate::{interfaces, runtime}, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! The runner selects the catalog steps in `[from, to)`, runs them in
//! ascending order inside a single [`RowTransaction`], writes `to` through the
//! [`SchemaVersionTracker`], and commits. Any failure returns early and drops
//! the transaction, which rolls back every statement of the run. Failures are
//! never retried here; the host decides whether to try a fresh open.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::interfaces::RowStore;
use crate::interfaces::RowStoreError;
use crate::interfaces::RowTransaction;
use crate::runtime::catalog::MigrationCatalog;
use crate::runtime::version::SchemaVersionTracker;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Migration failures. All of them abort the current store open.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// The store was written by a newer build than this catalog understands.
    #[error("schema version mismatch: store is at version {recorded}, newest supported is {supported}")]
    SchemaMismatch {
        /// Version recorded in the store.
        recorded: u32,
        /// Newest version known to the catalog.
        supported: u32,
    },
    /// Requested target version is beyond the catalog.
    #[error("unknown schema version {requested}: newest supported is {supported}")]
    UnknownVersion {
        /// Requested target version.
        requested: u32,
        /// Newest version known to the catalog.
        supported: u32,
    },
    /// Range runs backward.
    #[error("invalid migration range: {from} -> {to}")]
    InvalidRange {
        /// Requested source version.
        from: u32,
        /// Requested target version.
        to: u32,
    },
    /// Applying the range would move the recorded version backward.
    #[error("schema version regression: store is at version {recorded}, requested {requested}")]
    VersionRegression {
        /// Version recorded in the store.
        recorded: u32,
        /// Version that would have been written.
        requested: u32,
    },
    /// Applying the range would skip steps the store never ran.
    #[error("schema version gap: store is at version {recorded}, range starts at {from}")]
    VersionGap {
        /// Version recorded in the store.
        recorded: u32,
        /// Requested source version.
        from: u32,
    },
    /// A migration step failed; nothing from this run was committed.
    #[error("migration step {step} from version {from_version} failed: {message}")]
    StepFailed {
        /// Source version of the failing step.
        from_version: u32,
        /// Name of the failing step.
        step: &'static str,
        /// Underlying store error message.
        message: String,
    },
    /// The row store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// The recorded schema version is unreadable.
    #[error("schema version record corrupt: {0}")]
    Corrupt(String),
    /// Transaction or version bookkeeping failed.
    #[error("migration store error: {0}")]
    Store(String),
}

impl From<RowStoreError> for MigrationError {
    fn from(error: RowStoreError) -> Self {
        match error {
            RowStoreError::Unavailable(message) => Self::StoreUnavailable(message),
            RowStoreError::Constraint(message) | RowStoreError::Db(message) => {
                Self::Store(message)
            }
        }
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Outcome of a successful runner call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Version the run started from.
    pub from_version: u32,
    /// Version recorded after the run.
    pub to_version: u32,
    /// Names of the applied steps, in order.
    pub applied: Vec<&'static str>,
}

impl MigrationReport {
    /// Report for a run that changed nothing.
    #[must_use]
    pub const fn unchanged(version: u32) -> Self {
        Self {
            from_version: version,
            to_version: version,
            applied: Vec::new(),
        }
    }

    /// Returns true when no step ran.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Applies a [`MigrationCatalog`] to row stores.
#[derive(Debug, Clone, Default)]
pub struct MigrationRunner {
    /// Steps available to this runner.
    catalog: MigrationCatalog,
}

impl MigrationRunner {
    /// Creates a runner over `catalog`.
    #[must_use]
    pub const fn new(catalog: MigrationCatalog) -> Self {
        Self {
            catalog,
        }
    }

    /// Returns the runner's catalog.
    #[must_use]
    pub const fn catalog(&self) -> &MigrationCatalog {
        &self.catalog
    }

    /// Returns the newest schema version the runner can produce.
    #[must_use]
    pub fn latest_version(&self) -> u32 {
        self.catalog.latest_version()
    }

    /// Upgrades the store from its recorded version to the newest version.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::SchemaMismatch`] when the store is newer than
    /// the catalog, or any error raised while applying steps.
    pub fn run_migrations(&self, store: &mut dyn RowStore) -> Result<MigrationReport, MigrationError> {
        let latest = self.latest_version();
        let mut tx = store.begin()?;
        let recorded = SchemaVersionTracker::read(&mut *tx)?;
        if recorded > latest {
            warn!(recorded, supported = latest, "store schema is newer than this build");
            return Err(MigrationError::SchemaMismatch {
                recorded,
                supported: latest,
            });
        }
        if recorded == latest {
            debug!(version = recorded, "store schema is current");
            return Ok(MigrationReport::unchanged(recorded));
        }
        self.apply(tx, recorded, latest)
    }

    /// Applies the steps upgrading `from` to `to`.
    ///
    /// `from == to` is a no-op that does not touch the store. Otherwise the
    /// recorded version must lie in `[from, to]`. Steps below the recorded
    /// version already ran and are skipped, so retrying a completed range
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] when the range is invalid for this catalog or
    /// store, or when any step fails.
    pub fn run_migrations_range(
        &self,
        store: &mut dyn RowStore,
        from: u32,
        to: u32,
    ) -> Result<MigrationReport, MigrationError> {
        if to < from {
            return Err(MigrationError::InvalidRange {
                from,
                to,
            });
        }
        if from == to {
            return Ok(MigrationReport::unchanged(from));
        }
        let latest = self.latest_version();
        if to > latest {
            return Err(MigrationError::UnknownVersion {
                requested: to,
                supported: latest,
            });
        }
        let mut tx = store.begin()?;
        let recorded = SchemaVersionTracker::read(&mut *tx)?;
        if recorded > latest {
            warn!(recorded, supported = latest, "store schema is newer than this build");
            return Err(MigrationError::SchemaMismatch {
                recorded,
                supported: latest,
            });
        }
        if recorded > to {
            return Err(MigrationError::VersionRegression {
                recorded,
                requested: to,
            });
        }
        if recorded < from {
            return Err(MigrationError::VersionGap {
                recorded,
                from,
            });
        }
        if recorded == to {
            debug!(version = recorded, "requested range already applied");
            return Ok(MigrationReport::unchanged(recorded));
        }
        self.apply(tx, recorded, to)
    }

    /// Runs the selected steps, writes the version, and commits.
    fn apply(
        &self,
        mut tx: Box<dyn RowTransaction + '_>,
        from: u32,
        to: u32,
    ) -> Result<MigrationReport, MigrationError> {
        let mut applied = Vec::new();
        for step in self.catalog.steps_between(from, to) {
            debug!(from_version = step.from_version(), step = step.name(), "applying migration step");
            step.apply(&mut *tx).map_err(|err| MigrationError::StepFailed {
                from_version: step.from_version(),
                step: step.name(),
                message: err.to_string(),
            })?;
            applied.push(step.name());
        }
        SchemaVersionTracker::write(&mut *tx, to)?;
        tx.commit()?;
        info!(from_version = from, to_version = to, steps = applied.len(), "schema migrated");
        Ok(MigrationReport {
            from_version: from,
            to_version: to,
            applied,
        })
    }
}
