// crates/synclite-core/src/runtime/catalog.rs
// ============================================================================
// Module: Migration Catalog
// Description: Ordered, gap-free table of schema migration steps.
// Purpose: Map each source version to the transformation that upgrades it.
// Dependencies: crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! A step upgrades exactly one version: from `from_version` to
//! `from_version + 1`. The catalog stores steps in a sorted map keyed by
//! `from_version` and refuses duplicates and gaps, so any upgrade `a -> b`
//! is the chain of steps `a, a + 1, ..., b - 1`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::interfaces::RowStoreError;
use crate::interfaces::RowTransaction;
use crate::runtime::schema::standard_steps;

// ============================================================================
// SECTION: Steps
// ============================================================================

/// Transformation applied by a migration step.
pub type MigrationFn = fn(&mut dyn RowTransaction) -> Result<(), RowStoreError>;

/// Single schema migration step.
#[derive(Clone, Copy)]
pub struct MigrationStep {
    /// Version this step upgrades from.
    from_version: u32,
    /// Stable step name used in logs and reports.
    name: &'static str,
    /// Transformation to run inside the migration transaction.
    apply: MigrationFn,
}

impl MigrationStep {
    /// Creates a migration step.
    #[must_use]
    pub const fn new(from_version: u32, name: &'static str, apply: MigrationFn) -> Self {
        Self {
            from_version,
            name,
            apply,
        }
    }

    /// Returns the version this step upgrades from.
    #[must_use]
    pub const fn from_version(&self) -> u32 {
        self.from_version
    }

    /// Returns the stable step name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the step's transformation.
    ///
    /// # Errors
    ///
    /// Returns [`RowStoreError`] when any statement in the step fails.
    pub fn apply(&self, tx: &mut dyn RowTransaction) -> Result<(), RowStoreError> {
        (self.apply)(tx)
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("from_version", &self.from_version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Two steps share the same source version.
    #[error("duplicate migration step from version {0}")]
    DuplicateStep(u32),
    /// No step upgrades from this version although later steps exist.
    #[error("missing migration step from version {0}")]
    MissingStep(u32),
    /// The step would upgrade past the largest representable version.
    #[error("migration step from version {0} overflows the version range")]
    VersionOverflow(u32),
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Ordered set of migration steps covering versions `0..latest`.
///
/// # Invariants
/// - Keys are exactly `0..latest_version()`, each mapped to one step.
#[derive(Debug, Clone)]
pub struct MigrationCatalog {
    /// Steps keyed by source version.
    steps: BTreeMap<u32, MigrationStep>,
}

impl MigrationCatalog {
    /// Builds a catalog from steps in any order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on duplicate source versions, gaps, or a
    /// source version of `u32::MAX`.
    pub fn new(steps: impl IntoIterator<Item = MigrationStep>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for step in steps {
            if step.from_version == u32::MAX {
                return Err(CatalogError::VersionOverflow(step.from_version));
            }
            if map.insert(step.from_version, step).is_some() {
                return Err(CatalogError::DuplicateStep(step.from_version));
            }
        }
        for (expected, version) in (0_u32 ..).zip(map.keys()) {
            if *version != expected {
                return Err(CatalogError::MissingStep(expected));
            }
        }
        Ok(Self {
            steps: map,
        })
    }

    /// Returns the built-in catalog for the local sync cache schema.
    #[must_use]
    pub fn standard() -> Self {
        let steps = standard_steps().into_iter().map(|step| (step.from_version, step)).collect();
        Self {
            steps,
        }
    }

    /// Returns the newest schema version this catalog can produce.
    #[must_use]
    pub fn latest_version(&self) -> u32 {
        self.steps.keys().next_back().map_or(0, |version| version + 1)
    }

    /// Returns the steps upgrading `from` to `to`, in ascending order.
    ///
    /// Empty when `to <= from`.
    pub fn steps_between(&self, from: u32, to: u32) -> impl Iterator<Item = &MigrationStep> {
        self.steps.range(from .. to.max(from)).map(|(_, step)| step)
    }

    /// Returns every step in ascending order.
    pub fn steps(&self) -> impl Iterator<Item = &MigrationStep> {
        self.steps.values()
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true when the catalog has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for MigrationCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
