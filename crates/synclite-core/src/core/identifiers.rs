// crates/synclite-core/src/core/identifiers.rs
// ============================================================================
// Module: Synclite Identifiers
// Description: Opaque identifiers for store identity.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings that serialize transparently. Validation
//! (non-empty, length limits) happens at configuration boundaries rather
//! than inside these wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Persistence key used by the default application instance.
pub const DEFAULT_PERSISTENCE_KEY: &str = "[DEFAULT]";
/// Database identifier used when no named database is selected.
pub const DEFAULT_DATABASE_ID: &str = "(default)";

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Application instance identifier used to partition local stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistenceKey(String);

impl PersistenceKey {
    /// Creates a new persistence key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PersistenceKey {
    fn default() -> Self {
        Self::new(DEFAULT_PERSISTENCE_KEY)
    }
}

impl fmt::Display for PersistenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PersistenceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PersistenceKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Cloud project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Creates a new project identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProjectId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Database identity: a project plus either the default or a named database.
///
/// # Invariants
/// - A named database equal to [`DEFAULT_DATABASE_ID`] is the default database;
///   both constructors produce equal values for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseId {
    /// Owning project.
    project_id: ProjectId,
    /// Database name within the project.
    database_id: String,
}

impl DatabaseId {
    /// Returns the default database for a project.
    #[must_use]
    pub fn default_database(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
        }
    }

    /// Returns a named database within a project.
    #[must_use]
    pub fn named(project_id: impl Into<ProjectId>, database_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: database_id.into(),
        }
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the database name, `(default)` for the default database.
    #[must_use]
    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Returns true when this identity selects the default database.
    #[must_use]
    pub fn is_default_database(&self) -> bool {
        self.database_id == DEFAULT_DATABASE_ID
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/databases/{}", self.project_id, self.database_id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
