// crates/synclite-core/src/core/naming.rs
// ============================================================================
// Module: Store Naming
// Description: Deterministic on-disk store name derivation.
// Purpose: Map store identity to a stable, filesystem-safe file name.
// Dependencies: url
// ============================================================================

//! ## Overview
//! Each `(persistence key, database)` pair owns exactly one physical store.
//! The name is `firestore.<key>.<project>.<database>` with every component
//! form-urlencoded, so `[DEFAULT]` becomes `%5BDEFAULT%5D` and the default
//! database marker `(default)` becomes `%28default%29`.
//!
//! Form encoding leaves `.` and `*` untouched. Both are escaped here as well:
//! `.` is the component separator, so leaving it raw would let two identities
//! collide, and `*` is not a valid file name character on every platform.

// ============================================================================
// SECTION: Imports
// ============================================================================

use url::form_urlencoded::byte_serialize;

use crate::core::identifiers::DatabaseId;
use crate::core::identifiers::PersistenceKey;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixed prefix shared by every store name.
pub const STORE_NAME_PREFIX: &str = "firestore";
/// Separator placed between name components.
const COMPONENT_SEPARATOR: char = '.';

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves the store file name for an application instance and database.
///
/// The function is pure: equal inputs always produce equal names, and distinct
/// inputs never share a name.
#[must_use]
pub fn resolve_store_name(persistence_key: &PersistenceKey, database_id: &DatabaseId) -> String {
    let components = [
        persistence_key.as_str(),
        database_id.project_id().as_str(),
        database_id.database_id(),
    ];
    let mut name = String::from(STORE_NAME_PREFIX);
    for component in components {
        name.push(COMPONENT_SEPARATOR);
        name.push_str(&encode_component(component));
    }
    name
}

/// Percent-encodes a single name component.
fn encode_component(component: &str) -> String {
    let mut encoded = String::with_capacity(component.len());
    for chunk in byte_serialize(component.as_bytes()) {
        for ch in chunk.chars() {
            match ch {
                '.' => encoded.push_str("%2E"),
                '*' => encoded.push_str("%2A"),
                other => encoded.push(other),
            }
        }
    }
    encoded
}

// ============================================================================
// SECTION: Tests
// ============================================================================
