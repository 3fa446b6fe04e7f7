// crates/synclite-core/src/core/mod.rs
// ============================================================================
// Module: Synclite Core Types
// Description: Store identity types and pure naming helpers.
// Purpose: Provide stable identifiers and deterministic name derivation.
// Dependencies: serde, url
// ============================================================================

//! ## Overview
//! Identity types describe which application instance, project, and database
//! a local store belongs to. The naming and functions modules turn those
//! identities into file names and endpoint URLs without performing I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod functions;
pub mod identifiers;
pub mod naming;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use functions::DEFAULT_FUNCTIONS_REGION;
pub use functions::FunctionsUrlError;
pub use functions::functions_url;
pub use identifiers::DEFAULT_DATABASE_ID;
pub use identifiers::DEFAULT_PERSISTENCE_KEY;
pub use identifiers::DatabaseId;
pub use identifiers::PersistenceKey;
pub use identifiers::ProjectId;
pub use naming::STORE_NAME_PREFIX;
pub use naming::resolve_store_name;
