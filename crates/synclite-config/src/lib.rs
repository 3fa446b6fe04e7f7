// crates/synclite-config/src/lib.rs
// ============================================================================
// Module: Synclite Config Library
// Description: Configuration model and validation for synclite hosts.
// Purpose: Single source of truth for synclite.toml semantics.
// Dependencies: synclite-core, synclite-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `synclite-config` defines the TOML configuration a host uses to locate and
//! open its local store. Loading fails closed: unknown keys, empty identities,
//! and out-of-range limits are errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
