// crates/synclite-core/src/core/functions.rs
// ============================================================================
// Module: Functions Endpoint Formatting
// Description: Deterministic URL construction for callable cloud functions.
// Purpose: Provide the boundary contract the host composes with the store.
// Dependencies: url
// ============================================================================

//! ## Overview
//! Callable functions live at
//! `https://{region}-{project}.cloudfunctions.net/{endpoint}`. The region
//! defaults to [`DEFAULT_FUNCTIONS_REGION`]. Inputs are untrusted: the
//! formatted URL is parsed back and rejected if any component leaked outside
//! its slot (for example a project containing `/` or `@`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use url::Url;

use crate::core::identifiers::ProjectId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Region used when the caller does not select one.
pub const DEFAULT_FUNCTIONS_REGION: &str = "us-central1";
/// Domain suffix for callable function hosts.
const FUNCTIONS_DOMAIN: &str = "cloudfunctions.net";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while formatting a functions URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FunctionsUrlError {
    /// An input component was empty or malformed.
    #[error("invalid functions url input: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Formatting
// ============================================================================

/// Formats the URL of a callable function.
///
/// # Errors
///
/// Returns [`FunctionsUrlError`] when the region, project, or endpoint is
/// empty or would not survive as its own URL component.
pub fn functions_url(
    region: Option<&str>,
    project_id: &ProjectId,
    endpoint: &str,
) -> Result<Url, FunctionsUrlError> {
    let region = region.unwrap_or(DEFAULT_FUNCTIONS_REGION);
    require_non_empty("region", region)?;
    require_non_empty("project", project_id.as_str())?;
    require_non_empty("endpoint", endpoint)?;
    if endpoint.starts_with('/') || endpoint.contains(['?', '#']) {
        return Err(FunctionsUrlError::Invalid(
            "endpoint must be a relative path without query or fragment".to_string(),
        ));
    }
    let host = format!("{region}-{project_id}.{FUNCTIONS_DOMAIN}");
    let url = Url::parse(&format!("https://{host}/{endpoint}"))
        .map_err(|err| FunctionsUrlError::Invalid(err.to_string()))?;
    if url.host_str() != Some(host.to_ascii_lowercase().as_str()) {
        return Err(FunctionsUrlError::Invalid(
            "region and project must form a single host name".to_string(),
        ));
    }
    if url.path() != format!("/{endpoint}") {
        return Err(FunctionsUrlError::Invalid("endpoint path is not canonical".to_string()));
    }
    Ok(url)
}

/// Rejects empty or whitespace-only inputs.
fn require_non_empty(field: &str, value: &str) -> Result<(), FunctionsUrlError> {
    if value.trim().is_empty() {
        return Err(FunctionsUrlError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}
