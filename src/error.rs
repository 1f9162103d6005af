//! Error types for sorteo
//!
//! The `ExperimentContext` façade never surfaces these to callers: under any
//! input it collapses uncertainty to the `control` sentinel. Errors exist at
//! construction/validation boundaries and inside storage backends, where
//! failures are logged and degraded rather than propagated.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Sorteo error types
#[derive(Error, Debug)]
pub enum Error {
    /// Experiment definition violates an invariant
    #[error("Invalid experiment definition: {0}")]
    InvalidDefinition(String),

    /// Assignment store backend failure
    #[error("Storage error: {0}\nAssignments fall back to in-memory for this session")]
    Storage(String),

    /// Analytics delivery failure (swallowed at the reporter boundary)
    #[error("Analytics delivery failed: {0}")]
    Analytics(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON codec error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
