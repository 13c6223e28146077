//! Error types for scheduling.

use thiserror::Error;

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a scheduling run before or outside of per-node work.
///
/// Per-node build and push failures are never errors; they are recorded in
/// the run's [`BuildSummary`](crate::BuildSummary).
#[derive(Debug, Error)]
pub enum Error {
    /// A runtime operation outside the per-node workers failed
    /// (registry login).
    #[error(transparent)]
    Runtime(#[from] kiln_runtime::Error),
}
