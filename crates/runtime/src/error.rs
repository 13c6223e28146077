//! Error types for runtime operations.

use thiserror::Error;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the container runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to spawn the runtime binary.
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed while waiting for a runtime process.
    #[error("Failed waiting for '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Authentication against the registry failed.
    #[error("Login to registry '{registry}' failed")]
    LoginFailed { registry: String },

    /// Listing local images failed.
    #[error("Failed to list local images: {message}")]
    ListFailed { message: String },

    /// The operation was interrupted by cancellation.
    #[error("Operation on '{image}' was cancelled")]
    Cancelled { image: String },
}
