//! Error types for rendering and context assembly.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a definition or assembling its
/// build context.
#[derive(Debug, Error)]
pub enum Error {
    /// A strict render hit a placeholder with no value.
    #[error("Undefined template variable '{name}'")]
    UndefinedVariable { name: String },

    /// A filesystem operation failed while assembling a context.
    #[error("Failed to {operation} '{}'", path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source resolver failed.
    #[error("Source resolver '{name}' failed: {message}")]
    Resolver { name: String, message: String },
}

impl Error {
    pub(crate) fn io(operation: impl Into<String>, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let operation = operation.into();
        let path = path.into();
        move |source| Self::Io {
            operation,
            path,
            source,
        }
    }
}
