//! Error types for core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core types.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to parse an image reference.
    #[error("Invalid image reference '{0}': {1}")]
    InvalidReference(String, String),

    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}'", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}
