//! Error types for graph construction and selection.
//!
//! Every variant here is fatal: graph errors abort the run before any
//! building begins. Per-node build and push failures are outcomes, not
//! errors, and live in the scheduler's result table instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or selecting the image graph.
#[derive(Debug, Error)]
pub enum Error {
    /// Two components resolved to the same node name.
    #[error("Duplicate component name '{name}'")]
    DuplicateComponent { name: String },

    /// A component directory has no build definition and skipping is off.
    #[error("Component '{component}' has no build definition")]
    MissingDefinition { component: String },

    /// A component directory has more than one build definition candidate.
    #[error("Component '{component}' has {count} build definition candidates, expected one")]
    AmbiguousDefinition { component: String, count: usize },

    /// A rendered definition contains no `FROM` line.
    #[error("No FROM line in '{}'", path.display())]
    MissingFrom { path: PathBuf },

    /// A `FROM` line exists but carries no image reference.
    #[error("Malformed FROM line in '{}': '{line}'", path.display())]
    MalformedFrom { path: PathBuf, line: String },

    /// A `FROM` reference in the active namespace names a component that
    /// does not exist in the graph.
    #[error("Component '{component}' is based on unknown image '{parent}'")]
    UnknownParent { component: String, parent: String },

    /// Parent links form a cycle.
    #[error("Image dependency graph contains a cycle involving: {members}")]
    CycleDetected { members: String },

    /// A requested component filter matched nothing.
    #[error("No component matches '{filter}'")]
    UnknownComponent { filter: String },

    /// Template rendering failed.
    #[error(transparent)]
    Render(#[from] kiln_render::Error),

    /// A filesystem operation failed during discovery.
    #[error("Failed to {operation} '{}'", path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
