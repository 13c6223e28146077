//! The runtime client seam.

use crate::Result;
use async_trait::async_trait;
use kiln_core::RegistryConfig;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Everything the runtime needs to build one image.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Build context directory.
    pub context_dir: PathBuf,
    /// Rendered build definition inside the context.
    pub definition_path: PathBuf,
    /// Fully qualified tag to build under.
    pub tag: String,
    /// Disable the runtime's layer cache.
    pub no_cache: bool,
}

/// Outcome of one build call.
///
/// A failing build is a recorded outcome, not an error; `Err` is reserved
/// for spawn/stream faults and cancellation.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Whether the runtime reported success.
    pub success: bool,
    /// Exit code of the build process.
    pub exit_code: i32,
}

/// Terminal status of one push call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    /// Layers were uploaded.
    Pushed,
    /// Every layer was already present in the registry.
    AlreadyExists,
    /// The push failed.
    Failed,
}

/// Outcome of one push call.
#[derive(Debug, Clone)]
pub struct PushOutput {
    /// Terminal push status.
    pub status: PushStatus,
    /// Exit code of the push process.
    pub exit_code: i32,
}

/// Client for the local container runtime.
///
/// Build and push stream their progress line by line and poll `cancel`
/// between lines; a fired token makes them kill the underlying process and
/// return [`Error::Cancelled`](crate::Error::Cancelled).
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Build an image from a prepared context.
    async fn build(&self, request: &BuildRequest, cancel: &CancellationToken)
    -> Result<BuildOutput>;

    /// Push a previously built tag to its registry.
    async fn push(&self, tag: &str, cancel: &CancellationToken) -> Result<PushOutput>;

    /// Authenticate against a registry.
    async fn login(&self, registry: &RegistryConfig) -> Result<()>;

    /// Repository-tag strings of images present in the local runtime.
    async fn list_local_images(&self) -> Result<Vec<String>>;
}
