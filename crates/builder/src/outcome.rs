//! Per-node outcome state.
//!
//! Each node's states are written exactly once, by the scheduler loop when
//! that node's worker completes; nodes whose worker never ran (cancelled
//! before start, or interrupted mid-stream) stay `Pending` and appear in no
//! summary bucket.

/// Build state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    /// Not started, or interrupted before reaching a terminal state.
    #[default]
    Pending,
    /// The runtime built the image.
    Success,
    /// The build failed (non-zero exit, spawn fault or timeout).
    Failed,
}

/// Push state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushState {
    /// Not started, or interrupted before reaching a terminal state.
    #[default]
    Pending,
    /// Layers were uploaded.
    Success,
    /// Every layer was already present in the registry; a non-failing
    /// outcome distinct from `Success`.
    AlreadyExists,
    /// The push failed.
    Failed,
    /// No push was attempted because pushing is disabled. A build failure
    /// with pushing enabled records `Failed` instead.
    Skipped,
}

/// Combined outcome of one node's worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOutcome {
    /// Terminal (or pending) build state.
    pub build: BuildState,
    /// Terminal (or pending) push state.
    pub push: PushState,
}

impl ImageOutcome {
    /// Whether the node reached a terminal build state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.build != BuildState::Pending
    }
}
