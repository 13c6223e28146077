//! Result aggregation.

use crate::outcome::{BuildState, ImageOutcome, PushState};
use std::collections::HashMap;
use std::fmt;

/// Aggregated outcome of one scheduling run.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    /// Nodes whose build succeeded.
    pub build_succeeded: Vec<String>,
    /// Nodes whose build failed.
    pub build_failed: Vec<String>,
    /// Nodes whose push uploaded layers.
    pub push_succeeded: Vec<String>,
    /// Nodes whose layers were already in the registry.
    pub push_exists: Vec<String>,
    /// Nodes whose push failed.
    pub push_failed: Vec<String>,
    /// The run was interrupted before draining every submitted node.
    pub interrupted: bool,
}

impl BuildSummary {
    /// Partition recorded outcomes into summary buckets.
    ///
    /// Nodes that never reached a terminal state (interrupted before their
    /// worker ran) appear in no bucket. Bucket contents are sorted for
    /// stable reporting.
    #[must_use]
    pub fn from_outcomes(outcomes: &HashMap<String, ImageOutcome>, interrupted: bool) -> Self {
        let mut summary = Self {
            interrupted,
            ..Self::default()
        };
        for (name, outcome) in outcomes {
            match outcome.build {
                BuildState::Success => summary.build_succeeded.push(name.clone()),
                BuildState::Failed => summary.build_failed.push(name.clone()),
                BuildState::Pending => {}
            }
            match outcome.push {
                PushState::Success => summary.push_succeeded.push(name.clone()),
                PushState::AlreadyExists => summary.push_exists.push(name.clone()),
                PushState::Failed => summary.push_failed.push(name.clone()),
                PushState::Pending | PushState::Skipped => {}
            }
        }
        summary.build_succeeded.sort();
        summary.build_failed.sort();
        summary.push_succeeded.sort();
        summary.push_exists.sort();
        summary.push_failed.sort();
        summary
    }

    /// Overall verdict: no build or push failures and no interruption.
    #[must_use]
    pub fn success(&self) -> bool {
        self.build_failed.is_empty() && self.push_failed.is_empty() && !self.interrupted
    }
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn bucket(f: &mut fmt::Formatter<'_>, label: &str, names: &[String]) -> fmt::Result {
            if names.is_empty() {
                return Ok(());
            }
            writeln!(f, "  {} ({}): {}", label, names.len(), names.join(", "))
        }

        writeln!(f, "Build summary:")?;
        bucket(f, "built", &self.build_succeeded)?;
        bucket(f, "build failed", &self.build_failed)?;
        bucket(f, "pushed", &self.push_succeeded)?;
        bucket(f, "already in registry", &self.push_exists)?;
        bucket(f, "push failed", &self.push_failed)?;
        if self.interrupted {
            writeln!(f, "  run was interrupted")?;
        }
        write!(
            f,
            "Result: {}",
            if self.success() { "success" } else { "failure" }
        )
    }
}
