//! The build scheduler.
//!
//! Readiness-driven execution over a frozen image graph: matched roots are
//! submitted first, and every node reaching a terminal state triggers
//! evaluation of its children. A bounded worker pool performs the actual
//! build and push calls; the graph topology is never mutated here.

use crate::outcome::{BuildState, ImageOutcome, PushState};
use crate::{BuildSummary, Result};
use kiln_core::BuildConfig;
use kiln_graph::{ImageGraph, ImageNode};
use kiln_runtime::{BuildRequest, ContainerRuntime, PushStatus};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Hard per-task ceiling for one build or push call.
///
/// A single streaming call that exceeds it is treated as a failure of that
/// node, not of the run.
pub const TASK_TIMEOUT: Duration = Duration::from_secs(1 << 16);

/// Bounded-concurrency executor over an image graph.
pub struct BuildScheduler {
    config: BuildConfig,
    runtime: Arc<dyn ContainerRuntime>,
}

/// Everything one worker needs; owned, so the spawned task borrows nothing.
struct NodeJob {
    name: String,
    request: BuildRequest,
}

struct WorkerOutcome {
    name: String,
    outcome: ImageOutcome,
}

impl WorkerOutcome {
    /// Outcome for a worker that never reached a terminal state.
    fn pending(name: String) -> Self {
        Self {
            name,
            outcome: ImageOutcome::default(),
        }
    }
}

impl BuildScheduler {
    /// Create a scheduler over a runtime client.
    pub fn new(config: BuildConfig, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { config, runtime }
    }

    /// Build (and optionally push) every matched node of `graph`.
    ///
    /// `ready` is the set of images already present locally; with the
    /// consistency-cascade policy enabled, a ready child of a rebuilt
    /// parent is rebuilt even if it was never matched. `cancel` stops new
    /// submissions and aborts in-flight streaming; the summary still covers
    /// every node that reached a terminal state.
    ///
    /// # Errors
    ///
    /// Fails only when registry login fails; per-node failures are
    /// recorded in the returned summary.
    pub async fn run(
        &self,
        graph: &ImageGraph,
        ready: &HashSet<String>,
        cancel: &CancellationToken,
    ) -> Result<BuildSummary> {
        if self.config.push
            && let Some(registry) = &self.config.registry
        {
            self.runtime.login(registry).await?;
        }

        let semaphore = Arc::new(Semaphore::new(self.config.effective_workers()));
        let mut join_set: JoinSet<WorkerOutcome> = JoinSet::new();
        let mut outcomes: HashMap<String, ImageOutcome> = HashMap::new();
        let mut submitted: HashSet<String> = HashSet::new();

        // Initial frontier: matched nodes whose parent is absent or not
        // matched. Their prerequisites are outside this run's scope or
        // already satisfied locally.
        for node in graph.iter() {
            if !node.matched {
                continue;
            }
            let parent_matched = node
                .parent
                .as_deref()
                .and_then(|parent| graph.get(parent))
                .is_some_and(|parent| parent.matched);
            if !parent_matched {
                self.submit(node, &mut join_set, &mut submitted, &semaphore, cancel);
            }
        }
        info!(
            frontier = join_set.len(),
            matched = graph.matched_names().len(),
            workers = self.config.effective_workers(),
            "Scheduler started"
        );

        while let Some(joined) = join_set.join_next().await {
            let WorkerOutcome { name, outcome } = match joined {
                Ok(result) => result,
                Err(join_error) => {
                    error!(%join_error, "Build worker panicked");
                    continue;
                }
            };
            debug!(image = %name, build = ?outcome.build, push = ?outcome.push, "Node finished");
            outcomes.insert(name.clone(), outcome);

            if cancel.is_cancelled() {
                // Drain in-flight workers, submit nothing new.
                continue;
            }
            if outcome.build != BuildState::Success {
                if outcome.build == BuildState::Failed {
                    warn!(image = %name, "Build failed, its subtree is blocked");
                }
                continue;
            }

            let Some(parent) = graph.get(&name) else {
                continue;
            };
            for child_name in &parent.children {
                if submitted.contains(child_name) {
                    continue;
                }
                let Some(child) = graph.get(child_name) else {
                    continue;
                };
                let cascade = self.config.cascade_descendants && ready.contains(child_name);
                if child.matched || cascade {
                    if cascade && !child.matched {
                        info!(
                            image = %child_name,
                            parent = %name,
                            "Rebuilding ready descendant to stay consistent with its parent"
                        );
                    }
                    self.submit(child, &mut join_set, &mut submitted, &semaphore, cancel);
                }
            }
        }

        let interrupted = cancel.is_cancelled();
        if interrupted {
            warn!("Run interrupted, reporting partial results");
        }
        Ok(BuildSummary::from_outcomes(&outcomes, interrupted))
    }

    fn submit(
        &self,
        node: &ImageNode,
        join_set: &mut JoinSet<WorkerOutcome>,
        submitted: &mut HashSet<String>,
        semaphore: &Arc<Semaphore>,
        cancel: &CancellationToken,
    ) {
        if cancel.is_cancelled() {
            debug!(image = %node.name, "Cancelled, rejecting submission");
            return;
        }
        submitted.insert(node.name.clone());
        debug!(image = %node.name, tag = %node.full_tag, "Submitted");

        let job = NodeJob {
            name: node.name.clone(),
            request: BuildRequest {
                context_dir: node.context_dir.clone(),
                definition_path: node.definition_path.clone(),
                tag: node.full_tag.clone(),
                no_cache: self.config.no_cache,
            },
        };
        let runtime = Arc::clone(&self.runtime);
        let semaphore = Arc::clone(semaphore);
        let cancel = cancel.clone();
        let push_enabled = self.config.push;
        join_set.spawn(run_node(job, runtime, semaphore, cancel, push_enabled));
    }
}

/// One worker: acquire a pool slot, build, then push when enabled.
async fn run_node(
    job: NodeJob,
    runtime: Arc<dyn ContainerRuntime>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    push_enabled: bool,
) -> WorkerOutcome {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return WorkerOutcome::pending(job.name);
    };
    if cancel.is_cancelled() {
        // Queued but never started; cancelled outright.
        debug!(image = %job.name, "Cancelled before start");
        return WorkerOutcome::pending(job.name);
    }

    let build = match timeout(TASK_TIMEOUT, runtime.build(&job.request, &cancel)).await {
        Err(_) => {
            error!(image = %job.name, "Build exceeded task timeout");
            BuildState::Failed
        }
        Ok(Err(kiln_runtime::Error::Cancelled { .. })) => {
            warn!(image = %job.name, "Build interrupted");
            return WorkerOutcome::pending(job.name);
        }
        Ok(Err(err)) => {
            error!(image = %job.name, error = %err, "Build errored");
            BuildState::Failed
        }
        Ok(Ok(output)) if output.success => BuildState::Success,
        Ok(Ok(output)) => {
            warn!(image = %job.name, exit = output.exit_code, "Build failed");
            BuildState::Failed
        }
    };

    let push = if !push_enabled {
        PushState::Skipped
    } else if build != BuildState::Success {
        // Never attempted; a failed build makes the push an automatic
        // failure so the node is fully accounted for.
        warn!(image = %job.name, "Push skipped after failed build");
        PushState::Failed
    } else {
        match timeout(TASK_TIMEOUT, runtime.push(&job.request.tag, &cancel)).await {
            Err(_) => {
                error!(image = %job.name, "Push exceeded task timeout");
                PushState::Failed
            }
            Ok(Err(kiln_runtime::Error::Cancelled { .. })) => {
                warn!(image = %job.name, "Push interrupted");
                PushState::Pending
            }
            Ok(Err(err)) => {
                error!(image = %job.name, error = %err, "Push errored");
                PushState::Failed
            }
            Ok(Ok(output)) => match output.status {
                PushStatus::Pushed => PushState::Success,
                PushStatus::AlreadyExists => PushState::AlreadyExists,
                PushStatus::Failed => PushState::Failed,
            },
        }
    };

    WorkerOutcome {
        name: job.name,
        outcome: ImageOutcome { build, push },
    }
}
