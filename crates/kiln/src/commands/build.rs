//! The `build` subcommand: the full pipeline.
//!
//! Discover the graph, query the runtime for ready images, select what to
//! build, schedule, and report.

use crate::cli::BuildArgs;
use crate::{EXIT_FAILURE, EXIT_SIGINT};
use kiln_builder::BuildScheduler;
use kiln_graph::{discover_graph, ready_set, select_matches};
use kiln_render::TemplateRenderer;
use kiln_runtime::{ContainerRuntime, DockerCli};
use miette::IntoDiagnostic;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run(
    config_path: &Path,
    args: BuildArgs,
    cancel: CancellationToken,
) -> miette::Result<i32> {
    let mut config = super::load_config(config_path)?;
    args.apply(&mut config);

    let renderer = TemplateRenderer::new();
    let mut graph = discover_graph(&config, &renderer, &[]).into_diagnostic()?;

    let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerCli::new());
    let listing = runtime.list_local_images().await.into_diagnostic()?;
    let ready = ready_set(listing, &config.namespace, &config.tag);

    select_matches(&mut graph, &args.components, &ready, config.backfill_ancestors)
        .into_diagnostic()?;
    info!(
        matched = graph.matched_names().len(),
        ready = ready.len(),
        "Starting build run"
    );

    let scheduler = BuildScheduler::new(config, runtime);
    let summary = scheduler
        .run(&graph, &ready, &cancel)
        .await
        .into_diagnostic()?;

    println!("{summary}");

    if summary.interrupted {
        Ok(EXIT_SIGINT)
    } else if summary.success() {
        Ok(0)
    } else {
        Ok(EXIT_FAILURE)
    }
}
