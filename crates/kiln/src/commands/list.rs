//! The `list` subcommand: show the graph without building.

use crate::cli::ListArgs;
use kiln_graph::{discover_graph, ready_set, select_matches};
use kiln_render::TemplateRenderer;
use kiln_runtime::{ContainerRuntime, DockerCli};
use miette::IntoDiagnostic;
use std::path::Path;
use tracing::warn;

pub async fn run(config_path: &Path, args: ListArgs) -> miette::Result<i32> {
    let config = super::load_config(config_path)?;

    let renderer = TemplateRenderer::new();
    let mut graph = discover_graph(&config, &renderer, &[]).into_diagnostic()?;

    // A reachable runtime refines the listing; an unreachable one only
    // costs readiness markers.
    let runtime = DockerCli::new();
    let ready = match runtime.list_local_images().await {
        Ok(listing) => ready_set(listing, &config.namespace, &config.tag),
        Err(err) => {
            warn!(error = %err, "Runtime unavailable, assuming no ready images");
            std::collections::HashSet::new()
        }
    };

    select_matches(&mut graph, &args.components, &ready, config.backfill_ancestors)
        .into_diagnostic()?;

    println!("{} components, build order:", graph.len());
    for name in graph.build_order() {
        let Some(node) = graph.get(&name) else {
            continue;
        };
        let parent = node.parent.as_deref().unwrap_or("-");
        let state = if ready.contains(&name) { "ready" } else { "" };
        println!("  {:<24} parent={:<24} {} {}", node.name, parent, node.full_tag, state);
    }
    let unmatched: Vec<String> = graph
        .iter()
        .filter(|node| !node.matched)
        .map(|node| node.name.clone())
        .collect();
    if !unmatched.is_empty() {
        println!("not selected: {}", unmatched.join(", "));
    }

    Ok(0)
}
