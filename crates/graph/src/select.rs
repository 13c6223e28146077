//! Match selection.
//!
//! Marks the subset of nodes to build this run: explicit filters first,
//! then ancestor backfill so requested images never miss a prerequisite.
//! The descendant consistency cascade is not computed here; the scheduler
//! applies it lazily so it also covers images that become ready mid-run.

use crate::{Error, ImageGraph, Result};
use std::collections::HashSet;
use tracing::{debug, info};

/// Mark matched nodes.
///
/// An empty `filters` list matches every node. Filters use prefix
/// semantics against node names. When `backfill` is set, ancestors of each
/// matched node are matched too, stopping at the first ancestor that is
/// already matched or already present in `ready`.
///
/// Selection is idempotent: re-running with the same inputs leaves the
/// matched set unchanged.
///
/// # Errors
///
/// Fails when a filter matches no node, naming the filter.
pub fn select_matches(
    graph: &mut ImageGraph,
    filters: &[String],
    ready: &HashSet<String>,
    backfill: bool,
) -> Result<()> {
    let mut explicit: Vec<String> = Vec::new();

    if filters.is_empty() {
        explicit.extend(graph.iter().map(|node| node.name.clone()));
    } else {
        for filter in filters {
            let hits: Vec<String> = graph
                .iter()
                .filter(|node| node.name.starts_with(filter.as_str()))
                .map(|node| node.name.clone())
                .collect();
            if hits.is_empty() {
                return Err(Error::UnknownComponent {
                    filter: filter.clone(),
                });
            }
            explicit.extend(hits);
        }
    }

    for name in &explicit {
        if let Some(node) = graph.get_mut(name) {
            node.matched = true;
        }
    }

    if backfill {
        for name in explicit {
            backfill_ancestors(graph, &name, ready);
        }
    }

    info!(
        matched = graph.matched_names().len(),
        total = graph.len(),
        "Selection complete"
    );
    Ok(())
}

/// Walk up parent links from `name`, matching each ancestor until one is
/// already matched or already ready.
fn backfill_ancestors(graph: &mut ImageGraph, name: &str, ready: &HashSet<String>) {
    let mut current = name.to_string();
    while let Some(parent) = graph.get(&current).and_then(|node| node.parent.clone()) {
        let Some(parent_node) = graph.get_mut(&parent) else {
            break;
        };
        if parent_node.matched || ready.contains(&parent) {
            break;
        }
        debug!(ancestor = %parent, of = %name, "Backfilling missing ancestor");
        parent_node.matched = true;
        current = parent;
    }
}
