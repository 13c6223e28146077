//! The image graph arena.
//!
//! Nodes are stored in an insertion-ordered arena keyed by name; parent and
//! child links are name keys rather than references, so the topology can be
//! shared immutably with the scheduler once construction finishes.

use crate::{Error, Result};
use kiln_core::ImageRef;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::DiGraph;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// One image build unit.
#[derive(Debug, Clone)]
pub struct ImageNode {
    /// Unique short name (the component directory name).
    pub name: String,
    /// Fully qualified tag the image is built and pushed under.
    pub full_tag: String,
    /// Rendered build definition on disk.
    pub definition_path: PathBuf,
    /// Build context directory handed to the runtime.
    pub context_dir: PathBuf,
    /// Base image parsed from the first `FROM` line, when it followed the
    /// `namespace/name[:tag]` grammar.
    pub base: Option<ImageRef>,
    /// Parent node name, set by the link pass when the base image lives in
    /// the active namespace.
    pub parent: Option<String>,
    /// Names of nodes whose parent is this node.
    pub children: Vec<String>,
    /// Selected for building in the current run.
    pub matched: bool,
}

impl ImageNode {
    /// Create an unlinked, unmatched node.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        full_tag: impl Into<String>,
        definition_path: impl Into<PathBuf>,
        context_dir: impl Into<PathBuf>,
        base: Option<ImageRef>,
    ) -> Self {
        Self {
            name: name.into(),
            full_tag: full_tag.into(),
            definition_path: definition_path.into(),
            context_dir: context_dir.into(),
            base,
            parent: None,
            children: Vec::new(),
            matched: false,
        }
    }
}

/// Forest of image nodes keyed by name.
#[derive(Debug, Default)]
pub struct ImageGraph {
    nodes: HashMap<String, ImageNode>,
    /// Insertion order, for deterministic iteration and reporting.
    order: Vec<String>,
}

impl ImageGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the arena.
    ///
    /// # Errors
    ///
    /// Fails if a node with the same name already exists.
    pub fn insert(&mut self, node: ImageNode) -> Result<()> {
        if self.nodes.contains_key(&node.name) {
            return Err(Error::DuplicateComponent { name: node.name });
        }
        debug!(component = %node.name, tag = %node.full_tag, "Added image node");
        self.order.push(node.name.clone());
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    /// Link parents and children from each node's base reference.
    ///
    /// Runs after every node exists, so definition discovery order does not
    /// matter. A base image in `namespace` must resolve to a node in the
    /// arena; the pass finishes with a cycle check over the resulting
    /// parent links.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable in-namespace base or a dependency cycle.
    pub fn link_parents(&mut self, namespace: &str) -> Result<()> {
        let mut links: Vec<(String, String)> = Vec::new();
        for name in &self.order {
            let node = &self.nodes[name];
            let Some(base) = &node.base else { continue };
            if !base.in_namespace(namespace) {
                continue;
            }
            if !self.nodes.contains_key(&base.name) {
                return Err(Error::UnknownParent {
                    component: name.clone(),
                    parent: base.to_string(),
                });
            }
            links.push((name.clone(), base.name.clone()));
        }

        for (child, parent) in links {
            debug!(%child, %parent, "Linked image to parent");
            if let Some(node) = self.nodes.get_mut(&child) {
                node.parent = Some(parent.clone());
            }
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.push(child);
            }
        }

        self.check_cycles()
    }

    fn check_cycles(&self) -> Result<()> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut indices = HashMap::new();
        for name in &self.order {
            indices.insert(name.as_str(), graph.add_node(name.as_str()));
        }
        for node in self.nodes.values() {
            if let Some(parent) = &node.parent {
                graph.add_edge(indices[parent.as_str()], indices[node.name.as_str()], ());
            }
        }
        if is_cyclic_directed(&graph) {
            let members = self
                .order
                .iter()
                .filter(|name| self.nodes[*name].parent.is_some())
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::CycleDetected { members });
        }
        Ok(())
    }

    /// Names in a parent-before-child order, restricted to matched nodes.
    ///
    /// Used for reporting; the scheduler derives its own order dynamically
    /// from completion events.
    #[must_use]
    pub fn build_order(&self) -> Vec<String> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut indices = HashMap::new();
        for name in &self.order {
            indices.insert(name.as_str(), graph.add_node(name.as_str()));
        }
        for node in self.nodes.values() {
            if let Some(parent) = &node.parent {
                graph.add_edge(indices[parent.as_str()], indices[node.name.as_str()], ());
            }
        }
        match toposort(&graph, None) {
            Ok(sorted) => sorted
                .into_iter()
                .map(|idx| graph[idx].to_string())
                .filter(|name| self.nodes[name].matched)
                .collect(),
            // Cycles are rejected by link_parents; an empty order here only
            // happens if the graph was never linked.
            Err(_) => Vec::new(),
        }
    }

    /// Look up a node by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ImageNode> {
        self.nodes.get(name)
    }

    /// Look up a node mutably; construction-phase only.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ImageNode> {
        self.nodes.get_mut(name)
    }

    /// Whether a node exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageNode> {
        self.order.iter().filter_map(|name| self.nodes.get(name))
    }

    /// Names of all matched nodes, in insertion order.
    #[must_use]
    pub fn matched_names(&self) -> Vec<String> {
        self.iter()
            .filter(|node| node.matched)
            .map(|node| node.name.clone())
            .collect()
    }
}
