//! Image dependency graph for kiln.
//!
//! Builds a forest of image nodes from per-component build definitions:
//! each component contributes one node, and a node's rendered definition
//! names its parent through a `FROM <namespace>/<name>` line. The graph is
//! assembled single-threaded, selection marks the subset to build, and the
//! frozen topology is then handed to the scheduler.

mod discover;
mod error;
mod graph;
mod parse;
mod ready;
mod select;

pub use discover::discover_graph;
pub use error::{Error, Result};
pub use graph::{ImageGraph, ImageNode};
pub use parse::parse_base_image;
pub use ready::ready_set;
pub use select::select_matches;
