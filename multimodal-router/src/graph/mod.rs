//! The multimodal transport graph.
//!
//! Nodes are endpoints, hubs and resolved layovers; edges are mode-tagged
//! connections carrying their own distance, time, cost and emissions.

mod edge;
mod model;
mod node;
mod path;

pub use edge::{Edge, StopRef, hours, hours_between};
pub use model::{Graph, GraphDelta, GraphError, MergeStats};
pub use node::{Node, NodeKind};
pub use path::{Path, PathTotals, count_transfers};
