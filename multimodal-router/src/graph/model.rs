//! The transport graph and the local deltas merged into it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{NodeId, TransportMode};

use super::edge::Edge;
use super::node::Node;

/// Graph consistency errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// An edge references a node that is not in the graph
    #[error("edge {source_id} -> {target_id} references unknown node {missing}")]
    UnknownNode {
        source_id: NodeId,
        target_id: NodeId,
        missing: NodeId,
    },

    /// A node is stored under a key that differs from its id
    #[error("node {actual} stored under key {key}")]
    MismatchedKey { key: NodeId, actual: NodeId },

    /// A path was built without edges
    #[error("path must have at least one edge")]
    EmptyPath,

    /// Consecutive path elements don't line up
    #[error("path is not connected at position {0}")]
    Disconnected(usize),
}

/// Counts reported by [`Graph::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub nodes_added: usize,
    pub edges_added: usize,
    pub edges_dropped: usize,
}

/// Transport graph: nodes keyed by id plus an append-only edge list.
///
/// # Invariants
///
/// - Every edge's source and target are present in `nodes`
/// - A node id is inserted at most once; later inserts are ignored
///
/// Nodes keep insertion order so that serialized output and traversal order
/// are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless one with the same id exists.
    ///
    /// Returns true if the node was inserted.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Append an edge whose endpoints are already in the graph.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        self.check_endpoints(&edge)?;
        self.edges.push(edge);
        Ok(())
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if a road edge links `a` and `b` in either direction.
    pub fn has_road_between(&self, a: &NodeId, b: &NodeId) -> bool {
        self.edges
            .iter()
            .any(|e| e.mode == TransportMode::Road && e.connects(a, b))
    }

    /// Apply a delta: nodes first, then edges.
    ///
    /// Edges whose endpoints are still missing after the node pass are
    /// dropped rather than failing the merge.
    pub fn merge(&mut self, delta: GraphDelta) -> MergeStats {
        let mut stats = MergeStats::default();

        for node in delta.nodes {
            if self.insert_node(node) {
                stats.nodes_added += 1;
            }
        }

        for edge in delta.edges {
            match self.add_edge(edge) {
                Ok(()) => stats.edges_added += 1,
                Err(e) => {
                    debug!(error = %e, "Dropping edge from delta");
                    stats.edges_dropped += 1;
                }
            }
        }

        stats
    }

    /// Check the graph invariants.
    ///
    /// Needed for graphs that arrive from outside (deserialized), since
    /// those bypass [`Graph::add_edge`].
    pub fn validate(&self) -> Result<(), GraphError> {
        for (key, node) in &self.nodes {
            if key != &node.id {
                return Err(GraphError::MismatchedKey {
                    key: key.clone(),
                    actual: node.id.clone(),
                });
            }
        }
        self.edges.iter().try_for_each(|e| self.check_endpoints(e))
    }

    fn check_endpoints(&self, edge: &Edge) -> Result<(), GraphError> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::UnknownNode {
                    source_id: edge.source.clone(),
                    target_id: edge.target.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        Ok(())
    }
}

/// New nodes and edges computed by one concurrent task.
///
/// Tasks never write the shared graph; the single writer merges their
/// deltas once the whole batch has settled.
#[derive(Debug, Clone, Default)]
pub struct GraphDelta {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
