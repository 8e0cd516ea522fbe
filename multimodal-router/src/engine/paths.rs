//! Transfer-bounded enumeration of simple paths.
//!
//! This is a reachability enumeration, not a shortest-path search. States
//! are deduplicated on `(node, transfers)`: the first route discovered into
//! a state is the only one that branches from it. Arrivals at the target
//! are never deduplicated, so parallel flights or voyages into the target
//! each produce their own path.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, trace};

use crate::domain::{NodeId, TransportMode};
use crate::graph::{Edge, Graph, Path};

/// Partial path ending at `node`.
struct PathState<'g> {
    node: &'g NodeId,
    visited: Vec<&'g NodeId>,
    last_mode: Option<TransportMode>,
    transfers: usize,
    edges: Vec<&'g Edge>,
}

/// All paths from `source` to `target` with at most `max_transfers` mode
/// changes, in discovery order.
///
/// Empty when `source == target` or `source` is not in the graph.
pub fn enumerate_paths(
    graph: &Graph,
    source: &NodeId,
    target: &NodeId,
    max_transfers: usize,
) -> Vec<Path> {
    if source == target || !graph.contains_node(source) {
        return Vec::new();
    }

    let mut adjacency: HashMap<&NodeId, Vec<&Edge>> = HashMap::new();
    for edge in graph.edges() {
        adjacency.entry(&edge.source).or_default().push(edge);
    }

    let mut paths = Vec::new();
    let mut seen: HashSet<(&NodeId, usize)> = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(PathState {
        node: source,
        visited: vec![source],
        last_mode: None,
        transfers: 0,
        edges: Vec::new(),
    });

    while let Some(state) = queue.pop_front() {
        let Some(outgoing) = adjacency.get(state.node) else {
            continue;
        };

        for &edge in outgoing {
            let next = &edge.target;
            if state.visited.contains(&next) {
                continue;
            }

            let transfers = match state.last_mode {
                Some(mode) if mode != edge.mode => state.transfers + 1,
                _ => state.transfers,
            };
            if transfers > max_transfers {
                continue;
            }

            let mut edges = state.edges.clone();
            edges.push(edge);

            if next == target {
                match Path::new(edges.into_iter().cloned().collect()) {
                    Ok(path) => paths.push(path),
                    Err(e) => trace!(error = %e, "Discarding malformed path"),
                }
                continue;
            }

            if !seen.insert((next, transfers)) {
                continue;
            }

            trace!(node = %next, transfers, depth = edges.len(), "Enqueue");
            let mut visited = state.visited.clone();
            visited.push(next);
            queue.push_back(PathState {
                node: next,
                visited,
                last_mode: Some(edge.mode),
                transfers,
                edges,
            });
        }
    }

    debug!(
        source = %source,
        target = %target,
        max_transfers,
        paths = paths.len(),
        "Enumerated paths"
    );
    paths
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::Coordinates;
    use crate::graph::{Node, NodeKind, count_transfers};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    const MODES: [TransportMode; 3] = [TransportMode::Road, TransportMode::Sea, TransportMode::Air];

    fn node_id(i: usize) -> NodeId {
        NodeId::parse(&format!("N{i}")).unwrap()
    }

    /// Random graph over `n` nodes from `(source, target, mode)` triples.
    fn build(n: usize, links: &[(usize, usize, usize)]) -> Graph {
        let midnight = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let mut graph = Graph::new();
        for i in 0..n {
            graph.insert_node(Node::new(
                node_id(i),
                format!("node {i}"),
                NodeKind::Location,
                Coordinates::new(i as f64, 0.0),
            ));
        }
        for &(a, b, m) in links {
            let (a, b) = (a % n, b % n);
            if a == b {
                continue;
            }
            let mut edge = Edge::road(node_id(a), node_id(b), 10.0 * (a + b + 1) as f64, midnight);
            edge.mode = MODES[m % MODES.len()];
            graph.add_edge(edge).unwrap();
        }
        graph
    }

    fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize, usize)>)> {
        (2usize..7).prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec((0..n, 0..n, 0usize..3), 0..20),
            )
        })
    }

    proptest! {
        #[test]
        fn paths_satisfy_invariants(
            (n, links) in graph_strategy(),
            max_transfers in 0usize..4,
        ) {
            let graph = build(n, &links);
            let source = node_id(0);
            let target = node_id(n - 1);

            for path in enumerate_paths(&graph, &source, &target, max_transfers) {
                let nodes = path.node_seq();
                let edges = path.edge_seq();

                prop_assert_eq!(edges.len(), nodes.len() - 1);
                prop_assert_eq!(&nodes[0], &source);
                prop_assert_eq!(nodes.last(), Some(&target));

                let unique: HashSet<&NodeId> = nodes.iter().collect();
                prop_assert_eq!(unique.len(), nodes.len());

                prop_assert_eq!(path.transfer_count(), count_transfers(edges));
                prop_assert!(path.transfer_count() <= max_transfers);

                let duration: f64 = edges.iter().map(|e| e.duration_hours).sum();
                prop_assert!((path.totals().duration - duration).abs() < 1e-9);

                for edge in edges {
                    prop_assert!(graph.edges().contains(edge));
                }
            }
        }

        #[test]
        fn loosening_transfers_never_loses_reachability(
            (n, links) in graph_strategy(),
        ) {
            let graph = build(n, &links);
            let source = node_id(0);
            let target = node_id(n - 1);

            let strict = enumerate_paths(&graph, &source, &target, 0);
            let loose = enumerate_paths(&graph, &source, &target, 3);
            if !strict.is_empty() {
                prop_assert!(!loose.is_empty());
            }
        }
    }
}
