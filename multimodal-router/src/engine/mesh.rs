//! Road links between hubs that are close to each other.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::graph::{Edge, Graph, GraphDelta, Node};

/// Link every pair of non-endpoint nodes within `radius_km` of each other
/// by road, in both directions, unless a road edge already joins them.
///
/// Returns the number of edges added.
pub fn connect_nearby_hubs(graph: &mut Graph, radius_km: f64, departure: NaiveDateTime) -> usize {
    let hubs: Vec<&Node> = graph.nodes().filter(|n| !n.kind.is_endpoint()).collect();
    let mut delta = GraphDelta::new();

    for (i, a) in hubs.iter().enumerate() {
        for b in &hubs[i + 1..] {
            let distance = a.distance_km(b);
            if distance > radius_km || graph.has_road_between(&a.id, &b.id) {
                continue;
            }
            let there = Edge::road(a.id.clone(), b.id.clone(), distance, departure);
            delta.add_edge(there.reversed_road());
            delta.add_edge(there);
        }
    }

    let stats = graph.merge(delta);
    debug!(hubs = graph.node_count(), edges_added = stats.edges_added, "Connected nearby hubs");
    stats.edges_added
}
