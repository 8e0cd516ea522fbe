//! Enumerated itineraries over the graph.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::NodeId;

use super::edge::Edge;
use super::model::GraphError;

/// Field-wise sums over a path's edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PathTotals {
    /// Kilometres
    pub distance: f64,
    /// Hours
    pub duration: f64,
    pub cost: f64,
    /// Kilograms of CO2
    pub emissions: f64,
}

impl PathTotals {
    fn add(&mut self, edge: &Edge) {
        self.distance += edge.distance_km;
        self.duration += edge.duration_hours;
        self.cost += edge.cost;
        self.emissions += edge.emissions_kg;
    }
}

/// A simple path from source to target.
///
/// # Invariants
///
/// - `edge_seq` is non-empty and `node_seq.len() == edge_seq.len() + 1`
/// - Edge `i` runs from `node_seq[i]` to `node_seq[i + 1]`
/// - `node_seq` has no repeats
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Path {
    node_seq: Vec<NodeId>,
    edge_seq: Vec<Edge>,
    transfer_count: usize,
    totals: PathTotals,
    departure_time: NaiveDateTime,
    arrival_time: NaiveDateTime,
}

impl Path {
    /// Build a path from its edges, deriving the node sequence and metrics.
    pub fn new(edge_seq: Vec<Edge>) -> Result<Self, GraphError> {
        let first = edge_seq.first().ok_or(GraphError::EmptyPath)?;
        let last = edge_seq.last().ok_or(GraphError::EmptyPath)?;

        let mut node_seq = Vec::with_capacity(edge_seq.len() + 1);
        node_seq.push(first.source.clone());

        for (i, edge) in edge_seq.iter().enumerate() {
            if node_seq.last() != Some(&edge.source) || node_seq.contains(&edge.target) {
                return Err(GraphError::Disconnected(i));
            }
            node_seq.push(edge.target.clone());
        }

        let mut totals = PathTotals::default();
        for edge in &edge_seq {
            totals.add(edge);
        }

        Ok(Self {
            transfer_count: count_transfers(&edge_seq),
            departure_time: first.departure_time,
            arrival_time: last.arrival_time,
            node_seq,
            edge_seq,
            totals,
        })
    }

    pub fn node_seq(&self) -> &[NodeId] {
        &self.node_seq
    }

    pub fn edge_seq(&self) -> &[Edge] {
        &self.edge_seq
    }

    pub fn transfer_count(&self) -> usize {
        self.transfer_count
    }

    pub fn totals(&self) -> PathTotals {
        self.totals
    }

    pub fn departure_time(&self) -> NaiveDateTime {
        self.departure_time
    }

    pub fn arrival_time(&self) -> NaiveDateTime {
        self.arrival_time
    }
}

/// Number of mode changes between consecutive edges.
pub fn count_transfers(edges: &[Edge]) -> usize {
    edges.windows(2).filter(|w| w[0].mode != w[1].mode).count()
}
