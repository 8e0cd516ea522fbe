//! Graph nodes.

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinates, Location, NodeId, TransportMode};

/// What a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Origin,
    Destination,
    Airport,
    Seaport,
    /// A point that is neither an endpoint nor a known hub.
    Location,
}

impl NodeKind {
    /// The hub kind served by a scheduled mode.
    pub fn hub_for(mode: TransportMode) -> Option<NodeKind> {
        match mode {
            TransportMode::Air => Some(NodeKind::Airport),
            TransportMode::Sea => Some(NodeKind::Seaport),
            TransportMode::Road => None,
        }
    }

    pub fn is_endpoint(self) -> bool {
        matches!(self, NodeKind::Origin | NodeKind::Destination)
    }

    pub fn is_hub(self) -> bool {
        matches!(self, NodeKind::Airport | NodeKind::Seaport)
    }
}

/// A node in the transport graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub lat: f64,
    pub lng: f64,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind, coords: Coordinates) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            lat: coords.lat,
            lng: coords.lng,
        }
    }

    /// Node for a journey endpoint.
    pub fn endpoint(location: &Location, kind: NodeKind) -> Self {
        Self::new(location.id.clone(), location.name.clone(), kind, location.coords)
    }

    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    pub fn distance_km(&self, other: &Node) -> f64 {
        self.coords().distance_km(&other.coords())
    }
}
