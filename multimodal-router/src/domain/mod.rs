//! Domain types for the multimodal route planner.
//!
//! This module contains the core value types: node identifiers, endpoint
//! locations, transport modes and great-circle geometry. All types enforce
//! their invariants at construction time, so code that receives them can
//! trust their validity.

mod error;
mod geo;
mod location;
pub mod mode;
mod node_id;

pub use error::{EndpointRole, ValidationError};
pub use geo::{Coordinates, EARTH_RADIUS_KM, haversine_km};
pub use location::{Location, LocationInput};
pub use mode::TransportMode;
pub use node_id::{InvalidNodeId, NodeId};
