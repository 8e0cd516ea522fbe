//! Journey endpoints.

use serde::Deserialize;

use super::error::{EndpointRole, ValidationError};
use super::geo::Coordinates;
use super::node_id::NodeId;

/// A validated origin or destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: NodeId,
    pub name: String,
    pub coords: Coordinates,
}

impl Location {
    /// Creates a location. The name defaults to the id when `None`.
    pub fn new(id: NodeId, name: Option<String>, coords: Coordinates) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| id.as_str().to_string());
        Self { id, name, coords }
    }
}

/// An endpoint as supplied by a caller, before validation.
///
/// Every field is optional so that missing values surface as a
/// [`ValidationError`] rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationInput {
    /// Validate into a [`Location`].
    pub fn validate(self, role: EndpointRole) -> Result<Location, ValidationError> {
        let id = self
            .id
            .as_deref()
            .and_then(|raw| NodeId::parse(raw).ok())
            .ok_or(ValidationError::MissingId(role))?;

        let lat = self
            .lat
            .ok_or(ValidationError::MissingCoordinate { role, field: "lat" })?;
        let lng = self
            .lng
            .ok_or(ValidationError::MissingCoordinate { role, field: "lng" })?;

        let coords = Coordinates::new(lat, lng);
        if !coords.is_valid() {
            return Err(ValidationError::InvalidCoordinates { role, lat, lng });
        }

        Ok(Location::new(id, self.name, coords))
    }
}
