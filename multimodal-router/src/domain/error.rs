//! Domain error types.
//!
//! These errors represent validation failures of caller-supplied input.
//! They are raised before any gateway is contacted and are distinct from
//! API/IO errors.

use std::fmt;

/// Which end of the journey a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Origin,
    Destination,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Origin => f.write_str("origin"),
            EndpointRole::Destination => f.write_str("destination"),
        }
    }
}

/// Invalid search input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Endpoint has no usable id
    #[error("{0} must include an id")]
    MissingId(EndpointRole),

    /// Endpoint is missing a latitude or longitude
    #[error("{role} must include {field}")]
    MissingCoordinate {
        role: EndpointRole,
        field: &'static str,
    },

    /// Coordinates are not finite or fall outside the valid ranges
    #[error("{role} has invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates {
        role: EndpointRole,
        lat: f64,
        lng: f64,
    },

    /// Origin and destination share an id
    #[error("origin and destination must have distinct ids (both are {0})")]
    SameId(String),

    /// Start date is not a calendar date
    #[error("invalid start date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),
}
