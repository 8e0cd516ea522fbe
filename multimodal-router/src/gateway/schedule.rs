//! Parsed gateway answers.
//!
//! Codes are validated and timestamps parsed; everything the upstream may
//! omit stays optional so the graph builder can backfill it.

use chrono::NaiveDateTime;

use crate::domain::{Coordinates, NodeId, TransportMode};

/// An airport or seaport near some point.
#[derive(Debug, Clone, PartialEq)]
pub struct Hub {
    pub code: NodeId,
    pub name: String,
    pub coords: Coordinates,
}

impl Hub {
    pub fn new(code: NodeId, name: impl Into<String>, coords: Coordinates) -> Self {
        Self {
            code,
            name: name.into(),
            coords,
        }
    }
}

/// Hubs near a point, nearest first as ranked by the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NearestHubs {
    pub airports: Vec<Hub>,
    pub seaports: Vec<Hub>,
}

impl NearestHubs {
    /// Hubs served by `mode`; road has none.
    pub fn for_mode(&self, mode: TransportMode) -> &[Hub] {
        match mode {
            TransportMode::Air => &self.airports,
            TransportMode::Sea => &self.seaports,
            TransportMode::Road => &[],
        }
    }
}

/// A bookable air itinerary between two airports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirItinerary {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub departure: Option<NaiveDateTime>,
    pub arrival: Option<NaiveDateTime>,
    pub duration_hours: Option<f64>,
    pub cost: Option<f64>,
    pub emissions_kg: Option<f64>,
    pub segments: Vec<FlightSegment>,
}

/// One flight of a possibly multi-stop itinerary.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSegment {
    pub from: Option<NodeId>,
    pub to: NodeId,
    pub departure: Option<NaiveDateTime>,
    pub arrival: Option<NaiveDateTime>,
}

/// A complete sea routing between two ports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeaRoute {
    /// Port codes from origin to destination.
    pub path: Vec<NodeId>,
    pub voyages: Vec<Voyage>,
    pub total_duration_days: Option<f64>,
    pub total_cost: Option<f64>,
    pub total_emissions_kg: Option<f64>,
    pub departure: Option<NaiveDateTime>,
    pub arrival: Option<NaiveDateTime>,
}

/// A single vessel voyage within a sea route.
#[derive(Debug, Clone, PartialEq)]
pub struct Voyage {
    pub ship_name: Option<String>,
    pub voyage_number: Option<String>,
    pub from_port: Option<NodeId>,
    pub to_port: NodeId,
    pub to_port_name: Option<String>,
    pub departure: Option<NaiveDateTime>,
    pub arrival: Option<NaiveDateTime>,
    pub schedule: Vec<ScheduleStop>,
}

/// A port call listed in a voyage schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleStop {
    pub port: NodeId,
    pub name: Option<String>,
    pub eta: Option<NaiveDateTime>,
    pub etd: Option<NaiveDateTime>,
}

/// Resolved position of a port or airport code.
#[derive(Debug, Clone, PartialEq)]
pub struct PortLocation {
    pub code: NodeId,
    pub name: Option<String>,
    /// `None` when the lookup knows the code but not where it is.
    pub coords: Option<Coordinates>,
}
