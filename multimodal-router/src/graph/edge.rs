//! Graph edges.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::mode::road;
use crate::domain::{Coordinates, NodeId, TransportMode};

/// An intermediate stop embedded in an itinerary.
///
/// Stops are not graph nodes until the layover expander resolves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRef {
    pub code: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<NaiveDateTime>,
}

impl StopRef {
    pub fn new(code: NodeId) -> Self {
        Self {
            code,
            name: None,
            lat: None,
            lng: None,
            arrival: None,
            departure: None,
        }
    }

    /// Known position, if both components were supplied.
    pub fn coords(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }
}

/// A directed, mode-tagged connection between two nodes.
///
/// Parallel edges between the same pair are allowed: each flight or voyage
/// is its own edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub mode: TransportMode,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub cost: f64,
    pub emissions_kg: f64,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default)]
    pub intermediate_stops: Vec<StopRef>,
    #[serde(default)]
    pub is_alternative_mode: bool,
}

impl Edge {
    /// A road edge priced with the flat road tariff.
    pub fn road(
        source: NodeId,
        target: NodeId,
        distance_km: f64,
        departure_time: NaiveDateTime,
    ) -> Self {
        let duration_hours = distance_km / road::SPEED_KMH;
        Self {
            source,
            target,
            mode: TransportMode::Road,
            distance_km,
            duration_hours,
            cost: distance_km * road::COST_PER_KM,
            emissions_kg: distance_km * road::EMISSIONS_KG_PER_KM,
            departure_time,
            arrival_time: departure_time
                .checked_add_signed(hours(duration_hours))
                .unwrap_or(departure_time),
            provider: None,
            service: None,
            intermediate_stops: Vec::new(),
            is_alternative_mode: false,
        }
    }

    /// The same connection driven the other way.
    pub fn reversed_road(&self) -> Self {
        Self::road(
            self.target.clone(),
            self.source.clone(),
            self.distance_km,
            self.departure_time,
        )
    }

    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }
}

/// Longest duration `hours` produces (ten thousand years).
const MAX_HOURS: f64 = 24.0 * 365.0 * 10_000.0;

/// Converts fractional hours to a duration with millisecond precision,
/// clamped to `0..=MAX_HOURS`.
pub fn hours(value: f64) -> Duration {
    if !value.is_finite() || value <= 0.0 {
        return Duration::zero();
    }
    Duration::milliseconds((value.min(MAX_HOURS) * 3_600_000.0).round() as i64)
}

/// Fractional hours from `from` to `to`; `None` unless `to` is after `from`.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> Option<f64> {
    let span = to.signed_duration_since(from);
    if span <= Duration::zero() {
        return None;
    }
    Some(span.num_milliseconds() as f64 / 3_600_000.0)
}
