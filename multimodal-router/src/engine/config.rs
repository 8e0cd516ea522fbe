//! Configuration for graph construction and path search.

use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::domain::TransportMode;

/// Longest connection buffer a search accepts (one year).
pub const MAX_CONNECTION_BUFFER_HOURS: i64 = 24 * 365;

/// Configuration parameters for a multimodal search.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Whether to add road edges to and between hubs.
    pub include_road: bool,

    /// Whether to query sea schedules and admit seaports.
    pub include_sea: bool,

    /// Whether to query air schedules and admit airports.
    pub include_air: bool,

    /// Maximum number of mode changes in an enumerated path.
    pub max_transfers: usize,

    /// Maximum great-circle distance (km) from an endpoint to an admitted
    /// hub, and between hubs linked by the road mesh.
    pub radius_km: f64,

    /// Seaports kept per endpoint.
    pub max_ports_per_side: usize,

    /// Airports kept per endpoint.
    pub max_airports_per_side: usize,

    /// Whether to expand layovers into opposite-mode connections.
    pub find_alternative_modes: bool,

    /// Whether to link nearby hubs with road edges.
    pub connect_nearby_hubs: bool,

    /// Maximum number of gateway calls in flight per batch.
    pub batch_size: usize,

    /// Budget for a single gateway call (seconds).
    pub gateway_timeout_secs: u64,

    /// Upper bound on enhancement passes.
    pub max_enhancement_passes: usize,

    /// Minimum connection time after an air layover (hours).
    pub air_connection_buffer_hours: i64,

    /// Minimum connection time after a sea layover (hours).
    pub sea_connection_buffer_hours: i64,

    /// Maximum number of paths returned.
    pub max_paths: usize,
}

impl GraphConfig {
    /// Create a configuration with the given mode switches and limits;
    /// everything else takes its default.
    pub fn new(
        include_road: bool,
        include_sea: bool,
        include_air: bool,
        max_transfers: usize,
        radius_km: f64,
    ) -> Self {
        Self {
            include_road,
            include_sea,
            include_air,
            max_transfers,
            radius_km,
            ..Self::default()
        }
    }

    /// Whether `mode` is enabled.
    pub fn allows(&self, mode: TransportMode) -> bool {
        match mode {
            TransportMode::Road => self.include_road,
            TransportMode::Sea => self.include_sea,
            TransportMode::Air => self.include_air,
        }
    }

    /// Hubs of `mode` kept per endpoint.
    pub fn hubs_per_side(&self, mode: TransportMode) -> usize {
        match mode {
            TransportMode::Air => self.max_airports_per_side,
            TransportMode::Sea => self.max_ports_per_side,
            TransportMode::Road => 0,
        }
    }

    /// Returns the per-call gateway budget.
    pub fn gateway_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.gateway_timeout_secs)
    }

    /// Returns the minimum connection time before departing by `mode`
    /// from a layover, clamped to `0..=MAX_CONNECTION_BUFFER_HOURS`.
    pub fn connection_buffer(&self, mode: TransportMode) -> Duration {
        let hours = match mode {
            TransportMode::Air => self.air_connection_buffer_hours,
            TransportMode::Sea => self.sea_connection_buffer_hours,
            TransportMode::Road => 0,
        };
        Duration::hours(hours.clamp(0, MAX_CONNECTION_BUFFER_HOURS))
    }

    /// Batch size, never zero.
    pub fn batch(&self) -> usize {
        self.batch_size.max(1)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            include_road: true,
            include_sea: true,
            include_air: true,
            max_transfers: 3,
            radius_km: 150.0,
            max_ports_per_side: 3,
            max_airports_per_side: 3,
            find_alternative_modes: true,
            connect_nearby_hubs: true,
            batch_size: 2,
            gateway_timeout_secs: 5,
            max_enhancement_passes: 3,
            air_connection_buffer_hours: 3,
            sea_connection_buffer_hours: 24,
            max_paths: 200,
        }
    }
}
