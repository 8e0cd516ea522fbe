//! Data transfer objects for web requests and responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{LocationInput, ValidationError};
use crate::engine::{GraphConfig, SearchRequest};
use crate::gateway::parse_timestamp;

/// Request body for `POST /graph/multimodal`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultimodalGraphRequest {
    #[serde(default)]
    pub origin: LocationInput,

    #[serde(default)]
    pub destination: LocationInput,

    /// `YYYY-MM-DD`, `YYYYMMDD` or a timestamp (defaults to today)
    pub start_date: Option<String>,

    #[serde(default)]
    pub options: SearchOptions,
}

impl MultimodalGraphRequest {
    /// Convert into an engine request, applying options over `defaults`.
    pub fn into_search_request(self, defaults: &GraphConfig) -> Result<SearchRequest, ValidationError> {
        let start_date = self
            .start_date
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(parse_start_date)
            .transpose()?;

        Ok(SearchRequest {
            origin: self.origin,
            destination: self.destination,
            start_date,
            config: self.options.apply(defaults.clone()),
        })
    }
}

fn parse_start_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let compact = raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit());
    let parsed = if compact {
        NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
    } else {
        parse_timestamp(raw).map(|t| t.date())
    };
    parsed.ok_or_else(|| ValidationError::InvalidDate(raw.to_string()))
}

/// Optional overrides of the search configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub include_road: Option<bool>,
    pub include_sea: Option<bool>,
    pub include_air: Option<bool>,
    pub max_transfers: Option<usize>,
    pub radius_km: Option<f64>,
    pub max_ports_per_side: Option<usize>,
    pub max_airports_per_side: Option<usize>,
    pub find_alternative_modes: Option<bool>,
    pub connect_nearby_hubs: Option<bool>,
    pub batch_size: Option<usize>,
    pub gateway_timeout_secs: Option<u64>,
    pub max_enhancement_passes: Option<usize>,
    pub air_connection_buffer_hours: Option<i64>,
    pub sea_connection_buffer_hours: Option<i64>,
    pub max_paths: Option<usize>,
}

impl SearchOptions {
    /// Overlay the supplied options on `config`.
    pub fn apply(self, config: GraphConfig) -> GraphConfig {
        GraphConfig {
            include_road: self.include_road.unwrap_or(config.include_road),
            include_sea: self.include_sea.unwrap_or(config.include_sea),
            include_air: self.include_air.unwrap_or(config.include_air),
            max_transfers: self.max_transfers.unwrap_or(config.max_transfers),
            radius_km: self.radius_km.unwrap_or(config.radius_km),
            max_ports_per_side: self.max_ports_per_side.unwrap_or(config.max_ports_per_side),
            max_airports_per_side: self
                .max_airports_per_side
                .unwrap_or(config.max_airports_per_side),
            find_alternative_modes: self
                .find_alternative_modes
                .unwrap_or(config.find_alternative_modes),
            connect_nearby_hubs: self.connect_nearby_hubs.unwrap_or(config.connect_nearby_hubs),
            batch_size: self.batch_size.unwrap_or(config.batch_size),
            gateway_timeout_secs: self.gateway_timeout_secs.unwrap_or(config.gateway_timeout_secs),
            max_enhancement_passes: self
                .max_enhancement_passes
                .unwrap_or(config.max_enhancement_passes),
            air_connection_buffer_hours: self
                .air_connection_buffer_hours
                .unwrap_or(config.air_connection_buffer_hours),
            sea_connection_buffer_hours: self
                .sea_connection_buffer_hours
                .unwrap_or(config.sea_connection_buffer_hours),
            max_paths: self.max_paths.unwrap_or(config.max_paths),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
