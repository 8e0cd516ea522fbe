//! Multimodal search: the full pipeline from validated endpoints to paths.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::cache::CoordinateCache;
use crate::domain::{EndpointRole, Location, LocationInput, NodeId, ValidationError};
use crate::gateway::TransportGateway;
use crate::graph::{Edge, Graph, Node, NodeKind, Path};

use super::builder::{BuildOutcome, GraphBuilder};
use super::config::{GraphConfig, MAX_CONNECTION_BUFFER_HOURS};
use super::enhancer::RouteEnhancer;
use super::layover::LayoverExpander;
use super::mesh::connect_nearby_hubs;
use super::paths::enumerate_paths;

/// Endpoints closer than this (1 m) are treated as the same place.
const COINCIDENT_KM: f64 = 0.001;

/// Error from multimodal search.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// Origin or destination failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Search options are unusable
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
}

/// Request for a multimodal search, as supplied by a caller.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub origin: LocationInput,
    pub destination: LocationInput,

    /// Reference date for schedule queries; today when `None`.
    pub start_date: Option<NaiveDate>,

    pub config: GraphConfig,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub origin: Location,
    pub destination: Location,
    pub start_date: NaiveDate,
    pub config: GraphConfig,
}

impl SearchRequest {
    /// Create a new search request with the default configuration.
    pub fn new(origin: LocationInput, destination: LocationInput) -> Self {
        Self {
            origin,
            destination,
            ..Self::default()
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the search request.
    pub fn validate(self) -> Result<ValidatedRequest, SearchError> {
        let origin = self.origin.validate(EndpointRole::Origin)?;
        let destination = self.destination.validate(EndpointRole::Destination)?;

        if origin.id == destination.id {
            return Err(ValidationError::SameId(origin.id.as_str().to_string()).into());
        }

        let radius = self.config.radius_km;
        if !radius.is_finite() || radius < 0.0 {
            return Err(SearchError::InvalidRequest(format!(
                "radius must be a non-negative number of kilometres, got {radius}"
            )));
        }

        for (name, hours) in [
            ("air", self.config.air_connection_buffer_hours),
            ("sea", self.config.sea_connection_buffer_hours),
        ] {
            if !(0..=MAX_CONNECTION_BUFFER_HOURS).contains(&hours) {
                return Err(SearchError::InvalidRequest(format!(
                    "{name} connection buffer must be between 0 and {MAX_CONNECTION_BUFFER_HOURS} hours, got {hours}"
                )));
            }
        }

        Ok(ValidatedRequest {
            origin,
            destination,
            start_date: self
                .start_date
                .unwrap_or_else(|| Local::now().date_naive()),
            config: self.config,
        })
    }
}

/// Summary of how a result was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub origin_id: NodeId,
    pub origin_name: String,
    pub destination_id: NodeId,
    pub destination_name: String,
    pub start_date: NaiveDate,
    pub generated_at: NaiveDateTime,
    pub layovers_resolved: usize,
    pub nearby_links: usize,
    pub enhancement_passes: usize,
    /// Paths found before truncation to `max_paths`.
    pub complete_route_count: usize,
}

/// Result of a multimodal search: the final graph plus enumerated paths.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    #[serde(flatten)]
    pub graph: Graph,
    pub paths: Vec<Path>,
    pub metadata: SearchMetadata,
}

/// Runs searches against a gateway.
pub struct MultimodalSearch<'a, G: ?Sized> {
    gateway: &'a G,
    coordinates: &'a CoordinateCache,
}

impl<'a, G: TransportGateway + ?Sized> MultimodalSearch<'a, G> {
    pub fn new(gateway: &'a G, coordinates: &'a CoordinateCache) -> Self {
        Self {
            gateway,
            coordinates,
        }
    }

    /// Search for multimodal paths.
    ///
    /// Only validation fails; gateway trouble yields a smaller graph and
    /// fewer paths.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchOutcome, SearchError> {
        let request = request.validate()?;
        let ValidatedRequest {
            origin,
            destination,
            start_date,
            config,
        } = &request;

        info!(
            origin = %origin.id,
            destination = %destination.id,
            date = %start_date,
            "Starting multimodal search"
        );

        let midnight = start_date.and_time(NaiveTime::MIN);

        if origin.coords.distance_km(&destination.coords) < COINCIDENT_KM {
            info!("Origin and destination coincide, skipping gateways");
            return Ok(coincident(&request, midnight));
        }

        let BuildOutcome {
            mut graph,
            destination_hubs,
            ..
        } = GraphBuilder::new(self.gateway, config)
            .build(origin, destination, *start_date)
            .await;

        let layovers_resolved = if config.find_alternative_modes {
            LayoverExpander::new(self.gateway, config, self.coordinates)
                .expand(&mut graph, &destination_hubs)
                .await
                .resolved
        } else {
            0
        };

        let nearby_links = if config.include_road && config.connect_nearby_hubs {
            connect_nearby_hubs(&mut graph, config.radius_km, midnight)
        } else {
            0
        };

        let report = RouteEnhancer::new(self.gateway, config, &origin.id, &destination.id, *start_date)
            .enhance(&mut graph)
            .await;

        let mut paths = enumerate_paths(&graph, &origin.id, &destination.id, config.max_transfers);
        let complete_routes = paths.len();
        paths.truncate(config.max_paths);

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            paths = paths.len(),
            complete_routes,
            "Search complete"
        );

        let mut metadata = metadata(&request, complete_routes);
        metadata.layovers_resolved = layovers_resolved;
        metadata.nearby_links = nearby_links;
        metadata.enhancement_passes = report.passes;

        Ok(SearchOutcome {
            graph,
            paths,
            metadata,
        })
    }
}

/// Origin and destination at the same spot: a single zero-length road leg
/// when road is enabled, otherwise nothing.
fn coincident(request: &ValidatedRequest, midnight: NaiveDateTime) -> SearchOutcome {
    let mut graph = Graph::new();
    graph.insert_node(Node::endpoint(&request.origin, NodeKind::Origin));
    graph.insert_node(Node::endpoint(&request.destination, NodeKind::Destination));

    let mut paths = Vec::new();
    if request.config.include_road {
        let edge = Edge::road(
            request.origin.id.clone(),
            request.destination.id.clone(),
            0.0,
            midnight,
        );
        if graph.add_edge(edge).is_ok() {
            paths = enumerate_paths(
                &graph,
                &request.origin.id,
                &request.destination.id,
                request.config.max_transfers,
            );
        }
    }

    SearchOutcome {
        metadata: metadata(request, paths.len()),
        graph,
        paths,
    }
}

fn metadata(request: &ValidatedRequest, complete_routes: usize) -> SearchMetadata {
    SearchMetadata {
        origin_id: request.origin.id.clone(),
        origin_name: request.origin.name.clone(),
        destination_id: request.destination.id.clone(),
        destination_name: request.destination.name.clone(),
        start_date: request.start_date,
        generated_at: Utc::now().naive_utc(),
        layovers_resolved: 0,
        nearby_links: 0,
        enhancement_passes: 0,
        complete_route_count: complete_routes,
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
