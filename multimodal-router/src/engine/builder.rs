//! Initial graph construction.
//!
//! Seeds the graph with the two endpoints and the hubs near each of them,
//! links endpoints and hubs by road, then asks the schedule gateways for
//! every origin-hub/destination-hub pair of the same mode.

use std::future::Future;

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::{EndpointRole, Location, TransportMode};
use crate::gateway::{Hub, NearestHubs, TransportGateway, with_timeout};
use crate::graph::{Edge, Graph, GraphDelta, MergeStats, Node, NodeKind};

use super::config::GraphConfig;
use super::itinerary::{air_edge, sea_edge};

/// Hubs admitted next to one endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideHubs {
    pub airports: Vec<Hub>,
    pub seaports: Vec<Hub>,
}

impl SideHubs {
    pub fn for_mode(&self, mode: TransportMode) -> &[Hub] {
        match mode {
            TransportMode::Air => &self.airports,
            TransportMode::Sea => &self.seaports,
            TransportMode::Road => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty() && self.seaports.is_empty()
    }

    /// All admitted hubs with their mode.
    pub fn iter(&self) -> impl Iterator<Item = (TransportMode, &Hub)> {
        self.airports
            .iter()
            .map(|h| (TransportMode::Air, h))
            .chain(self.seaports.iter().map(|h| (TransportMode::Sea, h)))
    }
}

/// Result of [`GraphBuilder::build`].
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: Graph,
    pub origin_hubs: SideHubs,
    pub destination_hubs: SideHubs,
}

/// A scheduled hub pair to query.
struct HubPair<'a> {
    mode: TransportMode,
    from: &'a Hub,
    to: &'a Hub,
}

/// Builds the initial graph for one search.
pub struct GraphBuilder<'a, G: ?Sized> {
    gateway: &'a G,
    config: &'a GraphConfig,
}

impl<'a, G: TransportGateway + ?Sized> GraphBuilder<'a, G> {
    pub fn new(gateway: &'a G, config: &'a GraphConfig) -> Self {
        Self { gateway, config }
    }

    /// Build the graph between `origin` and `destination` for `date`.
    ///
    /// Gateway failures only shrink the graph; this never fails.
    pub async fn build(
        &self,
        origin: &Location,
        destination: &Location,
        date: NaiveDate,
    ) -> BuildOutcome {
        let midnight = date.and_time(chrono::NaiveTime::MIN);

        let mut graph = Graph::new();
        graph.insert_node(Node::endpoint(origin, NodeKind::Origin));
        graph.insert_node(Node::endpoint(destination, NodeKind::Destination));

        let (near_origin, near_destination) = futures::join!(
            self.nearest(origin, EndpointRole::Origin),
            self.nearest(destination, EndpointRole::Destination),
        );

        let origin_hubs = self.admit(origin, &near_origin);
        let destination_hubs = self.admit(destination, &near_destination);

        info!(
            origin_airports = origin_hubs.airports.len(),
            origin_seaports = origin_hubs.seaports.len(),
            destination_airports = destination_hubs.airports.len(),
            destination_seaports = destination_hubs.seaports.len(),
            "Admitted hubs"
        );

        self.connect_hubs(&mut graph, origin, &origin_hubs, EndpointRole::Origin, midnight);
        self.connect_hubs(
            &mut graph,
            destination,
            &destination_hubs,
            EndpointRole::Destination,
            midnight,
        );

        let pairs = self.hub_pairs(&origin_hubs, &destination_hubs);
        let stats = merge_in_batches(&mut graph, &pairs, self.config.batch(), |pair| {
            self.fetch_pair(pair, date, midnight)
        })
        .await;

        info!(
            pairs = pairs.len(),
            edges_added = stats.edges_added,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Initial graph built"
        );

        BuildOutcome {
            graph,
            origin_hubs,
            destination_hubs,
        }
    }

    async fn nearest(&self, endpoint: &Location, role: EndpointRole) -> NearestHubs {
        let call = self.gateway.nearest_hubs(endpoint.coords);
        match with_timeout("nearest_hubs", self.config.gateway_timeout(), call).await {
            Ok(hubs) => hubs,
            Err(e) => {
                warn!(endpoint = %endpoint.id, %role, error = %e, "Nearest-hub lookup failed, using none");
                NearestHubs::default()
            }
        }
    }

    /// Keep enabled-mode hubs within the radius, in provider order, capped
    /// per side.
    fn admit(&self, endpoint: &Location, near: &NearestHubs) -> SideHubs {
        let pick = |mode: TransportMode| -> Vec<Hub> {
            if !self.config.allows(mode) {
                return Vec::new();
            }
            near.for_mode(mode)
                .iter()
                .filter(|hub| endpoint.coords.distance_km(&hub.coords) <= self.config.radius_km)
                .take(self.config.hubs_per_side(mode))
                .cloned()
                .collect()
        };

        SideHubs {
            airports: pick(TransportMode::Air),
            seaports: pick(TransportMode::Sea),
        }
    }

    /// Insert hub nodes and the road legs between them and their endpoint.
    fn connect_hubs(
        &self,
        graph: &mut Graph,
        endpoint: &Location,
        hubs: &SideHubs,
        role: EndpointRole,
        departure: NaiveDateTime,
    ) {
        for (mode, hub) in hubs.iter() {
            if let Some(kind) = NodeKind::hub_for(mode) {
                graph.insert_node(Node::new(hub.code.clone(), hub.name.clone(), kind, hub.coords));
            }

            if !self.config.include_road {
                continue;
            }

            let distance = endpoint.coords.distance_km(&hub.coords);
            let edge = match role {
                EndpointRole::Origin => {
                    Edge::road(endpoint.id.clone(), hub.code.clone(), distance, departure)
                }
                EndpointRole::Destination => {
                    Edge::road(hub.code.clone(), endpoint.id.clone(), distance, departure)
                }
            };
            if let Err(e) = graph.add_edge(edge) {
                debug!(error = %e, "Skipping road leg");
            }
        }
    }

    fn hub_pairs<'h>(&self, origin: &'h SideHubs, destination: &'h SideHubs) -> Vec<HubPair<'h>> {
        let mut pairs = Vec::new();
        for mode in [TransportMode::Air, TransportMode::Sea] {
            if !self.config.allows(mode) {
                continue;
            }
            for from in origin.for_mode(mode) {
                for to in destination.for_mode(mode) {
                    if from.code != to.code {
                        pairs.push(HubPair { mode, from, to });
                    }
                }
            }
        }
        pairs
    }

    async fn fetch_pair(
        &self,
        pair: &HubPair<'_>,
        date: NaiveDate,
        midnight: NaiveDateTime,
    ) -> GraphDelta {
        let mut delta = GraphDelta::new();
        let budget = self.config.gateway_timeout();
        let (from, to) = (&pair.from.code, &pair.to.code);

        let edges: Vec<Edge> = match pair.mode {
            TransportMode::Air => {
                match with_timeout("air_schedule", budget, self.gateway.air_schedule(from, to, date))
                    .await
                {
                    Ok(itineraries) => itineraries
                        .iter()
                        .map(|it| air_edge(pair.from, pair.to, it, midnight))
                        .collect(),
                    Err(e) => {
                        warn!(origin = %from, destination = %to, error = %e, "Air schedule lookup failed");
                        return delta;
                    }
                }
            }
            TransportMode::Sea => {
                match with_timeout("sea_schedule", budget, self.gateway.sea_schedule(from, to, date))
                    .await
                {
                    Ok(routes) => routes
                        .iter()
                        .map(|route| sea_edge(pair.from, pair.to, route, midnight))
                        .collect(),
                    Err(e) => {
                        warn!(origin = %from, destination = %to, error = %e, "Sea schedule lookup failed");
                        return delta;
                    }
                }
            }
            TransportMode::Road => return delta,
        };

        if edges.is_empty() {
            debug!(mode = %pair.mode, origin = %from, destination = %to, "No scheduled service");
        } else {
            debug!(mode = %pair.mode, origin = %from, destination = %to, itineraries = edges.len(), "Fetched schedule");
        }

        for edge in edges {
            delta.add_edge(edge);
        }
        delta
    }
}

/// Run `task` over `items` in groups of `batch_size`.
///
/// Each group runs concurrently; its deltas are merged into `graph` only
/// once every task in the group has finished, and the next group starts
/// after that merge.
pub(crate) async fn merge_in_batches<'a, T, F, Fut>(
    graph: &mut Graph,
    items: &'a [T],
    batch_size: usize,
    task: F,
) -> MergeStats
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = GraphDelta>,
{
    let mut total = MergeStats::default();

    for batch in items.chunks(batch_size.max(1)) {
        let deltas = join_all(batch.iter().map(&task)).await;

        for delta in deltas {
            let stats = graph.merge(delta);
            total.nodes_added += stats.nodes_added;
            total.edges_added += stats.edges_added;
            total.edges_dropped += stats.edges_dropped;
        }
    }

    total
}
