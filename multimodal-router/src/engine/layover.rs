//! Intermodal transfers at layovers.
//!
//! A flight that stops in Dubai or a vessel that calls at Colombo passes
//! through a hub that is not yet a graph node. Each such layover becomes a
//! node, is linked by road to nearby hubs of the opposite mode, and those
//! hubs are queried for onward service to the destination side.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::cache::CoordinateCache;
use crate::domain::{Coordinates, NodeId, TransportMode};
use crate::gateway::{Hub, TransportGateway, with_timeout};
use crate::graph::{Edge, Graph, GraphDelta, Node, NodeKind};

use super::builder::{SideHubs, merge_in_batches};
use super::config::GraphConfig;
use super::itinerary::{air_edge, sea_edge};

/// A stop embedded in one or more itineraries of the same mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Layover {
    pub code: NodeId,
    pub mode: TransportMode,
    pub name: Option<String>,
    pub coords: Option<Coordinates>,
    /// Earliest known arrival across all itineraries stopping here.
    pub arrival: NaiveDateTime,
}

/// A layover with a known position.
#[derive(Debug, Clone)]
struct ResolvedLayover {
    code: NodeId,
    mode: TransportMode,
    name: String,
    coords: Coordinates,
    arrival: NaiveDateTime,
}

/// Counts from one expansion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoverReport {
    pub layovers: usize,
    pub resolved: usize,
    pub edges_added: usize,
}

/// Collapse the stops of every scheduled edge into unique `(code, mode)`
/// layovers, in first-seen order.
///
/// An edge's own endpoints are not layovers. Stops without an arrival time
/// take the carrying edge's arrival.
pub fn collect_layovers(edges: &[Edge]) -> Vec<Layover> {
    let mut layovers: IndexMap<(NodeId, TransportMode), Layover> = IndexMap::new();

    for edge in edges.iter().filter(|e| e.mode.is_scheduled()) {
        for stop in &edge.intermediate_stops {
            if stop.code == edge.source || stop.code == edge.target {
                continue;
            }

            let arrival = stop.arrival.unwrap_or(edge.arrival_time);
            let key = (stop.code.clone(), edge.mode);

            match layovers.get_mut(&key) {
                Some(existing) => {
                    existing.arrival = existing.arrival.min(arrival);
                    if existing.name.is_none() {
                        existing.name = stop.name.clone();
                    }
                    if existing.coords.is_none() {
                        existing.coords = stop.coords();
                    }
                }
                None => {
                    layovers.insert(
                        key,
                        Layover {
                            code: stop.code.clone(),
                            mode: edge.mode,
                            name: stop.name.clone(),
                            coords: stop.coords(),
                            arrival,
                        },
                    );
                }
            }
        }
    }

    layovers.into_values().collect()
}

/// Expands layovers into opposite-mode connections.
pub struct LayoverExpander<'a, G: ?Sized> {
    gateway: &'a G,
    config: &'a GraphConfig,
    coordinates: &'a CoordinateCache,
}

impl<'a, G: TransportGateway + ?Sized> LayoverExpander<'a, G> {
    pub fn new(gateway: &'a G, config: &'a GraphConfig, coordinates: &'a CoordinateCache) -> Self {
        Self {
            gateway,
            config,
            coordinates,
        }
    }

    /// Grow `graph` with transfers at the layovers of its current edges.
    ///
    /// `destination_hubs` are the hubs admitted next to the destination;
    /// onward service is only sought toward those.
    pub async fn expand(&self, graph: &mut Graph, destination_hubs: &SideHubs) -> LayoverReport {
        let layovers: Vec<Layover> = collect_layovers(graph.edges())
            .into_iter()
            .filter(|l| {
                l.mode
                    .opposite()
                    .is_some_and(|opposite| self.config.allows(opposite))
            })
            .collect();

        let mut report = LayoverReport {
            layovers: layovers.len(),
            ..LayoverReport::default()
        };
        if layovers.is_empty() {
            debug!("No layovers to expand");
            return report;
        }

        let resolved = self.resolve(graph, layovers).await;
        report.resolved = resolved.len();

        let stats = merge_in_batches(graph, &resolved, self.config.batch(), |layover| {
            self.expand_one(layover, destination_hubs)
        })
        .await;
        report.edges_added = stats.edges_added;

        info!(
            layovers = report.layovers,
            resolved = report.resolved,
            edges_added = report.edges_added,
            "Layover expansion complete"
        );
        report
    }

    /// Attach positions, preferring the stop itself, then an existing node,
    /// then the coordinate cache. Unplaceable layovers are dropped.
    async fn resolve(&self, graph: &Graph, layovers: Vec<Layover>) -> Vec<ResolvedLayover> {
        let unknown: Vec<NodeId> = layovers
            .iter()
            .filter(|l| l.coords.is_none() && !graph.contains_node(&l.code))
            .map(|l| l.code.clone())
            .collect();

        let looked_up = if unknown.is_empty() {
            HashMap::new()
        } else {
            self.coordinates
                .resolve(self.gateway, &unknown, self.config.gateway_timeout())
                .await
        };

        layovers
            .into_iter()
            .filter_map(|l| {
                let node = graph.node(&l.code);
                let found = looked_up.get(&l.code);

                let coords = l
                    .coords
                    .or_else(|| node.map(Node::coords))
                    .or_else(|| found.map(|p| p.coords));
                let Some(coords) = coords else {
                    debug!(code = %l.code, mode = %l.mode, "No coordinates for layover, skipping");
                    return None;
                };

                let name = l
                    .name
                    .or_else(|| node.map(|n| n.name.clone()))
                    .or_else(|| found.and_then(|p| p.name.clone()))
                    .unwrap_or_else(|| l.code.as_str().to_string());

                Some(ResolvedLayover {
                    code: l.code,
                    mode: l.mode,
                    name,
                    coords,
                    arrival: l.arrival,
                })
            })
            .collect()
    }

    async fn expand_one(&self, layover: &ResolvedLayover, destination_hubs: &SideHubs) -> GraphDelta {
        let mut delta = GraphDelta::new();

        if let Some(kind) = NodeKind::hub_for(layover.mode) {
            delta.add_node(Node::new(
                layover.code.clone(),
                layover.name.clone(),
                kind,
                layover.coords,
            ));
        }

        let Some(opposite) = layover.mode.opposite() else {
            return delta;
        };

        let nearby = match with_timeout(
            "nearest_hubs",
            self.config.gateway_timeout(),
            self.gateway.nearest_hubs(layover.coords),
        )
        .await
        {
            Ok(hubs) => hubs,
            Err(e) => {
                warn!(layover = %layover.code, error = %e, "Nearest-hub lookup failed for layover");
                return delta;
            }
        };

        let transfer_hubs: Vec<&Hub> = nearby
            .for_mode(opposite)
            .iter()
            .filter(|hub| hub.code != layover.code)
            .filter(|hub| layover.coords.distance_km(&hub.coords) <= self.config.radius_km)
            .take(self.config.hubs_per_side(opposite))
            .collect();

        let buffer = self.config.connection_buffer(opposite);
        let Some(earliest) = layover.arrival.checked_add_signed(buffer) else {
            warn!(
                layover = %layover.code,
                arrival = %layover.arrival,
                "Connection time out of range, skipping onward lookups"
            );
            return delta;
        };
        let query_date = earliest.date();

        for hub in &transfer_hubs {
            if let Some(kind) = NodeKind::hub_for(opposite) {
                delta.add_node(Node::new(hub.code.clone(), hub.name.clone(), kind, hub.coords));
            }

            if self.config.include_road {
                let distance = layover.coords.distance_km(&hub.coords);
                let there = Edge::road(layover.code.clone(), hub.code.clone(), distance, layover.arrival);
                delta.add_edge(there.reversed_road());
                delta.add_edge(there);
            }
        }

        let legs: Vec<(&Hub, &Hub)> = transfer_hubs
            .iter()
            .flat_map(|from| {
                destination_hubs
                    .for_mode(opposite)
                    .iter()
                    .filter(move |to| to.code != from.code)
                    .map(move |to| (*from, to))
            })
            .collect();

        for batch in legs.chunks(self.config.batch()) {
            let queries = batch
                .iter()
                .map(|(from, to)| self.onward(opposite, from, to, query_date, earliest));
            for edges in join_all(queries).await {
                for edge in edges {
                    delta.add_edge(edge);
                }
            }
        }

        debug!(
            layover = %layover.code,
            mode = %layover.mode,
            transfer_hubs = transfer_hubs.len(),
            edges = delta.edge_count(),
            "Expanded layover"
        );
        delta
    }

    /// Onward itineraries from a transfer hub that leave no earlier than
    /// `earliest`, as alternative-mode edges.
    async fn onward(
        &self,
        mode: TransportMode,
        from: &Hub,
        to: &Hub,
        date: NaiveDate,
        earliest: NaiveDateTime,
    ) -> Vec<Edge> {
        let budget = self.config.gateway_timeout();

        let edges: Vec<Edge> = match mode {
            TransportMode::Air => {
                match with_timeout("air_schedule", budget, self.gateway.air_schedule(&from.code, &to.code, date)).await {
                    Ok(itineraries) => itineraries
                        .iter()
                        .filter(|it| it.departure.is_none_or(|d| d >= earliest))
                        .map(|it| air_edge(from, to, it, earliest))
                        .collect(),
                    Err(e) => {
                        warn!(origin = %from.code, destination = %to.code, error = %e, "Onward air lookup failed");
                        Vec::new()
                    }
                }
            }
            TransportMode::Sea => {
                match with_timeout("sea_schedule", budget, self.gateway.sea_schedule(&from.code, &to.code, date)).await {
                    Ok(routes) => routes
                        .iter()
                        .filter(|r| r.departure.is_none_or(|d| d >= earliest))
                        .map(|r| sea_edge(from, to, r, earliest))
                        .collect(),
                    Err(e) => {
                        warn!(origin = %from.code, destination = %to.code, error = %e, "Onward sea lookup failed");
                        Vec::new()
                    }
                }
            }
            TransportMode::Road => Vec::new(),
        };

        edges
            .into_iter()
            .map(|mut edge| {
                edge.is_alternative_mode = true;
                edge
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::{ScriptedGateway, hub, id};
    use crate::gateway::{AirItinerary, SeaRoute};
    use crate::graph::StopRef;
    use chrono::Duration;

    fn t(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn node(code: &str, kind: NodeKind, lat: f64, lng: f64) -> Node {
        Node::new(id(code), code, kind, Coordinates::new(lat, lng))
    }

    fn stop(code: &str, arrival: Option<NaiveDateTime>) -> StopRef {
        let mut s = StopRef::new(id(code));
        s.arrival = arrival;
        s
    }

    fn sea_with_stops(from: &str, to: &str, stops: Vec<StopRef>) -> Edge {
        let mut edge = Edge::road(id(from), id(to), 1000.0, t(1, 0));
        edge.mode = TransportMode::Sea;
        edge.arrival_time = t(20, 0);
        edge.intermediate_stops = stops;
        edge
    }

    /// INCOK -> NLRTM by sea, calling at Colombo.
    fn sea_graph() -> Graph {
        let mut graph = Graph::new();
        graph.insert_node(node("INCOK", NodeKind::Seaport, 9.967, 76.267));
        graph.insert_node(node("NLRTM", NodeKind::Seaport, 51.95, 4.14));
        graph.insert_node(node("AMS", NodeKind::Airport, 52.31, 4.768));
        graph
            .add_edge(sea_with_stops(
                "INCOK",
                "NLRTM",
                vec![
                    stop("INCOK", None),
                    stop("LKCMB", Some(t(3, 6))),
                    stop("NLRTM", Some(t(20, 0))),
                ],
            ))
            .unwrap();
        graph
    }

    fn destination_side() -> SideHubs {
        SideHubs {
            airports: vec![hub("AMS", 52.31, 4.768)],
            seaports: vec![hub("NLRTM", 51.95, 4.14)],
        }
    }

    #[test]
    fn collects_unique_layovers_with_earliest_arrival() {
        let edges = vec![
            sea_with_stops("A", "B", vec![stop("A", None), stop("X", Some(t(5, 0))), stop("Y", None)]),
            sea_with_stops("A", "C", vec![stop("X", Some(t(4, 0)))]),
            Edge::road(id("A"), id("B"), 1.0, t(1, 0)),
        ];
        let mut air = sea_with_stops("P", "Q", vec![stop("X", Some(t(2, 0)))]);
        air.mode = TransportMode::Air;

        let mut all = edges;
        all.push(air);
        let layovers = collect_layovers(&all);

        assert_eq!(layovers.len(), 3);
        assert_eq!((layovers[0].code.as_str(), layovers[0].mode), ("X", TransportMode::Sea));
        assert_eq!(layovers[0].arrival, t(4, 0));
        // No stop arrival: the carrying edge's arrival.
        assert_eq!(layovers[1].code, id("Y"));
        assert_eq!(layovers[1].arrival, t(20, 0));
        assert_eq!((layovers[2].code.as_str(), layovers[2].mode), ("X", TransportMode::Air));
    }

    #[tokio::test]
    async fn sea_layover_gains_air_transfer() {
        let colombo = Coordinates::new(6.95, 79.85);
        let gateway = ScriptedGateway::new()
            .with_port("LKCMB", colombo.lat, colombo.lng)
            .with_nearest(colombo, vec![hub("CMB", 7.18, 79.88)], vec![])
            .with_air(
                "CMB",
                "AMS",
                vec![
                    AirItinerary {
                        flight_number: Some("too early".into()),
                        departure: Some(t(3, 7)),
                        ..Default::default()
                    },
                    AirItinerary {
                        flight_number: Some("ok".into()),
                        departure: Some(t(3, 10)),
                        ..Default::default()
                    },
                    AirItinerary {
                        flight_number: Some("undated".into()),
                        ..Default::default()
                    },
                ],
            );
        let config = GraphConfig::default();
        let cache = CoordinateCache::new();
        let mut graph = sea_graph();

        let report = LayoverExpander::new(&gateway, &config, &cache)
            .expand(&mut graph, &destination_side())
            .await;

        assert_eq!(report.layovers, 1);
        assert_eq!(report.resolved, 1);
        assert_eq!(graph.node(&id("LKCMB")).unwrap().kind, NodeKind::Seaport);
        assert_eq!(graph.node(&id("CMB")).unwrap().kind, NodeKind::Airport);
        assert!(graph.has_road_between(&id("LKCMB"), &id("CMB")));

        // Arrival 06:00 plus the 3 h air buffer.
        assert_eq!(gateway.calls_to("air_schedule"), vec!["CMB->AMS@2025-03-03"]);

        let flights: Vec<&Edge> = graph
            .edges()
            .iter()
            .filter(|e| e.mode == TransportMode::Air)
            .collect();
        assert_eq!(flights.len(), 2);
        assert!(flights.iter().all(|e| e.is_alternative_mode));
        assert_eq!(flights[0].service.as_deref(), Some("ok"));
        assert_eq!(flights[1].service.as_deref(), Some("undated"));
        assert_eq!(flights[1].departure_time, t(3, 9));

        let roads: Vec<&Edge> = graph
            .edges()
            .iter()
            .filter(|e| e.mode == TransportMode::Road)
            .collect();
        assert_eq!(roads.len(), 2);
        assert!(roads.iter().all(|e| e.departure_time == t(3, 6)));
        assert!(graph.validate().is_ok());
    }

    #[tokio::test]
    async fn sea_buffer_pushes_query_date() {
        let jebel_ali = Coordinates::new(25.01, 55.06);
        let dubai = Coordinates::new(25.25, 55.36);
        let mut graph = Graph::new();
        graph.insert_node(node("DXB", NodeKind::Airport, dubai.lat, dubai.lng));
        graph.insert_node(node("AMS", NodeKind::Airport, 52.31, 4.768));
        let mut flight = sea_with_stops("DXB", "AMS", vec![stop("AEJEA", Some(t(2, 12)))]);
        flight.mode = TransportMode::Air;
        graph.add_edge(flight).unwrap();

        let gateway = ScriptedGateway::new()
            .with_port("AEJEA", jebel_ali.lat, jebel_ali.lng)
            .with_nearest(jebel_ali, vec![], vec![hub("AEJEB", 25.0, 55.1)])
            .with_sea("AEJEB", "NLRTM", vec![SeaRoute::default()]);
        let config = GraphConfig::default();
        let cache = CoordinateCache::new();

        LayoverExpander::new(&gateway, &config, &cache)
            .expand(&mut graph, &destination_side())
            .await;

        assert_eq!(gateway.calls_to("sea_schedule"), vec!["AEJEB->NLRTM@2025-03-03"]);
        // Destination-side seaport comes from the builder; absent here, so
        // the onward edge is dropped at merge time.
        assert!(graph.edges().iter().all(|e| e.target != id("NLRTM")));
        assert!(graph.contains_node(&id("AEJEB")));
    }

    #[tokio::test]
    async fn unresolved_layovers_are_skipped() {
        let gateway = ScriptedGateway::new();
        let config = GraphConfig::default();
        let cache = CoordinateCache::new();
        let mut graph = sea_graph();
        let before = graph.clone();

        let report = LayoverExpander::new(&gateway, &config, &cache)
            .expand(&mut graph, &destination_side())
            .await;

        assert_eq!(report.layovers, 1);
        assert_eq!(report.resolved, 0);
        assert_eq!(graph, before);
        assert_eq!(gateway.call_count("nearest_hubs"), 0);
    }

    #[tokio::test]
    async fn disabled_opposite_mode_skips_layover() {
        let gateway = ScriptedGateway::new().with_port("LKCMB", 6.95, 79.85);
        let config = GraphConfig {
            include_air: false,
            ..GraphConfig::default()
        };
        let cache = CoordinateCache::new();
        let mut graph = sea_graph();

        let report = LayoverExpander::new(&gateway, &config, &cache)
            .expand(&mut graph, &destination_side())
            .await;

        assert_eq!(report.layovers, 0);
        assert_eq!(gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn distant_transfer_hubs_are_ignored() {
        let colombo = Coordinates::new(6.95, 79.85);
        let gateway = ScriptedGateway::new()
            .with_port("LKCMB", colombo.lat, colombo.lng)
            // Chennai, ~700 km away.
            .with_nearest(colombo, vec![hub("MAA", 12.99, 80.17)], vec![]);
        let config = GraphConfig::default();
        let cache = CoordinateCache::new();
        let mut graph = sea_graph();

        LayoverExpander::new(&gateway, &config, &cache)
            .expand(&mut graph, &destination_side())
            .await;

        assert!(graph.contains_node(&id("LKCMB")));
        assert!(!graph.contains_node(&id("MAA")));
        assert_eq!(gateway.call_count("air_schedule"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn onward_lookups_run_a_batch_at_a_time() {
        let colombo = Coordinates::new(6.95, 79.85);
        let gateway = ScriptedGateway::new()
            .with_port("LKCMB", colombo.lat, colombo.lng)
            .with_nearest(colombo, vec![hub("CMB", 7.18, 79.88), hub("RML", 6.82, 79.89)], vec![])
            .delayed("air_schedule", std::time::Duration::from_secs(1));
        let destinations = SideHubs {
            airports: vec![hub("AMS", 52.31, 4.768), hub("EIN", 51.45, 5.37), hub("RTM", 51.96, 4.44)],
            seaports: vec![],
        };
        let config = GraphConfig::default();
        let cache = CoordinateCache::new();
        let mut graph = sea_graph();

        let start = tokio::time::Instant::now();
        LayoverExpander::new(&gateway, &config, &cache)
            .expand(&mut graph, &destinations)
            .await;

        // 2 transfer airports x 3 destination airports, in pairs.
        assert_eq!(gateway.call_count("air_schedule"), 6);
        assert_eq!(gateway.peak_in_flight(), 2);
        let elapsed = start.elapsed();
        assert!(elapsed >= std::time::Duration::from_secs(3));
        assert!(elapsed < std::time::Duration::from_secs(4));
    }

    #[tokio::test]
    async fn arrival_at_end_of_calendar_skips_onward_lookups() {
        let colombo = Coordinates::new(6.95, 79.85);
        let mut graph = Graph::new();
        graph.insert_node(node("INCOK", NodeKind::Seaport, 9.967, 76.267));
        graph.insert_node(node("NLRTM", NodeKind::Seaport, 51.95, 4.14));
        let late = NaiveDateTime::MAX - Duration::hours(1);
        graph
            .add_edge(sea_with_stops("INCOK", "NLRTM", vec![stop("LKCMB", Some(late))]))
            .unwrap();

        let gateway = ScriptedGateway::new()
            .with_port("LKCMB", colombo.lat, colombo.lng)
            .with_nearest(colombo, vec![hub("CMB", 7.18, 79.88)], vec![]);
        let config = GraphConfig::default();
        let cache = CoordinateCache::new();

        LayoverExpander::new(&gateway, &config, &cache)
            .expand(&mut graph, &destination_side())
            .await;

        assert!(graph.contains_node(&id("LKCMB")));
        assert_eq!(gateway.call_count("air_schedule"), 0);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn buffer_is_added_to_arrival() {
        let config = GraphConfig::default();
        let earliest = t(3, 6) + config.connection_buffer(TransportMode::Sea);
        assert_eq!(earliest, t(4, 6));
        assert_eq!(earliest - t(3, 6), Duration::hours(24));
    }
}
