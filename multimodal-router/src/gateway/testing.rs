//! Scripted in-memory gateway for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Coordinates, NodeId};
use crate::graph::Graph;

use super::{
    AirItinerary, GatewayError, Hub, NearestHubs, PortLocation, SeaRoute, TransportGateway,
};

type Expander = Box<dyn Fn(&[NodeId], &Graph) -> Option<Graph> + Send + Sync>;

/// Serves canned answers and records every call.
///
/// Unscripted queries answer with an empty result.
#[derive(Default)]
pub struct ScriptedGateway {
    nearest: Vec<(Coordinates, NearestHubs)>,
    air: HashMap<(NodeId, NodeId), Vec<AirItinerary>>,
    sea: HashMap<(NodeId, NodeId), Vec<SeaRoute>>,
    ports: HashMap<NodeId, PortLocation>,
    expander: Option<Expander>,
    failing: Vec<&'static str>,
    delays: HashMap<&'static str, Duration>,
    calls: Mutex<Vec<(&'static str, String)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

pub fn id(s: &str) -> NodeId {
    NodeId::parse(s).unwrap()
}

pub fn hub(code: &str, lat: f64, lng: f64) -> Hub {
    Hub::new(id(code), format!("{code} hub"), Coordinates::new(lat, lng))
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nearest(mut self, at: Coordinates, airports: Vec<Hub>, seaports: Vec<Hub>) -> Self {
        self.nearest.push((at, NearestHubs { airports, seaports }));
        self
    }

    pub fn with_air(mut self, from: &str, to: &str, itineraries: Vec<AirItinerary>) -> Self {
        self.air.insert((id(from), id(to)), itineraries);
        self
    }

    pub fn with_sea(mut self, from: &str, to: &str, routes: Vec<SeaRoute>) -> Self {
        self.sea.insert((id(from), id(to)), routes);
        self
    }

    pub fn with_port(mut self, code: &str, lat: f64, lng: f64) -> Self {
        self.ports.insert(
            id(code),
            PortLocation {
                code: id(code),
                name: Some(format!("{code} port")),
                coords: Some(Coordinates::new(lat, lng)),
            },
        );
        self
    }

    pub fn with_expander(
        mut self,
        f: impl Fn(&[NodeId], &Graph) -> Option<Graph> + Send + Sync + 'static,
    ) -> Self {
        self.expander = Some(Box::new(f));
        self
    }

    /// Make every call to `operation` fail.
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.push(operation);
        self
    }

    /// Delay every call to `operation`.
    pub fn delayed(mut self, operation: &'static str, by: Duration) -> Self {
        self.delays.insert(operation, by);
        self
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Recorded arguments of every call to `operation`, in call order.
    pub fn calls_to(&self, operation: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, args)| args.clone())
            .collect()
    }

    /// Most calls of any kind that were ever in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: &'static str, args: String) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push((operation, args));
        let _guard = InFlight::enter(&self.in_flight, &self.peak);
        if let Some(delay) = self.delays.get(operation) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&operation) {
            return Err(GatewayError::Api {
                status: 503,
                message: format!("{operation} unavailable"),
            });
        }
        Ok(())
    }
}

/// Counts a call as in flight until dropped, including on timeout.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransportGateway for ScriptedGateway {
    async fn nearest_hubs(&self, at: Coordinates) -> Result<NearestHubs, GatewayError> {
        self.enter("nearest_hubs", format!("{},{}", at.lat, at.lng))
            .await?;
        Ok(self
            .nearest
            .iter()
            .find(|(c, _)| (c.lat - at.lat).abs() < 1e-9 && (c.lng - at.lng).abs() < 1e-9)
            .map(|(_, hubs)| hubs.clone())
            .unwrap_or_default())
    }

    async fn air_schedule(
        &self,
        origin: &NodeId,
        destination: &NodeId,
        date: NaiveDate,
    ) -> Result<Vec<AirItinerary>, GatewayError> {
        self.enter("air_schedule", format!("{origin}->{destination}@{date}"))
            .await?;
        Ok(self
            .air
            .get(&(origin.clone(), destination.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn sea_schedule(
        &self,
        origin: &NodeId,
        destination: &NodeId,
        date: NaiveDate,
    ) -> Result<Vec<SeaRoute>, GatewayError> {
        self.enter("sea_schedule", format!("{origin}->{destination}@{date}"))
            .await?;
        Ok(self
            .sea
            .get(&(origin.clone(), destination.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn intermediate_routes(
        &self,
        signature: &[NodeId],
        date: NaiveDate,
        graph: &Graph,
    ) -> Result<Option<Graph>, GatewayError> {
        let path: Vec<&str> = signature.iter().map(NodeId::as_str).collect();
        self.enter("intermediate_routes", format!("{}@{date}", path.join(",")))
            .await?;
        Ok(self.expander.as_ref().and_then(|f| f(signature, graph)))
    }

    async fn port_coordinates(&self, codes: &[NodeId]) -> Result<Vec<PortLocation>, GatewayError> {
        let joined: Vec<&str> = codes.iter().map(NodeId::as_str).collect();
        self.enter("port_coordinates", joined.join(",")).await?;
        Ok(codes
            .iter()
            .filter_map(|c| self.ports.get(c).cloned())
            .collect())
    }
}
