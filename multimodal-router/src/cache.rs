//! Caching layers for gateway responses.
//!
//! Two caches live for the whole process:
//!
//! - [`CoordinateCache`] memoizes port/airport positions. Positions don't
//!   change, so it never evicts.
//! - [`CachedGateway`] wraps any [`TransportGateway`] and keeps schedule and
//!   nearest-hub answers for a bounded time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache as MokaCache;
use tracing::{debug, warn};

use crate::domain::{Coordinates, NodeId};
use crate::gateway::{
    AirItinerary, GatewayError, NearestHubs, PortLocation, SeaRoute, TransportGateway,
    with_timeout,
};
use crate::graph::Graph;

/// A code whose position is known.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownPosition {
    pub name: Option<String>,
    pub coords: Coordinates,
}

/// Process-lifetime memo of code → position.
///
/// Only resolved positions are stored; a code the lookup could not place
/// is asked for again next time.
#[derive(Clone)]
pub struct CoordinateCache {
    entries: MokaCache<NodeId, KnownPosition>,
}

impl Default for CoordinateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateCache {
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder().build(),
        }
    }

    pub async fn get(&self, code: &NodeId) -> Option<KnownPosition> {
        self.entries.get(code).await
    }

    /// Resolve positions for `codes`, asking the gateway only for misses.
    ///
    /// All misses go out in one lookup bounded by `budget`. A failed lookup
    /// is logged and leaves those codes unresolved. Codes absent from the
    /// returned map could not be placed.
    pub async fn resolve<G>(
        &self,
        gateway: &G,
        codes: &[NodeId],
        budget: Duration,
    ) -> HashMap<NodeId, KnownPosition>
    where
        G: TransportGateway + ?Sized,
    {
        let mut resolved = HashMap::new();
        let mut misses = Vec::new();
        let mut seen = HashSet::new();

        for code in codes {
            if !seen.insert(code) {
                continue;
            }
            match self.entries.get(code).await {
                Some(position) => {
                    resolved.insert(code.clone(), position);
                }
                None => misses.push(code.clone()),
            }
        }

        if misses.is_empty() {
            return resolved;
        }

        debug!(
            cached = resolved.len(),
            misses = misses.len(),
            "Looking up port coordinates"
        );

        match with_timeout(
            "port_coordinates",
            budget,
            gateway.port_coordinates(&misses),
        )
        .await
        {
            Ok(locations) => {
                for PortLocation { code, name, coords } in locations {
                    if !misses.contains(&code) {
                        continue;
                    }
                    let Some(coords) = coords else {
                        continue;
                    };
                    let position = KnownPosition { name, coords };
                    self.entries.insert(code.clone(), position.clone()).await;
                    resolved.insert(code, position);
                }
            }
            Err(e) => {
                warn!(codes = misses.len(), error = %e, "Port coordinate lookup failed");
            }
        }

        resolved
    }
}

/// Configuration for the schedule response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per kind.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 1000,
        }
    }
}

type RouteKey = (NodeId, NodeId, NaiveDate);

/// Gateway with caching of schedule and nearest-hub answers.
///
/// Errors are never cached. Intermediate-route and coordinate lookups pass
/// straight through: the former depends on the whole graph, the latter has
/// its own cache.
pub struct CachedGateway<G> {
    inner: G,
    nearest: MokaCache<(u64, u64), NearestHubs>,
    air: MokaCache<RouteKey, Arc<Vec<AirItinerary>>>,
    sea: MokaCache<RouteKey, Arc<Vec<SeaRoute>>>,
}

impl<G: TransportGateway> CachedGateway<G> {
    /// Create a new cached gateway.
    pub fn new(inner: G, config: &CacheConfig) -> Self {
        Self {
            inner,
            nearest: build(config),
            air: build(config),
            sea: build(config),
        }
    }

    /// Get the underlying gateway.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.nearest.invalidate_all();
        self.air.invalidate_all();
        self.sea.invalidate_all();
    }
}

fn build<K, V>(config: &CacheConfig) -> MokaCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    MokaCache::builder()
        .time_to_live(config.ttl)
        .max_capacity(config.max_capacity)
        .build()
}

#[async_trait]
impl<G: TransportGateway> TransportGateway for CachedGateway<G> {
    async fn nearest_hubs(&self, at: Coordinates) -> Result<NearestHubs, GatewayError> {
        let key = (at.lat.to_bits(), at.lng.to_bits());

        if let Some(cached) = self.nearest.get(&key).await {
            return Ok(cached);
        }

        let hubs = self.inner.nearest_hubs(at).await?;
        self.nearest.insert(key, hubs.clone()).await;
        Ok(hubs)
    }

    async fn air_schedule(
        &self,
        origin: &NodeId,
        destination: &NodeId,
        date: NaiveDate,
    ) -> Result<Vec<AirItinerary>, GatewayError> {
        let key = (origin.clone(), destination.clone(), date);

        if let Some(cached) = self.air.get(&key).await {
            return Ok(cached.as_ref().clone());
        }

        let itineraries = self.inner.air_schedule(origin, destination, date).await?;
        self.air.insert(key, Arc::new(itineraries.clone())).await;
        Ok(itineraries)
    }

    async fn sea_schedule(
        &self,
        origin: &NodeId,
        destination: &NodeId,
        date: NaiveDate,
    ) -> Result<Vec<SeaRoute>, GatewayError> {
        let key = (origin.clone(), destination.clone(), date);

        if let Some(cached) = self.sea.get(&key).await {
            return Ok(cached.as_ref().clone());
        }

        let routes = self.inner.sea_schedule(origin, destination, date).await?;
        self.sea.insert(key, Arc::new(routes.clone())).await;
        Ok(routes)
    }

    async fn intermediate_routes(
        &self,
        signature: &[NodeId],
        date: NaiveDate,
        graph: &Graph,
    ) -> Result<Option<Graph>, GatewayError> {
        self.inner.intermediate_routes(signature, date, graph).await
    }

    async fn port_coordinates(&self, codes: &[NodeId]) -> Result<Vec<PortLocation>, GatewayError> {
        self.inner.port_coordinates(codes).await
    }
}
