//! Schedule and lookup gateways.
//!
//! The engine talks to the outside world only through [`TransportGateway`]:
//! nearest-hub lookup, air and sea schedules, intermediate-route expansion
//! and port coordinate lookup. [`HttpGateway`] is the production
//! implementation backed by the schedule service's JSON API.

mod client;
mod convert;
mod error;
mod schedule;
#[cfg(test)]
pub(crate) mod testing;
mod types;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Coordinates, NodeId};
use crate::graph::Graph;

pub use client::{GatewayConfig, HttpGateway};
pub use convert::parse_timestamp;
pub use error::GatewayError;
pub use schedule::{
    AirItinerary, FlightSegment, Hub, NearestHubs, PortLocation, ScheduleStop, SeaRoute, Voyage,
};

/// Source of hubs, schedules and coordinates.
///
/// Every method is a single outbound call; callers decide how failures
/// degrade.
#[async_trait]
pub trait TransportGateway: Send + Sync {
    /// Airports and seaports near a point.
    async fn nearest_hubs(&self, at: Coordinates) -> Result<NearestHubs, GatewayError>;

    /// Air itineraries between two airports on a date. Empty means no service.
    async fn air_schedule(
        &self,
        origin: &NodeId,
        destination: &NodeId,
        date: NaiveDate,
    ) -> Result<Vec<AirItinerary>, GatewayError>;

    /// Complete sea routings between two ports from a date.
    async fn sea_schedule(
        &self,
        origin: &NodeId,
        destination: &NodeId,
        date: NaiveDate,
    ) -> Result<Vec<SeaRoute>, GatewayError>;

    /// Ask for additional connections along a stop sequence.
    ///
    /// Returns an enlarged copy of `graph`, or `None` if nothing was found.
    async fn intermediate_routes(
        &self,
        signature: &[NodeId],
        date: NaiveDate,
        graph: &Graph,
    ) -> Result<Option<Graph>, GatewayError>;

    /// Positions for port or airport codes.
    async fn port_coordinates(&self, codes: &[NodeId]) -> Result<Vec<PortLocation>, GatewayError>;
}

/// Run a gateway call under a time budget.
pub async fn with_timeout<T, F>(
    operation: &'static str,
    budget: Duration,
    call: F,
) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout {
            operation,
            after_secs: budget.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timeout_maps_to_gateway_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, GatewayError>(1)
        };
        let err = with_timeout("nearest_hubs", Duration::from_secs(5), slow)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Timeout {
                operation: "nearest_hubs",
                after_secs: 5
            }
        ));
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let fast = async { Ok::<_, GatewayError>(7) };
        let value = with_timeout("air_schedule", Duration::from_secs(5), fast)
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
