//! HTTP client for the schedule service.
//!
//! Handles authentication, concurrency limiting, and conversion of the
//! JSON responses to parsed gateway types.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{Coordinates, NodeId};
use crate::graph::Graph;

use super::TransportGateway;
use super::convert::{convert_flight, convert_hapag, convert_nearest, convert_port_locations};
use super::error::GatewayError;
use super::schedule::{AirItinerary, NearestHubs, PortLocation, SeaRoute};
use super::types::{
    AirCargoRequest, AirCargoResponse, CONTAINER_TYPE, HapagRequest, HapagResponse,
    IntermediateRoutesRequest, IntermediateRoutesResponse, NearestResponse, PortLocationRecord,
};

/// Default base URL for the schedule service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the schedule service
    pub base_url: String,
    /// Optional key sent as `x-api-key`
    pub api_key: Option<String>,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Create a new config pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Send an API key with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Schedule service client.
///
/// Uses a semaphore to limit concurrent requests across all searches.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl HttpGateway {
    /// Create a new gateway with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| GatewayError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            headers.insert("x-api-key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a JSON body, mapping status codes to errors.
    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| GatewayError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(GatewayError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| GatewayError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

#[async_trait]
impl TransportGateway for HttpGateway {
    async fn nearest_hubs(&self, at: Coordinates) -> Result<NearestHubs, GatewayError> {
        let request = self
            .http
            .get(self.url("/api/nearest"))
            .query(&[("lat", at.lat), ("lng", at.lng)]);

        let response: NearestResponse = self.fetch(request).await?;
        let hubs = convert_nearest(&response);

        debug!(
            lat = at.lat,
            lng = at.lng,
            airports = hubs.airports.len(),
            seaports = hubs.seaports.len(),
            "Fetched nearest hubs"
        );
        Ok(hubs)
    }

    async fn air_schedule(
        &self,
        origin: &NodeId,
        destination: &NodeId,
        date: NaiveDate,
    ) -> Result<Vec<AirItinerary>, GatewayError> {
        let body = AirCargoRequest {
            origin: origin.as_str(),
            destination: destination.as_str(),
            flight_date: date,
        };
        let request = self.http.post(self.url("/api/air-cargo")).json(&body);

        let response: AirCargoResponse = self.fetch(request).await?;
        Ok(response.records.iter().map(convert_flight).collect())
    }

    async fn sea_schedule(
        &self,
        origin: &NodeId,
        destination: &NodeId,
        date: NaiveDate,
    ) -> Result<Vec<SeaRoute>, GatewayError> {
        let body = HapagRequest {
            start_location: origin.as_str(),
            end_location: destination.as_str(),
            start_date: date,
            container_type: CONTAINER_TYPE,
        };
        let request = self.http.post(self.url("/api/hapag-routes")).json(&body);

        let response: HapagResponse = self.fetch(request).await?;
        Ok(convert_hapag(&response, origin, destination))
    }

    async fn intermediate_routes(
        &self,
        signature: &[NodeId],
        date: NaiveDate,
        graph: &Graph,
    ) -> Result<Option<Graph>, GatewayError> {
        let body = IntermediateRoutesRequest {
            path: signature,
            start_date: date,
            complete_graph: graph,
        };
        let request = self
            .http
            .post(self.url("/api/intermediate-ship-routes"))
            .json(&body);

        let response: IntermediateRoutesResponse = self.fetch(request).await?;
        Ok(response.complete_graph)
    }

    async fn port_coordinates(&self, codes: &[NodeId]) -> Result<Vec<PortLocation>, GatewayError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let joined = codes
            .iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .http
            .get(self.url("/api/port-locations"))
            .query(&[("codes", joined)]);

        let records: Vec<PortLocationRecord> = self.fetch(request).await?;
        Ok(convert_port_locations(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = GatewayConfig::new("http://schedules.internal:3000/")
            .with_api_key("secret")
            .with_max_concurrent(0)
            .with_timeout(10);

        assert_eq!(config.base_url, "http://schedules.internal:3000");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn config_defaults() {
        let config = GatewayConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, None);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn client_creation() {
        assert!(HttpGateway::new(GatewayConfig::default()).is_ok());
        assert!(HttpGateway::new(GatewayConfig::default().with_api_key("key")).is_ok());

        let bad = GatewayConfig::default().with_api_key("bad\nkey");
        assert!(matches!(
            HttpGateway::new(bad),
            Err(GatewayError::Api { status: 0, .. })
        ));
    }

    #[test]
    fn urls_join_base_and_path() {
        let gateway = HttpGateway::new(GatewayConfig::new("http://host:1/")).unwrap();
        assert_eq!(gateway.url("/api/nearest"), "http://host:1/api/nearest");
    }

    #[tokio::test]
    async fn empty_code_list_skips_request() {
        // Port 9 (discard) would fail if a request were attempted.
        let gateway = HttpGateway::new(GatewayConfig::new("http://127.0.0.1:9")).unwrap();
        let locations = gateway.port_coordinates(&[]).await.unwrap();
        assert!(locations.is_empty());
    }
}
