//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CoordinateCache;
use crate::engine::GraphConfig;
use crate::gateway::TransportGateway;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Schedule and lookup gateway (usually cached)
    pub gateway: Arc<dyn TransportGateway>,

    /// Port and airport positions, kept for the life of the process
    pub coordinates: CoordinateCache,

    /// Defaults that request options override
    pub config: Arc<GraphConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(gateway: impl TransportGateway + 'static, config: GraphConfig) -> Self {
        Self {
            gateway: Arc::new(gateway),
            coordinates: CoordinateCache::new(),
            config: Arc::new(config),
        }
    }
}
