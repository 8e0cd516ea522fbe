use std::net::SocketAddr;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use multimodal_router::cache::{CacheConfig, CachedGateway};
use multimodal_router::engine::GraphConfig;
use multimodal_router::gateway::{GatewayConfig, HttpGateway};
use multimodal_router::web::{AppState, create_router};

/// Listen address when `MULTIMODAL_LISTEN` is unset.
const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("multimodal_router=info,tower_http=info")),
        )
        .init();

    // Schedule service location and credentials from environment
    let gateway_config = match std::env::var("MULTIMODAL_API_URL") {
        Ok(url) => GatewayConfig::new(url),
        Err(_) => GatewayConfig::default(),
    };
    let gateway_config = match std::env::var("MULTIMODAL_API_KEY") {
        Ok(key) => gateway_config.with_api_key(key),
        Err(_) => {
            warn!("MULTIMODAL_API_KEY not set, calling the schedule service without a key");
            gateway_config
        }
    };
    let base_url = gateway_config.base_url.clone();

    let gateway = match HttpGateway::new(gateway_config) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!(error = %e, "Failed to create schedule client");
            return ExitCode::FAILURE;
        }
    };
    let gateway = CachedGateway::new(gateway, &CacheConfig::default());

    let state = AppState::new(gateway, GraphConfig::default());
    let app = create_router(state);

    let listen = std::env::var("MULTIMODAL_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_string());
    let addr: SocketAddr = match listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(%listen, error = %e, "Invalid listen address");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(%addr, schedule_service = %base_url, "Multimodal router listening");
    info!("  GET  /health           - Health check");
    info!("  POST /graph/multimodal - Build graph and paths between two points");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
