//! Multimodal route search engine.
//!
//! A search runs in stages over one graph:
//!
//! 1. [`GraphBuilder`] seeds the graph with the endpoints, their nearby hubs
//!    and the scheduled service between hubs of the same mode
//! 2. [`LayoverExpander`] turns stops inside itineraries into transfer
//!    points to the opposite mode
//! 3. [`connect_nearby_hubs`] links hubs that are within driving range
//! 4. [`RouteEnhancer`] asks the gateway for more connections along the
//!    routes found so far, until no pass adds routes
//! 5. [`enumerate_paths`] lists every path under the transfer limit

mod builder;
mod config;
mod enhancer;
mod itinerary;
mod layover;
mod mesh;
mod paths;
mod search;

pub use builder::{BuildOutcome, GraphBuilder, SideHubs};
pub use config::{GraphConfig, MAX_CONNECTION_BUFFER_HOURS};
pub use enhancer::{EnhanceReport, RouteEnhancer};
pub use itinerary::{air_edge, sea_edge};
pub use layover::{Layover, LayoverExpander, LayoverReport, collect_layovers};
pub use mesh::connect_nearby_hubs;
pub use paths::enumerate_paths;
pub use search::{
    MultimodalSearch, SearchError, SearchMetadata, SearchOutcome, SearchRequest, ValidatedRequest,
};
