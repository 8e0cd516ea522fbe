//! Web layer for the multimodal route planner.
//!
//! Provides the HTTP endpoint that builds a graph between two points and
//! returns it with the enumerated paths.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
