//! Multimodal route planner server.
//!
//! A web application that answers: "How can freight get from here to there
//! by any mix of road, sea and air?"

pub mod cache;
pub mod domain;
pub mod engine;
pub mod gateway;
pub mod graph;
pub mod web;
