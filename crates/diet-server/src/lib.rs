//! Diet planner HTTP service
//!
//! Serves meal plans from the labeled catalog written by the clustering
//! pipeline, alongside health, readiness and Prometheus endpoints.

pub mod api;
pub mod config;
