//! HTTP server for the eco_tech authentication service.
//!
//! Exposes the API router, configuration loading, structured logging and
//! Prometheus metrics so the binary and integration tests share one setup.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
