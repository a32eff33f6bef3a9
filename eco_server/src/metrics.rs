//! Prometheus metrics for the authentication service.
//!
//! Metrics are recorded through the `metrics` facade and exported in
//! Prometheus text format when [`init_metrics`] has installed the exporter.
//! Without an exporter every recording call is a no-op.
//!
//! # Metrics
//!
//! - `http_requests_total{method, path, status}`
//! - `http_request_duration_ms{method, path}`
//! - `auth_registrations_total{result}`
//! - `auth_login_attempts_total{result}`
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use eco_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/v1/auth/login/", 200);
//! metrics::login_attempts_total("success");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment registrations counter (`created` or `rejected`).
pub fn registrations_total(result: &str) {
    metrics::counter!("auth_registrations_total",
        "result" => result.to_string()
    )
    .increment(1);
}

/// Increment login attempts counter (`success` or `failure`).
pub fn login_attempts_total(result: &str) {
    metrics::counter!("auth_login_attempts_total",
        "result" => result.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        http_requests_total("GET", "/health", 200);
        http_request_duration_ms("GET", "/health", 1.5);
        registrations_total("created");
        login_attempts_total("failure");
    }
}
