//! Prometheus metrics for the auth server.
//!
//! Metrics are recorded through the `metrics` facade and exported in
//! Prometheus text format when an exporter is installed. Without one, every
//! call below is a no-op, which is what the tests rely on.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and duration
//! - **Auth Metrics**: Login attempts, registrations
//! - **Access Metrics**: Denials per rule and reason
//! - **Session Metrics**: Purged sessions
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ds_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::login_attempts_total(true);
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
///
/// Labelled by method and status only; paths carry ids and would explode the
/// label space.
pub fn http_requests_total(method: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment registrations counter.
pub fn registrations_total(success: bool) {
    metrics::counter!("registrations_total",
        "success" => success.to_string()
    )
    .increment(1);
}

// ============================================================================
// Access Metrics
// ============================================================================

/// Increment denied requests counter for an access rule.
pub fn access_denied_total(rule: &'static str, reason: &'static str) {
    metrics::counter!("access_denied_total",
        "rule" => rule,
        "reason" => reason
    )
    .increment(1);
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Add to the purged sessions counter.
pub fn sessions_purged_total(count: u64) {
    metrics::counter!("sessions_purged_total").increment(count);
}
