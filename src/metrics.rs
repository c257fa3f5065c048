//! Prometheus metrics for application observability.
//!
//! Metrics are exposed on a dedicated listener (`METRICS_PORT`, default 9090).
//! Recording functions are safe to call before or without initialization; the
//! `metrics` facade discards samples until a recorder is installed.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `portfolio_contact_submissions_total` - Contact submissions (label: status)
//! - `portfolio_projects_created_total` - Project creations (label: status)
//! - `portfolio_projects_listed_total` - Project list requests
//! - `portfolio_rate_limited_total` - Requests rejected by the rate limiter (label: path)
//! - `portfolio_csrf_rejections_total` - Requests rejected by CSRF verification (label: reason)
//! - `portfolio_db_connect_attempts_total` - Document store connection attempts
//!
//! ## Histograms
//! - `portfolio_db_operation_duration_seconds` - Store operation latency (label: operation)
//!
//! ## Gauges
//! - `portfolio_db_connection_status` - 1 = connected, 0 = disconnected

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const CONTACT_SUBMISSIONS_TOTAL: &str = "portfolio_contact_submissions_total";
    pub const PROJECTS_CREATED_TOTAL: &str = "portfolio_projects_created_total";
    pub const PROJECTS_LISTED_TOTAL: &str = "portfolio_projects_listed_total";
    pub const RATE_LIMITED_TOTAL: &str = "portfolio_rate_limited_total";
    pub const CSRF_REJECTIONS_TOTAL: &str = "portfolio_csrf_rejections_total";
    pub const DB_CONNECT_ATTEMPTS_TOTAL: &str = "portfolio_db_connect_attempts_total";
    pub const DB_OPERATION_DURATION_SECONDS: &str = "portfolio_db_operation_duration_seconds";
    pub const DB_CONNECTION_STATUS: &str = "portfolio_db_connection_status";
}

/// Install the Prometheus exporter and describe every metric.
///
/// # Errors
///
/// Returns a message if the exporter cannot bind `metrics_addr` or a global
/// recorder is already installed.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::CONTACT_SUBMISSIONS_TOTAL,
        "Total number of contact form submissions"
    );
    describe_counter!(
        names::PROJECTS_CREATED_TOTAL,
        "Total number of project creation requests"
    );
    describe_counter!(
        names::PROJECTS_LISTED_TOTAL,
        "Total number of project list requests"
    );
    describe_counter!(
        names::RATE_LIMITED_TOTAL,
        "Total number of requests rejected by the rate limiter"
    );
    describe_counter!(
        names::CSRF_REJECTIONS_TOTAL,
        "Total number of requests rejected by CSRF verification"
    );
    describe_counter!(
        names::DB_CONNECT_ATTEMPTS_TOTAL,
        "Total number of document store connection attempts"
    );

    describe_histogram!(
        names::DB_OPERATION_DURATION_SECONDS,
        "Document store operation duration in seconds"
    );

    describe_gauge!(
        names::DB_CONNECTION_STATUS,
        "Document store connection status (1 = connected, 0 = disconnected)"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

// =============================================================================
// Counter Recording Functions
// =============================================================================

/// Record a contact submission outcome ("success", "invalid", "error").
pub fn record_contact_submission(status: &'static str) {
    counter!(names::CONTACT_SUBMISSIONS_TOTAL, "status" => status).increment(1);
}

/// Record a project creation outcome ("success", "invalid", "error").
pub fn record_project_created(status: &'static str) {
    counter!(names::PROJECTS_CREATED_TOTAL, "status" => status).increment(1);
}

pub fn record_projects_listed() {
    counter!(names::PROJECTS_LISTED_TOTAL).increment(1);
}

/// Record a request rejected by the rate limiter.
pub fn record_rate_limited(path: &str) {
    counter!(names::RATE_LIMITED_TOTAL, "path" => path.to_string()).increment(1);
}

/// Record a CSRF rejection ("missing_secret", "missing_token", "invalid_token").
pub fn record_csrf_rejection(reason: &'static str) {
    counter!(names::CSRF_REJECTIONS_TOTAL, "reason" => reason).increment(1);
}

pub fn record_db_connect_attempt() {
    counter!(names::DB_CONNECT_ATTEMPTS_TOTAL).increment(1);
}

// =============================================================================
// Histogram Recording Functions
// =============================================================================

/// Record document store operation duration.
pub fn record_db_operation_duration(operation: &'static str, duration_secs: f64) {
    histogram!(names::DB_OPERATION_DURATION_SECONDS, "operation" => operation)
        .record(duration_secs);
}

// =============================================================================
// Gauge Recording Functions
// =============================================================================

/// Update connection status gauge.
pub fn set_db_connection_status(connected: bool) {
    gauge!(names::DB_CONNECTION_STATUS).set(if connected { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    // These only verify the recorders don't panic without an installed exporter.

    #[test]
    fn test_record_counters() {
        record_contact_submission("success");
        record_project_created("invalid");
        record_projects_listed();
        record_rate_limited("/api/contact");
        record_csrf_rejection("invalid_token");
        record_db_connect_attempt();
    }

    #[test]
    fn test_record_db_operation_duration() {
        record_db_operation_duration("list_projects", 0.004);
    }

    #[test]
    fn test_set_db_connection_status() {
        set_db_connection_status(true);
        set_db_connection_status(false);
    }
}
