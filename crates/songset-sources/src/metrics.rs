//! Source API metrics collection.
//!
//! Provides standardized metrics for monitoring Spotify and YouTube calls:
//! - Request counters by API, operation and status
//! - Latency histograms
//! - Retry counters

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total API requests by api, operation and status.
    pub const REQUESTS_TOTAL: &str = "songset_api_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "songset_api_retries_total";

    /// Request latency in seconds by api and operation.
    pub const LATENCY_SECONDS: &str = "songset_api_latency_seconds";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed API request.
pub fn record_request(api: &str, operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "api" => api.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "api" => api.to_string(),
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
