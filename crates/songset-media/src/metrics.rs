//! Trim pipeline metrics.
//!
//! Nothing is exported unless the binary installs a recorder.

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Files processed by the trim pipeline, by outcome.
    pub const TRIM_FILES_TOTAL: &str = "songset_trim_files_total";

    /// Leading audio removed per trimmed file, in seconds.
    pub const TRIM_REMOVED_SECONDS: &str = "songset_trim_removed_seconds";

    /// Clip downloads by status.
    pub const DOWNLOADS_TOTAL: &str = "songset_downloads_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record the outcome of one trim job.
pub fn record_trim(outcome: &str, removed_ms: u64) {
    counter!(
        names::TRIM_FILES_TOTAL,
        "outcome" => outcome.to_string()
    )
    .increment(1);

    if removed_ms > 0 {
        histogram!(names::TRIM_REMOVED_SECONDS).record(removed_ms as f64 / 1000.0);
    }
}

/// Record a clip download attempt.
pub fn record_download(status: &str) {
    counter!(
        names::DOWNLOADS_TOTAL,
        "status" => status.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::TRIM_FILES_TOTAL.starts_with("songset_"));
        assert!(names::TRIM_REMOVED_SECONDS.ends_with("_seconds"));
        assert!(names::DOWNLOADS_TOTAL.contains("downloads"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_trim("trimmed", 250);
        record_download("error");
    }
}
