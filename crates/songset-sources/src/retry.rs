//! Retry policy with exponential backoff and jitter.
//!
//! - Exponential backoff with full jitter
//! - Respects Retry-After on 429
//! - Configurable base and max delays

use std::time::Duration;

use tracing::{info_span, warn, Instrument};

use crate::error::SourceResult;
use crate::metrics::record_retry;

// =============================================================================
// Configuration
// =============================================================================

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay cap (in milliseconds).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_retries: u32 = std::env::var("SONGSET_RETRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_retries);

        let base_delay_ms: u64 = std::env::var("SONGSET_RETRY_BASE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.base_delay_ms);

        let max_delay_ms: u64 = std::env::var("SONGSET_RETRY_MAX_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_delay_ms);

        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
        }
    }
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Execute an async operation with retry.
///
/// Retries on network errors, HTTP 429 (honoring Retry-After) and 5xx.
/// Everything else is returned immediately.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> SourceResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = SourceResult<T>>,
{
    let mut attempt = 0u32;

    loop {
        let span = info_span!("source_retry", operation = %operation, attempt = attempt + 1);

        match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = calculate_delay(config, attempt, e.retry_after_ms());

                warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Request failed, retrying: {}",
                    e
                );

                record_retry(operation);

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Calculate retry delay with exponential backoff and full jitter.
fn calculate_delay(config: &RetryConfig, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
    if let Some(after) = retry_after_ms {
        return Duration::from_millis(after);
    }

    // base * 2^attempt, capped
    let exp_delay = config
        .base_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt));
    let capped_delay = exp_delay.min(config.max_delay_ms);

    // Full jitter from the clock's sub-second nanos
    let jittered = if capped_delay > 0 {
        use std::time::SystemTime;
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let random_factor = (nanos % 1000) as f64 / 1000.0;
        ((capped_delay as f64) * random_factor) as u64
    } else {
        0
    };

    Duration::from_millis(jittered.max(config.base_delay_ms))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use serial_test::serial;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 500);
        assert_eq!(config.max_delay_ms, 10_000);
    }

    #[test]
    #[serial]
    fn test_retry_config_from_env() {
        std::env::set_var("SONGSET_RETRY_BASE_MS", "250");
        std::env::set_var("SONGSET_RETRY_MAX_ATTEMPTS", "not-a-number");
        let config = RetryConfig::from_env();
        assert_eq!(config.base_delay_ms, 250);
        assert_eq!(config.max_retries, 3);
        std::env::remove_var("SONGSET_RETRY_BASE_MS");
        std::env::remove_var("SONGSET_RETRY_MAX_ATTEMPTS");
    }

    #[test]
    fn test_calculate_delay_with_retry_after() {
        let delay = calculate_delay(&RetryConfig::default(), 0, Some(2000));
        assert_eq!(delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_calculate_delay_bounds() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 2000,
        };
        let delay = calculate_delay(&config, 40, None);
        assert!(delay.as_millis() <= 2000);
        assert!(delay.as_millis() >= 1000);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&fast(), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(SourceError::from_http_status(503, "unavailable"))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: SourceResult<()> = with_retry(&fast(), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::RateLimited(1))
        })
        .await;

        assert!(matches!(result, Err(SourceError::RateLimited(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: SourceResult<()> = with_retry(&fast(), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::from_http_status(400, "bad request"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
