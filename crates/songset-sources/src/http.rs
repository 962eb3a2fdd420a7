//! Helpers shared by the API clients.

use reqwest::StatusCode;

use crate::error::{SourceError, SourceResult};

/// Read a required, non-blank environment variable.
pub(crate) fn require_env(name: &str) -> SourceResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Ok(_) => Err(SourceError::missing_credentials(format!("{} cannot be empty", name))),
        Err(_) => Err(SourceError::missing_credentials(format!("{} must be set", name))),
    }
}

/// Build an error from a non-success response, honoring Retry-After.
pub(crate) async fn error_from_response(response: reqwest::Response) -> SourceError {
    let status = response.status();
    let retry_after_ms = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs * 1000);
    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();

    match (status, retry_after_ms) {
        (StatusCode::TOO_MANY_REQUESTS, Some(ms)) => SourceError::RateLimited(ms),
        _ => SourceError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body)),
    }
}
