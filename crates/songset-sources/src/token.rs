//! Access token caching.
//!
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight refresh behind a write lock
//! - Falls back to the existing token while it is still usable

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::SourceResult;

/// Refresh the token this long before it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Still valid with the refresh margin applied.
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Technically usable even though a refresh is due.
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Async token cache with single-flight refresh.
#[derive(Default)]
pub struct TokenCache {
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Return the cached token or obtain a new one with `refresh`.
    ///
    /// `refresh` yields the token and its lifetime.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> SourceResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SourceResult<(String, Duration)>>,
    {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
            return Ok(cached.access_token.clone());
        }

        match refresh().await {
            Ok((access_token, ttl)) => {
                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at: Instant::now() + ttl,
                });
                debug!(ttl_secs = ttl.as_secs(), "Refreshed access token");
                Ok(access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref().filter(|c| c.is_usable()) {
                    warn!("Token refresh failed, using existing token: {}", e);
                    return Ok(cached.access_token.clone());
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_token_is_cached_until_refresh_margin() {
        let cache = TokenCache::new();
        let counter = AtomicU32::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let token = cache
                .get_or_refresh(move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(("abc".to_string(), Duration::from_secs(3600)))
                })
                .await
                .unwrap();
            assert_eq!(token, "abc");
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        cache
            .get_or_refresh(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(("def".to_string(), Duration::from_secs(3600)))
            })
            .await
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_short_lived_token_refreshes_every_time() {
        let cache = TokenCache::new();
        for expected in ["one", "two"] {
            let token = cache
                .get_or_refresh(move || async move { Ok((expected.to_string(), Duration::from_secs(30))) })
                .await
                .unwrap();
            assert_eq!(token, expected);
        }
    }

    #[tokio::test]
    async fn test_refresh_failure_falls_back_to_usable_token() {
        let cache = TokenCache::new();
        cache
            .get_or_refresh(|| async { Ok(("old".to_string(), Duration::from_secs(30))) })
            .await
            .unwrap();

        // Inside the refresh margin but not expired
        let token = cache
            .get_or_refresh(|| async { Err(SourceError::auth_error("down")) })
            .await
            .unwrap();
        assert_eq!(token, "old");
    }

    #[tokio::test]
    async fn test_refresh_failure_without_token() {
        let cache = TokenCache::new();
        let result = cache
            .get_or_refresh(|| async { Err(SourceError::auth_error("bad credentials")) })
            .await;
        assert!(matches!(result, Err(SourceError::AuthError(_))));
    }
}
