//! YouTube Data API v3 client.
//!
//! Finds the most-viewed music video for a song with two calls: `search.list`
//! for candidate IDs, then `videos.list` for their statistics.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info_span, Instrument};

use songset_models::youtube_watch_url;

use crate::error::SourceResult;
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::http::{error_from_response, require_env};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube's "Music" video category.
const MUSIC_CATEGORY_ID: &str = "10";

// =============================================================================
// Configuration
// =============================================================================

/// YouTube client configuration.
#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    pub api_key: String,
    pub base_url: String,
    /// Number of search results compared by view count.
    pub max_results: u8,
    /// Request timeout
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl YoutubeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: 5,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> SourceResult<Self> {
        let mut config = Self::new(require_env("YOUTUBE_API_KEY")?);
        if let Ok(url) = std::env::var("YOUTUBE_API_BASE_URL") {
            config.base_url = url;
        }
        config.retry = RetryConfig::from_env();
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Default, Deserialize)]
struct VideoStatistics {
    /// Counts are JSON strings; hidden counts are absent.
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Best YouTube match for a song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoutubeMatch {
    pub video_id: String,
    /// `https://www.youtube.com/watch?v=<id>`
    pub url: String,
    pub view_count: u64,
}

/// Anything that can find the most-viewed video for a song.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// `Ok(None)` when nothing with a positive view count matched.
    async fn search_most_viewed(&self, song: &str, artist: &str) -> SourceResult<Option<YoutubeMatch>>;
}

/// YouTube Data API client.
#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    config: YoutubeConfig,
}

impl YoutubeClient {
    pub fn new(config: YoutubeConfig) -> SourceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("songset/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> SourceResult<Self> {
        Self::new(YoutubeConfig::from_env()?)
    }

    /// Video IDs of the top search results for `query`.
    pub async fn search_video_ids(&self, query: &str) -> SourceResult<Vec<String>> {
        let max_results = self.config.max_results.to_string();
        let response: SearchResponse = self
            .get_json(
                "search",
                "search",
                &[
                    ("part", "id,snippet"),
                    ("type", "video"),
                    ("q", query),
                    ("maxResults", max_results.as_str()),
                    ("videoCategoryId", MUSIC_CATEGORY_ID),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }

    /// View counts for `ids`. Videos with hidden counts are omitted.
    pub async fn view_counts(&self, ids: &[String]) -> SourceResult<Vec<(String, u64)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let response: VideosResponse = self
            .get_json(
                "videos",
                "videos",
                &[("part", "statistics"), ("id", joined.as_str())],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|v| {
                let views = v.statistics.view_count?.parse::<u64>().ok()?;
                Some((v.id, views))
            })
            .collect())
    }

    /// GET with API key, retry, tracing and metrics.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        resource: &str,
        query: &[(&str, &str)],
    ) -> SourceResult<T> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), resource);
        let url = url.as_str();
        let span = info_span!("youtube_request", operation = %operation);
        let start = Instant::now();

        let result = with_retry(&self.config.retry, operation, move || self.get_once(url, query))
            .instrument(span)
            .await;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request("youtube", operation, status, start.elapsed().as_millis() as f64);

        result
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> SourceResult<T> {
        let response = self
            .http
            .get(url)
            .query(query)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// Highest view count, strictly above zero. Ties keep the earliest.
pub fn pick_most_viewed(candidates: &[(String, u64)]) -> Option<(String, u64)> {
    let mut best: Option<(String, u64)> = None;
    for (id, views) in candidates {
        let current = best.as_ref().map(|(_, v)| *v).unwrap_or(0);
        if *views > current {
            best = Some((id.clone(), *views));
        }
    }
    best
}

#[async_trait]
impl VideoSearch for YoutubeClient {
    async fn search_most_viewed(&self, song: &str, artist: &str) -> SourceResult<Option<YoutubeMatch>> {
        let query = format!("{} {}", song, artist);
        let ids = self.search_video_ids(&query).await?;
        if ids.is_empty() {
            debug!(query = %query, "No search results");
            return Ok(None);
        }

        let counts = self.view_counts(&ids).await?;
        Ok(pick_most_viewed(&counts).map(|(video_id, view_count)| YoutubeMatch {
            url: youtube_watch_url(&video_id),
            video_id,
            view_count,
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================
