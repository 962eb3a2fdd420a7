//! Spotify Web API client.
//!
//! Uses the client-credentials flow, which is enough for reading public
//! playlists. Tokens are cached until shortly before they expire.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, info_span, warn, Instrument};

use songset_models::{spotify_playlist_id, TrackRecord};
use songset_models::track::UNKNOWN_RELEASE;

use crate::error::{SourceError, SourceResult};
use crate::http::{error_from_response, require_env};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::token::TokenCache;

const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";

/// Page size for playlist item requests (Spotify's maximum).
const PAGE_LIMIT: u32 = 100;

// =============================================================================
// Configuration
// =============================================================================

/// Spotify client configuration.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Web API base URL
    pub api_base_url: String,
    /// Accounts service base URL (token endpoint)
    pub accounts_base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl SpotifyConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            accounts_base_url: DEFAULT_ACCOUNTS_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> SourceResult<Self> {
        let client_id = require_env("SPOTIFY_CLIENT_ID")?;
        let client_secret = require_env("SPOTIFY_CLIENT_SECRET")?;

        let mut config = Self::new(client_id, client_secret);
        if let Ok(url) = std::env::var("SPOTIFY_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = std::env::var("SPOTIFY_ACCOUNTS_BASE_URL") {
            config.accounts_base_url = url;
        }
        config.retry = RetryConfig::from_env();
        Ok(config)
    }

    /// Point both endpoints at another host (used by tests).
    pub fn with_base_urls(mut self, api: impl Into<String>, accounts: impl Into<String>) -> Self {
        self.api_base_url = api.into();
        self.accounts_base_url = accounts.into();
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
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct PlaylistMeta {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TracksPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    name: Option<String>,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    album: Option<ApiAlbum>,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    release_date: Option<String>,
}

impl ApiTrack {
    fn into_record(self) -> Option<TrackRecord> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        let artists = self
            .artists
            .into_iter()
            .filter_map(|a| a.name)
            .collect::<Vec<_>>()
            .join(", ");
        let release = release_year(self.album.and_then(|a| a.release_date).as_deref());
        Some(TrackRecord::new(name, artists, release))
    }
}

/// Year part of a Spotify release date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
pub fn release_year(release_date: Option<&str>) -> String {
    match release_date.map(str::trim) {
        Some(date) if !date.is_empty() => date.chars().take(4).collect(),
        _ => UNKNOWN_RELEASE.to_string(),
    }
}

// =============================================================================
// Client
// =============================================================================

/// Tracks of one playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: String,
    /// Display name, or the ID when the name could not be fetched.
    pub name: String,
    pub tracks: Vec<TrackRecord>,
}

/// Anything that can list the tracks of a playlist.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Fetch a playlist by ID or URL.
    async fn fetch_playlist(&self, reference: &str) -> SourceResult<Playlist>;
}

/// Spotify Web API client.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    config: SpotifyConfig,
    token_cache: Arc<TokenCache>,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> SourceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("songset/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            token_cache: Arc::new(TokenCache::new()),
        })
    }

    pub fn from_env() -> SourceResult<Self> {
        Self::new(SpotifyConfig::from_env()?)
    }

    async fn access_token(&self) -> SourceResult<String> {
        self.token_cache
            .get_or_refresh(|| self.request_token())
            .await
    }

    async fn request_token(&self) -> SourceResult<(String, Duration)> {
        let url = format!("{}/api/token", self.config.accounts_base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::auth_error(format!(
                "token request failed ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok((token.access_token, Duration::from_secs(token.expires_in)))
    }

    /// Display name of a playlist.
    pub async fn playlist_name(&self, playlist_id: &str) -> SourceResult<Option<String>> {
        let url = format!("{}/playlists/{}", self.api_base(), playlist_id);
        let meta: PlaylistMeta = self
            .get_json("playlist", &url, &[("fields", "name,id")])
            .await?;
        Ok(meta.name)
    }

    /// All tracks of a playlist, following pagination.
    ///
    /// Items without a track (local files, removed tracks) are skipped.
    pub async fn playlist_tracks(&self, playlist_id: &str) -> SourceResult<Vec<TrackRecord>> {
        let limit = PAGE_LIMIT.to_string();
        let first = format!("{}/playlists/{}/tracks", self.api_base(), playlist_id);
        let mut page: TracksPage = self
            .get_json("playlist_tracks", &first, &[("limit", limit.as_str())])
            .await?;

        let mut tracks = Vec::new();
        loop {
            let before = tracks.len();
            tracks.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.track)
                    .filter_map(ApiTrack::into_record),
            );
            debug!(
                playlist_id = playlist_id,
                page_tracks = tracks.len() - before,
                total = tracks.len(),
                "Fetched playlist page"
            );

            match page.next {
                Some(next) => {
                    page = self.get_json("playlist_tracks", &next, &[]).await?;
                }
                None => break,
            }
        }

        Ok(tracks)
    }

    fn api_base(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    /// Authenticated GET with retry, tracing and metrics.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> SourceResult<T> {
        let span = info_span!("spotify_request", operation = %operation);
        let start = Instant::now();

        let result = with_retry(&self.config.retry, operation, move || self.get_once(url, query))
            .instrument(span)
            .await;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request("spotify", operation, status, start.elapsed().as_millis() as f64);

        result
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> SourceResult<T> {
        let token = self.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.token_cache.invalidate().await;
        }
        Err(error_from_response(response).await)
    }
}

#[async_trait]
impl PlaylistSource for SpotifyClient {
    async fn fetch_playlist(&self, reference: &str) -> SourceResult<Playlist> {
        let id = spotify_playlist_id(reference)?;

        // The name is only used for logging
        let name = match self.playlist_name(&id).await {
            Ok(Some(name)) => name,
            Ok(None) => id.clone(),
            Err(e) => {
                warn!(playlist_id = %id, "Could not fetch playlist name: {}", e);
                id.clone()
            }
        };

        info!(playlist = %name, playlist_id = %id, "Fetching playlist tracks");
        let tracks = self.playlist_tracks(&id).await?;
        info!(playlist = %name, tracks = tracks.len(), "Fetched playlist");

        Ok(Playlist { id, name, tracks })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    async fn client_for(server: &MockServer) -> SpotifyClient {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "test-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(server)
            .await;

        let config = SpotifyConfig::new("id", "secret")
            .with_base_urls(format!("{}/v1", server.uri()), server.uri())
            .with_retry(fast_retry());
        SpotifyClient::new(config).unwrap()
    }

    fn track(name: &str, artists: &[&str], date: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "track": {
                "name": name,
                "artists": artists.iter().map(|a| serde_json::json!({"name": a})).collect::<Vec<_>>(),
                "album": {"release_date": date}
            }
        })
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year(Some("2014-06-20")), "2014");
        assert_eq!(release_year(Some("1999")), "1999");
        assert_eq!(release_year(Some("")), "Unknown");
        assert_eq!(release_year(None), "Unknown");
    }

    #[test]
    #[serial]
    fn test_config_from_env_requires_credentials() {
        std::env::remove_var("SPOTIFY_CLIENT_ID");
        std::env::set_var("SPOTIFY_CLIENT_SECRET", "secret");
        assert!(matches!(
            SpotifyConfig::from_env(),
            Err(SourceError::MissingCredentials(_))
        ));

        std::env::set_var("SPOTIFY_CLIENT_ID", "  ");
        assert!(SpotifyConfig::from_env().is_err());

        std::env::set_var("SPOTIFY_CLIENT_ID", "id");
        let config = SpotifyConfig::from_env().unwrap();
        assert_eq!(config.client_id, "id");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);

        std::env::remove_var("SPOTIFY_CLIENT_ID");
        std::env::remove_var("SPOTIFY_CLIENT_SECRET");
    }

    #[tokio::test]
    async fn test_playlist_tracks_follow_pagination() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1/playlists/abc/tracks"))
            .and(query_param("limit", "100"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    track("Photograph", &["Ed Sheeran"], Some("2014-06-20")),
                    {"track": null},
                ],
                "next": format!("{}/v1/playlists/abc/tracks/page2", server.uri())
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/playlists/abc/tracks/page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [track("Under Pressure", &["Queen", "David Bowie"], None)],
                "next": null
            })))
            .mount(&server)
            .await;

        let tracks = client.playlist_tracks("abc").await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].song_name, "Photograph");
        assert_eq!(tracks[0].release, "2014");
        assert_eq!(tracks[1].artists, "Queen, David Bowie");
        assert_eq!(tracks[1].release, "Unknown");
    }

    #[tokio::test]
    async fn test_fetch_playlist_falls_back_to_id_for_name() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1/playlists/6i2Qd6OpeRBAzxfscNXeWp"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/playlists/6i2Qd6OpeRBAzxfscNXeWp/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [track("Song", &["Artist"], Some("2001-01-01"))],
                "next": null
            })))
            .mount(&server)
            .await;

        let playlist = client
            .fetch_playlist("https://open.spotify.com/playlist/6i2Qd6OpeRBAzxfscNXeWp?si=c75919d9")
            .await
            .unwrap();
        assert_eq!(playlist.id, "6i2Qd6OpeRBAzxfscNXeWp");
        assert_eq!(playlist.name, "6i2Qd6OpeRBAzxfscNXeWp");
        assert_eq!(playlist.tracks.len(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1/playlists/abc"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/playlists/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "Hits"})))
            .mount(&server)
            .await;

        assert_eq!(client.playlist_name("abc").await.unwrap(), Some("Hits".to_string()));
    }

    #[tokio::test]
    async fn test_token_failure_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let config = SpotifyConfig::new("id", "bad")
            .with_base_urls(format!("{}/v1", server.uri()), server.uri())
            .with_retry(fast_retry());
        let client = SpotifyClient::new(config).unwrap();

        assert!(matches!(
            client.playlist_name("abc").await,
            Err(SourceError::AuthError(_))
        ));
    }
}
