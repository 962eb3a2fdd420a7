//! Utility functions for URL parsing and file naming.
//!
//! These helpers are shared by the source clients, the catalog and the
//! media pipeline.

use thiserror::Error;
use url::Url;

/// Errors from reference parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("URL is not a valid YouTube URL")]
    InvalidYoutubeUrl,

    #[error("Video ID has invalid format")]
    InvalidVideoId,

    #[error("Video ID not found in URL")]
    VideoIdNotFound,

    #[error("Invalid Spotify playlist reference: {0}")]
    InvalidPlaylist(String),
}

/// Result type for reference parsing.
pub type ModelResult<T> = Result<T, ModelError>;

/// Base of the watch URLs stored in the catalog.
const YOUTUBE_WATCH_BASE: &str = "https://www.youtube.com/watch?v=";

/// Build the canonical watch URL for a video ID.
pub fn youtube_watch_url(video_id: &str) -> String {
    format!("{}{}", YOUTUBE_WATCH_BASE, video_id)
}

/// Extract the 11-character video ID from a YouTube URL.
///
/// Supports `watch?v=`, `youtu.be/`, `/embed/`, `/v/` and `/shorts/` forms.
pub fn extract_youtube_id(link: &str) -> ModelResult<String> {
    let url = Url::parse(link.trim()).map_err(|_| ModelError::InvalidYoutubeUrl)?;
    let host = url
        .host_str()
        .map(|h| h.trim_start_matches("www.").trim_start_matches("m.").to_ascii_lowercase())
        .ok_or(ModelError::InvalidYoutubeUrl)?;

    let candidate = match host.as_str() {
        "youtu.be" => url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        "youtube.com" | "music.youtube.com" => {
            if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
                Some(v.into_owned())
            } else {
                let segments: Vec<&str> = url
                    .path_segments()
                    .map(|s| s.collect())
                    .unwrap_or_default();
                match segments.as_slice() {
                    ["embed" | "v" | "shorts", id, ..] if !id.is_empty() => Some(id.to_string()),
                    _ => None,
                }
            }
        }
        _ => return Err(ModelError::InvalidYoutubeUrl),
    };

    let id = candidate.ok_or(ModelError::VideoIdNotFound)?;
    validate_youtube_id(id)
}

/// Validate YouTube video ID format and return it.
fn validate_youtube_id(id: String) -> ModelResult<String> {
    // YouTube video IDs are exactly 11 characters
    if id.len() != 11 {
        return Err(ModelError::InvalidVideoId);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ModelError::InvalidVideoId);
    }

    Ok(id)
}

/// Normalize a Spotify playlist reference to its ID.
///
/// Accepts a bare ID, a `spotify:playlist:<id>` URI, or an
/// `open.spotify.com/playlist/<id>?si=...` URL.
pub fn spotify_playlist_id(reference: &str) -> ModelResult<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ModelError::InvalidPlaylist(reference.to_string()));
    }

    if let Some(id) = reference.strip_prefix("spotify:playlist:") {
        return non_empty_id(id, reference);
    }

    if reference.contains("spotify.com") {
        let url = Url::parse(reference)
            .map_err(|_| ModelError::InvalidPlaylist(reference.to_string()))?;
        let id = url
            .path_segments()
            .and_then(|segments| {
                let segments: Vec<&str> = segments.collect();
                segments
                    .iter()
                    .position(|s| *s == "playlist")
                    .and_then(|i| segments.get(i + 1).map(|s| s.to_string()))
            })
            .ok_or_else(|| ModelError::InvalidPlaylist(reference.to_string()))?;
        return non_empty_id(&id, reference);
    }

    non_empty_id(reference, reference)
}

fn non_empty_id(id: &str, reference: &str) -> ModelResult<String> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') {
        return Err(ModelError::InvalidPlaylist(reference.to_string()));
    }
    Ok(id.to_string())
}

/// Turn a video or track title into a file stem.
///
/// Keeps alphanumeric characters, spaces, `-` and `_`, drops trailing
/// whitespace, then replaces spaces with underscores.
pub fn safe_file_stem(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_youtube_id_success_cases() {
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_youtube_id("https://youtu.be/dQw4w9WgXcQ?t=10").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/watch?list=xyz&v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/embed/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_youtube_id("https://m.youtube.com/shorts/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_extract_youtube_id_errors() {
        assert_eq!(
            extract_youtube_id("https://example.com/watch?v=dQw4w9WgXcQ"),
            Err(ModelError::InvalidYoutubeUrl)
        );
        assert_eq!(
            extract_youtube_id("not a url"),
            Err(ModelError::InvalidYoutubeUrl)
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/watch"),
            Err(ModelError::VideoIdNotFound)
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/watch?v=short"),
            Err(ModelError::InvalidVideoId)
        );
    }

    #[test]
    fn test_watch_url_round_trips_through_extraction() {
        let url = youtube_watch_url("abc123def45");
        assert_eq!(url, "https://www.youtube.com/watch?v=abc123def45");
        assert_eq!(extract_youtube_id(&url).unwrap(), "abc123def45");
    }

    #[test]
    fn test_spotify_playlist_id_forms() {
        assert_eq!(
            spotify_playlist_id(
                "https://open.spotify.com/playlist/6i2Qd6OpeRBAzxfscNXeWp?si=c75919d9d12c434e"
            )
            .unwrap(),
            "6i2Qd6OpeRBAzxfscNXeWp"
        );
        assert_eq!(
            spotify_playlist_id("spotify:playlist:30gaLMEHOtdG9OGWPbCqic").unwrap(),
            "30gaLMEHOtdG9OGWPbCqic"
        );
        assert_eq!(
            spotify_playlist_id(" 4wJLkwU84uscxJ7SOlmUX1 ").unwrap(),
            "4wJLkwU84uscxJ7SOlmUX1"
        );
        assert!(spotify_playlist_id("").is_err());
        assert!(spotify_playlist_id("https://open.spotify.com/album/xyz").is_err());
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Ed Sheeran - Photograph (Official Video)"), "Ed_Sheeran_-_Photograph_Official_Video");
        assert_eq!(safe_file_stem("What's Up?  "), "Whats_Up");
        assert_eq!(safe_file_stem("Café del Mar"), "Café_del_Mar");
        assert_eq!(safe_file_stem("!!!"), "");
    }
}
