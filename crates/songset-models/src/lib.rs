//! Shared data models for the songset dataset pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Catalog rows (one track per row) and their view counts
//! - Spotify playlist and YouTube video reference parsing
//! - Filesystem-safe names derived from titles

pub mod track;
pub mod utils;

// Re-export common types
pub use track::{TrackKey, TrackRecord, ViewCount};
pub use utils::{
    extract_youtube_id, safe_file_stem, spotify_playlist_id, youtube_watch_url, ModelError,
    ModelResult,
};
