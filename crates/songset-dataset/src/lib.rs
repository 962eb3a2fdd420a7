//! The songset track catalog and the steps that build it.
//!
//! Each step loads the CSV catalog, updates it, and writes it back:
//!
//! - `fetch`: import Spotify playlists, deduplicating by song and artists
//! - `link`: attach the most-viewed YouTube video and drop low-view rows
//! - `download`: fetch a short MP3 clip per linked row
//! - `prune`: remove low-view rows and their clips
//! - `stats`: summarize view counts

pub mod catalog;
pub mod download;
pub mod error;
pub mod fetch;
pub mod link;
pub mod prune;
pub mod stats;

pub use catalog::{merge_tracks, Catalog, CATALOG_HEADERS, DEFAULT_CATALOG_FILE};
pub use download::{download_catalog, download_clips, ClipDownloader, DownloadSummary, YtDlpDownloader};
pub use error::{DatasetError, DatasetResult};
pub use fetch::{fetch_playlists, fetch_tracks, FetchSummary};
pub use link::{
    link_catalog, recheck_least_viewed, refresh_links, sort_by_views, LinkConfig, LinkSummary,
    DEFAULT_MIN_VIEWS,
};
pub use prune::{find_clip_for_song, is_below_threshold, prune_catalog, PruneSummary, DEFAULT_CLIPS_DIR};
pub use stats::{catalog_stats, least_viewed, CatalogStats, ViewStats, DEFAULT_BOTTOM_N};
