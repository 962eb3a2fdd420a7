//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Args, Parser, Subcommand};

use songset_dataset::{LinkConfig, DEFAULT_BOTTOM_N, DEFAULT_CATALOG_FILE, DEFAULT_CLIPS_DIR, DEFAULT_MIN_VIEWS};
use songset_media::{
    ClipWindow, EncodeOptions, FallbackPolicy, MediaResult, SilenceConfig, TrimJobConfig,
    DEFAULT_BITRATE,
};

/// Build and clean a dataset of short music clips
#[derive(Parser, Debug)]
#[command(name = "songset", version, about)]
pub struct Cli {
    /// Track catalog CSV
    #[arg(long, global = true, env = "SONGSET_CSV", default_value = DEFAULT_CATALOG_FILE)]
    pub csv: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import Spotify playlists into the catalog
    Fetch {
        /// Playlist IDs or open.spotify.com URLs
        #[arg(long = "playlist", required = true, num_args = 1..)]
        playlists: Vec<String>,
    },

    /// Attach YouTube links and drop low-view tracks
    Link {
        /// Least-viewed rows to search again
        #[arg(long, default_value_t = 100)]
        recheck_limit: usize,

        /// Minimum view count to keep a rechecked row
        #[arg(long, default_value_t = DEFAULT_MIN_VIEWS)]
        min_views: u64,

        /// Pause between API lookups in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },

    /// Remove low-view rows and their clips
    Prune {
        #[arg(long, env = "SONGSET_CLIPS_DIR", default_value = DEFAULT_CLIPS_DIR)]
        clips_dir: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MIN_VIEWS)]
        min_views: u64,
    },

    /// Download a short MP3 clip for every linked row
    Download {
        #[arg(long, env = "SONGSET_CLIPS_DIR", default_value = DEFAULT_CLIPS_DIR)]
        clips_dir: PathBuf,

        /// Clip start in seconds
        #[arg(long, default_value_t = 20)]
        start: u32,

        /// Clip end in seconds
        #[arg(long, default_value_t = 45)]
        end: u32,
    },

    /// Trim leading silence from clips
    Trim(TrimArgs),

    /// Print view-count statistics
    Stats {
        /// Number of least-viewed rows to list
        #[arg(long, default_value_t = DEFAULT_BOTTOM_N)]
        bottom: usize,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["file", "root"])))]
pub struct TrimArgs {
    /// Single MP3 to trim
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Directory searched recursively for MP3s
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Absolute threshold in dBFS
    #[arg(long, allow_hyphen_values = true, conflicts_with = "relative_db")]
    pub threshold_db: Option<f32>,

    /// Threshold relative to the clip's overall loudness, in dB
    #[arg(long, allow_hyphen_values = true)]
    pub relative_db: Option<f32>,

    /// Analysis window in milliseconds
    #[arg(long)]
    pub window_ms: Option<u32>,

    /// What to do when no audio is found: placeholder, delete or no-op
    #[arg(long)]
    pub fallback: Option<FallbackPolicy>,

    /// Length of the silent placeholder in milliseconds
    #[arg(long)]
    pub placeholder_ms: Option<u32>,

    #[arg(long, default_value = DEFAULT_BITRATE)]
    pub bitrate: String,

    /// FFmpeg audio filter chain; empty disables filtering
    #[arg(long)]
    pub filters: Option<String>,
}

impl TrimArgs {
    /// Build a validated job config; unset options keep their defaults.
    pub fn job_config(&self) -> MediaResult<TrimJobConfig> {
        let mut silence = SilenceConfig::default();
        if let Some(db) = self.threshold_db {
            silence = silence.with_threshold_db(db);
        }
        if let Some(db) = self.relative_db {
            silence = silence.with_relative_threshold_db(db);
        }
        if let Some(ms) = self.window_ms {
            silence = silence.with_window_ms(ms);
        }
        if let Some(fallback) = self.fallback {
            silence = silence.with_fallback(fallback);
        }
        if let Some(ms) = self.placeholder_ms {
            silence = silence.with_placeholder_ms(ms);
        }
        silence.validate()?;

        let mut encode = EncodeOptions::default().with_bitrate(&self.bitrate);
        if let Some(filters) = &self.filters {
            encode = encode.with_filters(filters);
        }

        Ok(TrimJobConfig { silence, encode })
    }
}

/// Link step settings from `link` arguments.
pub fn link_config(recheck_limit: usize, min_views: u64, delay_ms: u64) -> LinkConfig {
    LinkConfig::default()
        .with_recheck_limit(recheck_limit)
        .with_min_views(min_views)
        .with_delay(Duration::from_millis(delay_ms))
}

/// Clip window from `download` arguments.
pub fn clip_window(start: u32, end: u32) -> MediaResult<ClipWindow> {
    ClipWindow::new(start, end)
}
