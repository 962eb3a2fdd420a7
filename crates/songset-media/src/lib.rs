#![deny(unreachable_patterns)]
//! Audio processing for the songset dataset pipeline.
//!
//! This crate provides:
//! - Decoded `f32` audio buffers and dBFS loudness measurement
//! - Leading-silence detection with an explicit fallback policy
//! - Type-safe FFmpeg command building with progress parsing
//! - yt-dlp clip download and FFprobe inspection
//! - The trim pipeline that ties decoding, detection and encoding together

pub mod audio;
pub mod codec;
pub mod command;
pub mod download;
pub mod error;
pub mod loudness;
pub mod metrics;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod silence;

pub use audio::AudioBuffer;
pub use codec::{decode_audio, encode_audio, EncodeOptions, DEFAULT_BITRATE, DEFAULT_FILTERS};
pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use download::{
    clip_file_name, download_audio_clip, fetch_video_info, is_rate_limited, ClipWindow,
    DownloadStatus, VideoInfo,
};
pub use error::{MediaError, MediaResult};
pub use loudness::{db_to_amplitude, dbfs, rms};
pub use pipeline::{
    collect_trim_candidates, final_output_path, is_trim_candidate, trim_file, trim_tree,
    TrimJobConfig, TrimOutcome, TrimReport, TrimSummary,
};
pub use probe::{probe_audio, AudioInfo};
pub use progress::{log_progress, FfmpegProgress};
pub use silence::{
    find_audio_start, plan_trim, resolve_threshold, trim_leading, window_levels, FallbackPolicy,
    SilenceConfig, ThresholdMode, TrimPlan,
};
