//! Leading-silence trimming.
//!
//! Clips cut from the middle of a track often start with a stretch of
//! silence or near-silence. This module finds where the audio actually
//! begins and decides what to do with the clip.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ AudioBuffer  │───►│ Detector     │───►│ Planner      │
//! │ (f32 PCM)    │    │ (dBFS/window)│    │ (Trim/Fallbk)│
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use songset_media::silence::{find_audio_start, trim_leading};
//!
//! if let Some(offset_ms) = find_audio_start(&buffer, -50.0, 50)? {
//!     let trimmed = trim_leading(&buffer, offset_ms);
//! }
//! ```

mod config;
mod detector;
mod plan;

pub use config::{FallbackPolicy, SilenceConfig, ThresholdMode};
pub use detector::{find_audio_start, trim_leading, window_levels};
pub use plan::{plan_trim, resolve_threshold, TrimPlan};
