//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Progress information from FFmpeg's `-progress` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Calculate progress percentage given total duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).min(100.0)
    }

    /// Apply one `key=value` line. Returns a snapshot at each block boundary
    /// (the `progress=` line).
    pub fn apply_line(&mut self, line: &str) -> Option<FfmpegProgress> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            "out_time_us" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            // Despite the name, FFmpeg reports microseconds here too
            "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "out_time" => self.out_time = value.to_string(),
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                if value == "end" {
                    self.is_complete = true;
                }
                return Some(self.clone());
            }
            _ => {}
        }
        None
    }
}

/// Progress callback that logs each block at debug level.
///
/// `total_duration_ms` is the expected output length, used for the percentage.
pub fn log_progress(stage: &'static str, total_duration_ms: i64) -> impl Fn(FfmpegProgress) + Send + 'static {
    move |progress| {
        debug!(
            stage,
            out_time_ms = progress.out_time_ms,
            speed = progress.speed,
            percent = progress.percentage(total_duration_ms),
            complete = progress.is_complete,
            "FFmpeg progress"
        );
    }
}

/// True when a stderr line belongs to the `-progress` stream rather than to
/// FFmpeg's own diagnostics.
pub(crate) fn is_progress_line(line: &str) -> bool {
    const KEYS: &[&str] = &[
        "bitrate",
        "total_size",
        "out_time_us",
        "out_time_ms",
        "out_time",
        "dup_frames",
        "drop_frames",
        "speed",
        "progress",
        "frame",
        "fps",
    ];
    line.split_once('=')
        .map(|(key, _)| KEYS.contains(&key.trim()) || key.starts_with("stream_"))
        .unwrap_or(false)
}
