//! Audio clip download using yt-dlp.
//!
//! Only a short section of each track is fetched (`--download-sections`)
//! and extracted straight to MP3.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

use songset_models::safe_file_stem;

use crate::command::check_ytdlp;
use crate::error::{MediaError, MediaResult};

/// Metadata yt-dlp reports for a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub view_count: Option<u64>,
}

/// Section of the source to download, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipWindow {
    pub start_secs: u32,
    pub end_secs: u32,
}

impl Default for ClipWindow {
    fn default() -> Self {
        Self {
            start_secs: 20,
            end_secs: 45,
        }
    }
}

impl ClipWindow {
    /// Create a window, rejecting empty or inverted ranges.
    pub fn new(start_secs: u32, end_secs: u32) -> MediaResult<Self> {
        if end_secs <= start_secs {
            return Err(MediaError::invalid_input(format!(
                "clip end ({}s) must be after start ({}s)",
                end_secs, start_secs
            )));
        }
        Ok(Self {
            start_secs,
            end_secs,
        })
    }

    /// yt-dlp `--download-sections` argument.
    pub fn section_arg(&self) -> String {
        format!("*{}-{}", self.start_secs, self.end_secs)
    }

    pub fn duration_secs(&self) -> u32 {
        self.end_secs.saturating_sub(self.start_secs)
    }
}

/// Result of a clip download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloaded,
    /// The output already existed; nothing was fetched.
    AlreadyExists,
}

/// File name for a clip of a video titled `title`.
///
/// Falls back to `fallback` when the title sanitizes to nothing.
pub fn clip_file_name(title: &str, fallback: &str) -> String {
    let stem = safe_file_stem(title);
    if stem.is_empty() {
        format!("{}.mp3", fallback)
    } else {
        format!("{}.mp3", stem)
    }
}

/// Detect YouTube throttling in yt-dlp's stderr.
pub fn is_rate_limited(stderr: &str) -> bool {
    stderr.contains("429")
        || stderr.contains("Too Many Requests")
        || stderr.contains("rate limit")
        || stderr.contains("Sign in to confirm")
}

/// Fetch video metadata without downloading anything.
pub async fn fetch_video_info(url: &str) -> MediaResult<VideoInfo> {
    check_ytdlp()?;

    debug!(url = url, "Fetching video info");

    let output = Command::new("yt-dlp")
        .args(["-J", "--skip-download", "--no-warnings", "--no-playlist"])
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(yt_dlp_failure(url, &stderr));
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

/// Download `window` of `url` as an MP3 at `output_path`.
///
/// An existing file at `output_path` is kept and nothing is downloaded.
pub async fn download_audio_clip(
    url: &str,
    window: ClipWindow,
    output_path: impl AsRef<Path>,
) -> MediaResult<DownloadStatus> {
    let output_path = output_path.as_ref();

    if output_path.exists() {
        info!("Using existing clip: {}", output_path.display());
        return Ok(DownloadStatus::AlreadyExists);
    }

    check_ytdlp()?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let template = output_template(output_path);

    info!(
        url = url,
        start = window.start_secs,
        end = window.end_secs,
        output = %output_path.display(),
        "Downloading audio clip"
    );

    let output = Command::new("yt-dlp")
        .args([
            "--quiet",
            "--no-warnings",
            "--no-playlist",
            "-f",
            "bestaudio/best",
            "--download-sections",
        ])
        .arg(window.section_arg())
        .args([
            "--force-keyframes-at-cuts",
            "-x",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "192K",
            "-o",
        ])
        .arg(&template)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(yt_dlp_failure(url, &stderr));
    }

    if !output_path.exists() {
        return Err(MediaError::download_failed("Output file not created"));
    }

    let file_size = output_path.metadata()?.len();
    info!(
        output = %output_path.display(),
        size_kb = file_size / 1024,
        "Downloaded clip successfully"
    );

    Ok(DownloadStatus::Downloaded)
}

/// yt-dlp output template that lands on `output_path` after MP3 extraction.
fn output_template(output_path: &Path) -> PathBuf {
    output_path.with_extension("%(ext)s")
}

fn yt_dlp_failure(url: &str, stderr: &str) -> MediaError {
    debug!("yt-dlp stderr: {}", stderr);

    if is_rate_limited(stderr) {
        warn!(url = %url, "YouTube rate limit detected");
    }

    let error_msg = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("Unknown error");
    MediaError::download_failed(format!("yt-dlp failed: {}", error_msg))
}
