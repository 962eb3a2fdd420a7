//! Clip download step.
//!
//! For each linked row: read the video's metadata, store its view count, and
//! download a short MP3 clip named after the video title. A failed row gets
//! `ViewCount = Error` and the loop moves on. The catalog is saved at the end.

use std::path::Path;

use async_trait::async_trait;
use tracing::{info, info_span, warn, Instrument};

use songset_media::metrics::record_download;
use songset_media::{
    clip_file_name, download_audio_clip, fetch_video_info, ClipWindow, DownloadStatus, MediaResult,
    VideoInfo,
};
use songset_models::{extract_youtube_id, youtube_watch_url, TrackRecord, ViewCount};

use crate::catalog::Catalog;
use crate::error::DatasetResult;

/// Fetches metadata and audio clips for a video URL.
#[async_trait]
pub trait ClipDownloader: Send + Sync {
    async fn video_info(&self, url: &str) -> MediaResult<VideoInfo>;

    async fn download_clip(&self, url: &str, window: ClipWindow, output: &Path) -> MediaResult<DownloadStatus>;
}

/// [`ClipDownloader`] backed by the `yt-dlp` executable.
#[derive(Debug, Clone, Copy, Default)]
pub struct YtDlpDownloader;

#[async_trait]
impl ClipDownloader for YtDlpDownloader {
    async fn video_info(&self, url: &str) -> MediaResult<VideoInfo> {
        fetch_video_info(url).await
    }

    async fn download_clip(&self, url: &str, window: ClipWindow, output: &Path) -> MediaResult<DownloadStatus> {
        download_audio_clip(url, window, output).await
    }
}

/// Counts from a download run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub already_present: usize,
    /// Rows without a YouTube link
    pub skipped: usize,
    /// Rows whose link is not a YouTube video URL
    pub invalid_links: usize,
    pub failed: usize,
}

async fn download_row<D>(
    downloader: &D,
    track: &mut TrackRecord,
    index: usize,
    url: &str,
    clips_dir: &Path,
    window: ClipWindow,
) -> MediaResult<DownloadStatus>
where
    D: ClipDownloader + ?Sized,
{
    let info = downloader.video_info(url).await?;
    let views = info.view_count.unwrap_or(0);
    track.view_count = ViewCount::Count(views);

    let file_name = clip_file_name(&info.title, &format!("video_{}", index));
    let output = clips_dir.join(&file_name);
    if output.exists() {
        info!(file = %file_name, views, "Clip already exists");
        return Ok(DownloadStatus::AlreadyExists);
    }

    let status = downloader.download_clip(url, window, &output).await?;
    info!(file = %file_name, views, "Downloaded clip");
    Ok(status)
}

/// Download a clip for every linked row of `tracks` into `clips_dir`.
pub async fn download_clips<D>(
    downloader: &D,
    tracks: &mut [TrackRecord],
    clips_dir: &Path,
    window: ClipWindow,
) -> DatasetResult<DownloadSummary>
where
    D: ClipDownloader + ?Sized,
{
    tokio::fs::create_dir_all(clips_dir).await?;
    let mut summary = DownloadSummary::default();

    for (index, track) in tracks.iter_mut().enumerate() {
        let Some(link) = track
            .youtube_link
            .clone()
            .filter(|link| !link.trim().is_empty())
        else {
            summary.skipped += 1;
            continue;
        };
        let url = match extract_youtube_id(&link) {
            Ok(video_id) => youtube_watch_url(&video_id),
            Err(e) => {
                warn!(song = %track.song_name, link = %link, "Skipping link: {}", e);
                record_download("invalid_link");
                summary.invalid_links += 1;
                continue;
            }
        };

        let span = info_span!("download_row", index, song = %track.song_name);
        match download_row(downloader, track, index, &url, clips_dir, window)
            .instrument(span)
            .await
        {
            Ok(DownloadStatus::Downloaded) => {
                record_download("downloaded");
                summary.downloaded += 1;
            }
            Ok(DownloadStatus::AlreadyExists) => {
                record_download("exists");
                summary.already_present += 1;
            }
            Err(e) => {
                warn!(url = %url, "Failed to process video: {}", e);
                record_download("failed");
                track.view_count = ViewCount::Error;
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Run the download step against the catalog at `csv_path`.
pub async fn download_catalog<D>(
    downloader: &D,
    csv_path: impl AsRef<Path>,
    clips_dir: impl AsRef<Path>,
    window: ClipWindow,
) -> DatasetResult<DownloadSummary>
where
    D: ClipDownloader + ?Sized,
{
    let csv_path = csv_path.as_ref();
    let clips_dir = clips_dir.as_ref();

    let mut catalog = Catalog::load(csv_path)?;
    let summary = download_clips(downloader, catalog.tracks_mut(), clips_dir, window).await?;
    catalog.save(csv_path)?;

    info!(
        downloaded = summary.downloaded,
        already_present = summary.already_present,
        skipped = summary.skipped,
        invalid_links = summary.invalid_links,
        failed = summary.failed,
        clips_dir = %clips_dir.display(),
        "Download step complete"
    );
    Ok(summary)
}
