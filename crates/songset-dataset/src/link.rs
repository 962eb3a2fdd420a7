//! YouTube link step.
//!
//! Runs in two phases over the catalog:
//!
//! 1. Refresh: search every row and record the most-viewed match. The
//!    catalog is saved once this phase ends.
//! 2. Recheck: sort by view count (rows without a count last), search the
//!    `recheck_limit` least-viewed rows again, and drop the ones that fall
//!    below `min_views`, have no match, or fail to look up.

use std::cmp::Ordering;
use std::path::Path;
use std::time::Duration;

use tracing::{info, info_span, warn, Instrument};

use songset_models::{TrackRecord, ViewCount};
use songset_sources::VideoSearch;

use crate::catalog::Catalog;
use crate::error::DatasetResult;

/// Default minimum view count for a track to stay in the catalog.
pub const DEFAULT_MIN_VIEWS: u64 = 1_000_000;

/// Configuration for the link step.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Number of least-viewed rows searched again in the recheck phase
    pub recheck_limit: usize,
    /// Rows rechecked below this count are removed
    pub min_views: u64,
    /// Pause between consecutive API lookups
    pub delay: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            recheck_limit: 100,
            min_views: DEFAULT_MIN_VIEWS,
            delay: Duration::from_secs(1),
        }
    }
}

impl LinkConfig {
    pub fn with_recheck_limit(mut self, limit: usize) -> Self {
        self.recheck_limit = limit;
        self
    }

    pub fn with_min_views(mut self, min_views: u64) -> Self {
        self.min_views = min_views;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Counts from a link run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSummary {
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
    pub rechecked: usize,
    pub removed: usize,
}

async fn pause(delay: Duration, first: bool) {
    if !first && !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Phase 1: search every row and update its link and count when a match is found.
pub async fn refresh_links<S>(search: &S, tracks: &mut [TrackRecord], config: &LinkConfig) -> LinkSummary
where
    S: VideoSearch + ?Sized,
{
    let mut summary = LinkSummary::default();
    let total = tracks.len();

    for (i, track) in tracks.iter_mut().enumerate() {
        pause(config.delay, i == 0).await;

        match search.search_most_viewed(&track.song_name, &track.artists).await {
            Ok(Some(found)) => {
                let previous = track.view_count.count();
                info!(
                    row = i + 1,
                    total,
                    song = %track.song_name,
                    views = found.view_count,
                    previous = ?previous,
                    "Linked video"
                );
                track.youtube_link = Some(found.url);
                track.view_count = ViewCount::Count(found.view_count);
                summary.found += 1;
            }
            Ok(None) => {
                info!(row = i + 1, total, song = %track.song_name, "No video found");
                summary.not_found += 1;
            }
            Err(e) => {
                warn!(row = i + 1, total, song = %track.song_name, "Lookup failed: {}", e);
                summary.failed += 1;
            }
        }
    }

    summary
}

fn view_order(a: &TrackRecord, b: &TrackRecord) -> Ordering {
    match (a.view_count.count(), b.view_count.count()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by view count ascending, rows without a count last.
pub fn sort_by_views(tracks: &mut [TrackRecord]) {
    tracks.sort_by(view_order);
}

/// Phase 2: sort, recheck the least-viewed rows and drop the ones that no
/// longer qualify. Returns the remaining rows in sorted order and the number
/// of rows rechecked.
pub async fn recheck_least_viewed<S>(
    search: &S,
    mut tracks: Vec<TrackRecord>,
    config: &LinkConfig,
) -> (Vec<TrackRecord>, usize)
where
    S: VideoSearch + ?Sized,
{
    sort_by_views(&mut tracks);

    let limit = config.recheck_limit.min(tracks.len());
    let mut keep = vec![true; tracks.len()];

    for (i, track) in tracks.iter_mut().take(limit).enumerate() {
        pause(config.delay, i == 0).await;

        match search.search_most_viewed(&track.song_name, &track.artists).await {
            Ok(Some(found)) if found.view_count < config.min_views => {
                info!(
                    song = %track.song_name,
                    views = found.view_count,
                    min_views = config.min_views,
                    "Below view threshold, removing"
                );
                keep[i] = false;
            }
            Ok(Some(found)) => {
                track.youtube_link = Some(found.url);
                track.view_count = ViewCount::Count(found.view_count);
            }
            Ok(None) => {
                info!(song = %track.song_name, "No video found, removing");
                keep[i] = false;
            }
            Err(e) => {
                warn!(song = %track.song_name, "Recheck failed, removing: {}", e);
                keep[i] = false;
            }
        }
    }

    let mut flags = keep.into_iter();
    tracks.retain(|_| flags.next().unwrap_or(true));
    (tracks, limit)
}

/// Run both phases against the catalog at `csv_path`.
pub async fn link_catalog<S>(
    search: &S,
    csv_path: impl AsRef<Path>,
    config: &LinkConfig,
) -> DatasetResult<LinkSummary>
where
    S: VideoSearch + ?Sized,
{
    let csv_path = csv_path.as_ref();
    let mut catalog = Catalog::load(csv_path)?;
    let with_counts = catalog
        .tracks()
        .iter()
        .filter(|t| t.view_count.count().is_some())
        .count();
    info!(
        total = catalog.len(),
        with_counts,
        without_counts = catalog.len() - with_counts,
        "Loaded catalog for linking"
    );

    let mut summary = refresh_links(search, catalog.tracks_mut(), config)
        .instrument(info_span!("refresh_links"))
        .await;
    catalog.save(csv_path)?;

    let before = catalog.len();
    let (remaining, rechecked) = recheck_least_viewed(search, catalog.into_tracks(), config)
        .instrument(info_span!("recheck_least_viewed", limit = config.recheck_limit))
        .await;
    summary.rechecked = rechecked;
    summary.removed = before - remaining.len();

    let catalog = Catalog::new(remaining);
    catalog.save(csv_path)?;

    info!(
        found = summary.found,
        removed = summary.removed,
        remaining = catalog.len(),
        "Link step complete"
    );
    Ok(summary)
}
