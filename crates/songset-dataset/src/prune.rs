//! Low-view pruning step.
//!
//! Removes catalog rows whose view count is below a threshold together with
//! their downloaded clip. Rows without a usable count are kept.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use songset_models::{safe_file_stem, TrackRecord};

use crate::catalog::Catalog;
use crate::error::DatasetResult;

/// Default folder holding downloaded clips.
pub const DEFAULT_CLIPS_DIR: &str = "music_collection";

/// Counts from a prune run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub rows_removed: usize,
    pub files_deleted: usize,
    pub files_not_found: usize,
}

/// Clip file names in `clips_dir`, sorted. A missing folder has no clips.
fn clip_names(clips_dir: &Path) -> DatasetResult<Vec<String>> {
    if !clips_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(clips_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// First `.mp3` in `names` whose lowercase name contains the lowercase
/// file stem of `song_name`.
pub fn find_clip_for_song<'a>(names: &'a [String], song_name: &str) -> Option<&'a str> {
    let stem = safe_file_stem(song_name).to_lowercase();
    if stem.is_empty() {
        return None;
    }
    names
        .iter()
        .map(String::as_str)
        .find(|name| name.ends_with(".mp3") && name.to_lowercase().contains(&stem))
}

/// True when `track` has a valid count below `min_views`.
pub fn is_below_threshold(track: &TrackRecord, min_views: u64) -> bool {
    track.view_count.count().is_some_and(|views| views < min_views)
}

/// Remove rows below `min_views` and delete their clips from `clips_dir`.
///
/// The catalog is rewritten only when a row was removed.
pub fn prune_catalog(
    csv_path: impl AsRef<Path>,
    clips_dir: impl AsRef<Path>,
    min_views: u64,
) -> DatasetResult<PruneSummary> {
    let csv_path = csv_path.as_ref();
    let clips_dir = clips_dir.as_ref();

    let catalog = Catalog::load(csv_path)?;
    let mut names = clip_names(clips_dir)?;
    let mut summary = PruneSummary::default();
    let mut kept = Vec::with_capacity(catalog.len());

    for track in catalog.into_tracks() {
        if !is_below_threshold(&track, min_views) {
            kept.push(track);
            continue;
        }

        let views = track.view_count.count().unwrap_or_default();
        let mut deleted = false;
        if let Some(name) = find_clip_for_song(&names, &track.song_name).map(str::to_string) {
            let path: PathBuf = clips_dir.join(&name);
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(file = %name, views, "Deleted clip");
                    names.retain(|n| n != &name);
                    summary.files_deleted += 1;
                    deleted = true;
                }
                Err(e) => warn!(file = %name, "Failed to delete clip: {}", e),
            }
        }
        if !deleted {
            info!(song = %track.song_name, views, "Clip not found");
            summary.files_not_found += 1;
        }
        summary.rows_removed += 1;
    }

    if summary.rows_removed > 0 {
        Catalog::new(kept).save(csv_path)?;
        info!(
            removed = summary.rows_removed,
            deleted = summary.files_deleted,
            not_found = summary.files_not_found,
            "Pruned catalog"
        );
    } else {
        info!(min_views, "No rows below view threshold");
    }

    Ok(summary)
}
