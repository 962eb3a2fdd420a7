//! Playlist import step.

use std::path::Path;

use tracing::{info, warn};

use songset_models::TrackRecord;
use songset_sources::PlaylistSource;

use crate::catalog::Catalog;
use crate::error::DatasetResult;

/// Outcome of a playlist import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub playlists_fetched: usize,
    pub playlists_failed: usize,
    pub tracks_fetched: usize,
    /// Rows new to the catalog after deduplication
    pub tracks_added: usize,
}

/// Fetch every playlist in `references`, skipping the ones that fail.
pub async fn fetch_tracks<S>(source: &S, references: &[String]) -> (Vec<TrackRecord>, FetchSummary)
where
    S: PlaylistSource + ?Sized,
{
    let mut tracks = Vec::new();
    let mut summary = FetchSummary::default();

    for reference in references {
        match source.fetch_playlist(reference).await {
            Ok(playlist) => {
                info!(
                    playlist_id = %playlist.id,
                    name = %playlist.name,
                    tracks = playlist.tracks.len(),
                    "Fetched playlist"
                );
                summary.playlists_fetched += 1;
                summary.tracks_fetched += playlist.tracks.len();
                tracks.extend(playlist.tracks);
            }
            Err(e) => {
                warn!(reference = %reference, "Failed to fetch playlist: {}", e);
                summary.playlists_failed += 1;
            }
        }
    }

    (tracks, summary)
}

/// Fetch playlists and merge their tracks into the catalog at `csv_path`.
///
/// The catalog is left untouched when no track was fetched.
pub async fn fetch_playlists<S>(
    source: &S,
    references: &[String],
    csv_path: impl AsRef<Path>,
) -> DatasetResult<FetchSummary>
where
    S: PlaylistSource + ?Sized,
{
    let csv_path = csv_path.as_ref();
    let (tracks, mut summary) = fetch_tracks(source, references).await;

    if tracks.is_empty() {
        warn!("No tracks fetched, catalog not written");
        return Ok(summary);
    }

    let mut catalog = Catalog::load_or_default(csv_path)?;
    summary.tracks_added = catalog.merge(tracks);
    catalog.save(csv_path)?;

    info!(
        path = %csv_path.display(),
        added = summary.tracks_added,
        total = catalog.len(),
        "Updated catalog"
    );
    Ok(summary)
}
