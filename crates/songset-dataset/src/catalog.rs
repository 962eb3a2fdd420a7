//! The CSV track catalog.
//!
//! Every pipeline step reads the catalog, updates rows, and writes it back.
//! Header names and values are whitespace-trimmed on read; unknown columns
//! are dropped.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use songset_models::{TrackKey, TrackRecord};

use crate::error::{DatasetError, DatasetResult};

/// Column order of a saved catalog.
pub const CATALOG_HEADERS: [&str; 5] = ["Song_Name", "Artists", "Release", "YouTube_Link", "ViewCount"];

/// Default catalog file name.
pub const DEFAULT_CATALOG_FILE: &str = "spotify_playlist_tracks.csv";

/// In-memory catalog, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tracks: Vec<TrackRecord>,
}

impl Catalog {
    pub fn new(tracks: Vec<TrackRecord>) -> Self {
        Self { tracks }
    }

    /// Read a catalog file.
    pub fn load(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetError::CatalogNotFound(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let tracks = reader
            .deserialize::<TrackRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        debug!(path = %path.display(), rows = tracks.len(), "Loaded catalog");
        Ok(Self { tracks })
    }

    /// Read a catalog file, or start empty when it does not exist yet.
    pub fn load_or_default(path: impl AsRef<Path>) -> DatasetResult<Self> {
        match Self::load(path) {
            Err(DatasetError::CatalogNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Write the catalog, replacing `path` only once the new file is complete.
    pub fn save(&self, path: impl AsRef<Path>) -> DatasetResult<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("csv.tmp");

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp_path)?;
            writer.write_record(CATALOG_HEADERS)?;
            for track in &self.tracks {
                writer.serialize(track)?;
            }
            writer.flush()?;
        }

        std::fs::rename(&tmp_path, path)?;
        debug!(path = %path.display(), rows = self.tracks.len(), "Saved catalog");
        Ok(())
    }

    pub fn tracks(&self) -> &[TrackRecord] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut Vec<TrackRecord> {
        &mut self.tracks
    }

    pub fn into_tracks(self) -> Vec<TrackRecord> {
        self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Merge `new` into the catalog. Returns the number of rows added.
    pub fn merge(&mut self, new: Vec<TrackRecord>) -> usize {
        let before = self.tracks.len();
        let existing = std::mem::take(&mut self.tracks);
        self.tracks = merge_tracks(existing, new);
        self.tracks.len().saturating_sub(before)
    }
}

/// Concatenate `existing` and `new`, collapsing rows with the same
/// (song, artists) identity.
///
/// The first occurrence keeps its position; each of its empty columns takes
/// the first non-empty value found in later duplicates. Duplicates within
/// `existing` are collapsed too.
pub fn merge_tracks(existing: Vec<TrackRecord>, new: Vec<TrackRecord>) -> Vec<TrackRecord> {
    let mut merged: Vec<TrackRecord> = Vec::with_capacity(existing.len() + new.len());
    let mut index: HashMap<TrackKey, usize> = HashMap::new();

    for mut track in existing.into_iter().chain(new) {
        let key = track.key();
        match index.get(&key) {
            Some(&i) => merged[i].fill_missing_from(&track),
            None => {
                track.song_name = key.song_name.clone();
                track.artists = key.artists.clone();
                index.insert(key, merged.len());
                merged.push(track);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use songset_models::ViewCount;

    #[test]
    fn test_load_trims_headers_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");
        std::fs::write(
            &path,
            " Song_Name , Artists ,Release,Extra\n  Photograph , Ed Sheeran ,2014,x\n",
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        let track = &catalog.tracks()[0];
        assert_eq!(track.song_name, "Photograph");
        assert_eq!(track.artists, "Ed Sheeran");
        assert_eq!(track.release, "2014");
        assert_eq!(track.youtube_link, None);
        assert_eq!(track.view_count, ViewCount::Missing);
    }

    #[test]
    fn test_save_and_reload_keeps_view_count_variants() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");

        let mut errored = TrackRecord::new("B", "Artist", "Unknown");
        errored.view_count = ViewCount::Error;
        let catalog = Catalog::new(vec![
            TrackRecord::new("A", "Artist", "2001").with_link("https://www.youtube.com/watch?v=dQw4w9WgXcQ", 1_234_567),
            errored,
            TrackRecord::new("C", "Artist, Other", "1999"),
        ]);
        catalog.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Song_Name,Artists,Release,YouTube_Link,ViewCount\n"));
        assert!(text.contains("B,Artist,Unknown,,Error"));
        assert!(text.contains("\"Artist, Other\""));

        assert_eq!(Catalog::load(&path).unwrap(), catalog);
        assert!(!path.with_extension("csv.tmp").exists());
    }

    #[test]
    fn test_pandas_float_counts_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");
        std::fs::write(
            &path,
            "Song_Name,Artists,Release,YouTube_Link,ViewCount\nA,X,2001,,1500000.0\n",
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.tracks()[0].view_count, ViewCount::Count(1_500_000));
    }

    #[test]
    fn test_empty_catalog_still_has_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");
        Catalog::default().save(&path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap().trim_end(),
            "Song_Name,Artists,Release,YouTube_Link,ViewCount"
        );
        assert!(Catalog::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(Catalog::load(&path), Err(DatasetError::CatalogNotFound(_))));
        assert!(Catalog::load_or_default(&path).unwrap().is_empty());
    }

    #[test]
    fn test_merge_keeps_first_and_fills_gaps() {
        let existing = vec![
            TrackRecord::new("Photograph", "Ed Sheeran", ""),
            TrackRecord::new("Yellow", "Coldplay", "2000").with_link("https://www.youtube.com/watch?v=yKNxeF4KMsY", 900),
        ];
        let new = vec![
            TrackRecord::new("Halo", "Beyoncé", "2008"),
            TrackRecord::new(" Photograph ", "Ed Sheeran", "2014")
                .with_link("https://www.youtube.com/watch?v=nSDgHBxUbVQ", 5),
            TrackRecord::new("Yellow", "Coldplay", "1999").with_link("https://www.youtube.com/watch?v=aaaaaaaaaaa", 1),
        ];

        let merged = merge_tracks(existing, new);
        assert_eq!(merged.len(), 3);

        assert_eq!(merged[0].song_name, "Photograph");
        assert_eq!(merged[0].release, "2014");
        assert_eq!(merged[0].view_count, ViewCount::Count(5));

        // Existing values win
        assert_eq!(merged[1].release, "2000");
        assert_eq!(merged[1].view_count, ViewCount::Count(900));
        assert_eq!(
            merged[1].youtube_link.as_deref(),
            Some("https://www.youtube.com/watch?v=yKNxeF4KMsY")
        );

        assert_eq!(merged[2].song_name, "Halo");
    }

    #[test]
    fn test_catalog_merge_counts_added_rows() {
        let mut catalog = Catalog::new(vec![TrackRecord::new("A", "X", "2000")]);
        let added = catalog.merge(vec![
            TrackRecord::new("A", "X", "2000"),
            TrackRecord::new("B", "Y", "2001"),
            TrackRecord::new("B", "Y", "2001"),
        ]);
        assert_eq!(added, 1);
        assert_eq!(catalog.len(), 2);
    }
}
