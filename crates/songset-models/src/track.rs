//! Catalog row types.
//!
//! A catalog is a CSV file with one row per track. Column names match the
//! files produced by earlier versions of the pipeline so existing datasets
//! load unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Literal written to the `ViewCount` column when a step failed for a row.
pub const VIEW_COUNT_ERROR: &str = "Error";

/// Release value used when Spotify has no release date for an album.
pub const UNKNOWN_RELEASE: &str = "Unknown";

/// View count of the YouTube video linked to a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViewCount {
    /// No count recorded yet (empty cell).
    #[default]
    Missing,
    /// A known view count.
    Count(u64),
    /// A previous step failed for this row.
    Error,
}

impl ViewCount {
    /// Numeric count, if one is known.
    pub fn count(&self) -> Option<u64> {
        match self {
            ViewCount::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// True when the cell is empty.
    pub fn is_missing(&self) -> bool {
        matches!(self, ViewCount::Missing)
    }
}

impl fmt::Display for ViewCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewCount::Missing => Ok(()),
            ViewCount::Count(n) => write!(f, "{}", n),
            ViewCount::Error => f.write_str(VIEW_COUNT_ERROR),
        }
    }
}

impl FromStr for ViewCount {
    type Err = std::convert::Infallible;

    /// Parse a cell leniently.
    ///
    /// Integers and float-formatted integers (`1234.0`, written by pandas for
    /// columns that contain blanks) become `Count`. Anything unparseable is
    /// treated as missing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(ViewCount::Missing);
        }
        if s.eq_ignore_ascii_case(VIEW_COUNT_ERROR) {
            return Ok(ViewCount::Error);
        }
        if let Ok(n) = s.parse::<u64>() {
            return Ok(ViewCount::Count(n));
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() && f >= 0.0 => Ok(ViewCount::Count(f as u64)),
            _ => Ok(ViewCount::Missing),
        }
    }
}

impl From<String> for ViewCount {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }
}

impl From<ViewCount> for String {
    fn from(value: ViewCount) -> Self {
        value.to_string()
    }
}

impl From<u64> for ViewCount {
    fn from(value: u64) -> Self {
        ViewCount::Count(value)
    }
}

/// Identity of a track within the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackKey {
    pub song_name: String,
    pub artists: String,
}

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Track title as listed on Spotify
    #[serde(rename = "Song_Name")]
    pub song_name: String,
    /// Artist names joined with ", "
    #[serde(rename = "Artists")]
    pub artists: String,
    /// Four-digit release year or "Unknown"
    #[serde(rename = "Release", default)]
    pub release: String,
    /// Watch URL of the most-viewed matching video
    #[serde(rename = "YouTube_Link", default)]
    pub youtube_link: Option<String>,
    /// View count of the linked video
    #[serde(rename = "ViewCount", default)]
    pub view_count: ViewCount,
}

impl TrackRecord {
    /// Create a row with no link or view count yet.
    pub fn new(
        song_name: impl Into<String>,
        artists: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        Self {
            song_name: song_name.into(),
            artists: artists.into(),
            release: release.into(),
            youtube_link: None,
            view_count: ViewCount::Missing,
        }
    }

    /// Builder-style setter for the YouTube link and its view count.
    pub fn with_link(mut self, link: impl Into<String>, views: u64) -> Self {
        self.youtube_link = Some(link.into());
        self.view_count = ViewCount::Count(views);
        self
    }

    /// Identity used for deduplication.
    pub fn key(&self) -> TrackKey {
        TrackKey {
            song_name: self.song_name.trim().to_string(),
            artists: self.artists.trim().to_string(),
        }
    }

    /// Fill empty columns of `self` from `other`, keeping existing values.
    pub fn fill_missing_from(&mut self, other: &TrackRecord) {
        if self.release.trim().is_empty() && !other.release.trim().is_empty() {
            self.release = other.release.clone();
        }
        let has_link = self
            .youtube_link
            .as_deref()
            .is_some_and(|l| !l.trim().is_empty());
        if !has_link && other.youtube_link.is_some() {
            self.youtube_link = other.youtube_link.clone();
        }
        if self.view_count.is_missing() {
            self.view_count = other.view_count;
        }
    }
}
