//! Catalog view-count statistics.

use std::fmt;
use std::path::Path;

use songset_models::TrackRecord;

use crate::catalog::Catalog;
use crate::error::DatasetResult;

/// Default number of least-viewed rows listed in a report.
pub const DEFAULT_BOTTOM_N: usize = 10;

/// Summary of a set of view counts.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined for a single value
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Quantile of sorted `values` with linear interpolation between ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl ViewStats {
    /// Summarize `counts`. Returns `None` when there is nothing to summarize.
    pub fn describe(counts: &[u64]) -> Option<Self> {
        if counts.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = (n > 1).then(|| {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        });

        Some(Self {
            count: n,
            mean,
            std,
            min: sorted[0],
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.5),
            p75: quantile(&sorted, 0.75),
            max: sorted[n - 1],
        })
    }
}

/// The `n` least-viewed rows with a count, plus every row tied with the last.
pub fn least_viewed(tracks: &[TrackRecord], n: usize) -> Vec<TrackRecord> {
    let mut counted: Vec<(u64, &TrackRecord)> = tracks
        .iter()
        .filter_map(|t| t.view_count.count().map(|c| (c, t)))
        .collect();
    counted.sort_by_key(|(c, _)| *c);

    if n == 0 || counted.is_empty() {
        return Vec::new();
    }
    let cutoff = counted[n.min(counted.len()) - 1].0;
    counted
        .into_iter()
        .take_while(|(c, _)| *c <= cutoff)
        .map(|(_, t)| t.clone())
        .collect()
}

/// Report printed by the `stats` command.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStats {
    pub total: usize,
    pub with_counts: usize,
    pub without_counts: usize,
    pub views: Option<ViewStats>,
    pub least_viewed: Vec<TrackRecord>,
}

impl CatalogStats {
    pub fn from_tracks(tracks: &[TrackRecord], bottom_n: usize) -> Self {
        let counts: Vec<u64> = tracks.iter().filter_map(|t| t.view_count.count()).collect();
        Self {
            total: tracks.len(),
            with_counts: counts.len(),
            without_counts: tracks.len() - counts.len(),
            views: ViewStats::describe(&counts),
            least_viewed: least_viewed(tracks, bottom_n),
        }
    }
}

/// Load the catalog at `csv_path` and summarize it.
pub fn catalog_stats(csv_path: impl AsRef<Path>, bottom_n: usize) -> DatasetResult<CatalogStats> {
    let catalog = Catalog::load(csv_path)?;
    Ok(CatalogStats::from_tracks(catalog.tracks(), bottom_n))
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total songs: {}", self.total)?;
        writeln!(f, "Songs with view counts: {}", self.with_counts)?;
        writeln!(f, "Songs without view counts: {}", self.without_counts)?;

        writeln!(f)?;
        writeln!(f, "View count stats:")?;
        match &self.views {
            Some(s) => {
                writeln!(f, "count {:>16}", s.count)?;
                writeln!(f, "mean  {:>16.1}", s.mean)?;
                match s.std {
                    Some(std) => writeln!(f, "std   {:>16.1}", std)?,
                    None => writeln!(f, "std   {:>16}", "NaN")?,
                }
                writeln!(f, "min   {:>16.1}", s.min)?;
                writeln!(f, "25%   {:>16.1}", s.p25)?;
                writeln!(f, "50%   {:>16.1}", s.p50)?;
                writeln!(f, "75%   {:>16.1}", s.p75)?;
                writeln!(f, "max   {:>16.1}", s.max)?;
            }
            None => writeln!(f, "count {:>16}", 0)?,
        }

        writeln!(f)?;
        writeln!(f, "Bottom songs by view count:")?;
        for track in &self.least_viewed {
            writeln!(f, "{:>14}  {} - {}", track.view_count.to_string(), track.song_name, track.artists)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songset_models::ViewCount;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_describe() {
        let stats = ViewStats::describe(&[1, 2, 3, 4]).unwrap();
        assert_eq!(stats.count, 4);
        assert!(approx(stats.mean, 2.5));
        assert!(approx(stats.std.unwrap(), (5.0f64 / 3.0).sqrt()));
        assert!(approx(stats.min, 1.0));
        assert!(approx(stats.p25, 1.75));
        assert!(approx(stats.p50, 2.5));
        assert!(approx(stats.p75, 3.25));
        assert!(approx(stats.max, 4.0));
    }

    #[test]
    fn test_describe_edge_cases() {
        assert_eq!(ViewStats::describe(&[]), None);

        let single = ViewStats::describe(&[7]).unwrap();
        assert_eq!(single.std, None);
        assert!(approx(single.p25, 7.0));
        assert!(approx(single.max, 7.0));
    }

    #[test]
    fn test_least_viewed_keeps_ties() {
        let tracks = vec![
            TrackRecord::new("a", "x", "").with_link("u", 30),
            TrackRecord::new("b", "x", "").with_link("u", 10),
            TrackRecord::new("c", "x", ""),
            TrackRecord::new("d", "x", "").with_link("u", 20),
            TrackRecord::new("e", "x", "").with_link("u", 20),
        ];

        let names = |rows: Vec<TrackRecord>| rows.into_iter().map(|t| t.song_name).collect::<Vec<_>>();
        assert_eq!(names(least_viewed(&tracks, 2)), vec!["b", "d", "e"]);
        assert_eq!(names(least_viewed(&tracks, 1)), vec!["b"]);
        assert_eq!(names(least_viewed(&tracks, 10)), vec!["b", "d", "e", "a"]);
        assert!(least_viewed(&tracks, 0).is_empty());
    }

    #[test]
    fn test_catalog_stats_report() {
        let mut errored = TrackRecord::new("err", "x", "");
        errored.view_count = ViewCount::Error;
        let tracks = vec![
            TrackRecord::new("Yellow", "Coldplay", "").with_link("u", 100),
            TrackRecord::new("Creep", "Radiohead", "").with_link("u", 300),
            errored,
        ];

        let stats = CatalogStats::from_tracks(&tracks, 1);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.with_counts, 2);
        assert_eq!(stats.without_counts, 1);
        assert!(approx(stats.views.as_ref().unwrap().mean, 200.0));

        let report = stats.to_string();
        assert!(report.contains("Total songs: 3"));
        assert!(report.contains("Yellow - Coldplay"));
        assert!(!report.contains("Creep - Radiohead"));
    }
}
