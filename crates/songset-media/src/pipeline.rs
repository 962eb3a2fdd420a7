//! Trim pipeline: decode, detect, trim or fall back, re-encode.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::AudioBuffer;
use crate::codec::{decode_audio, encode_audio, EncodeOptions};
use crate::error::{MediaError, MediaResult};
use crate::metrics::record_trim;
use crate::silence::{plan_trim, trim_leading, FallbackPolicy, SilenceConfig, TrimPlan};

/// Suffix appended to the stem of every processed clip.
pub const FINAL_SUFFIX: &str = "_final";

/// Settings for one trim run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrimJobConfig {
    pub silence: SilenceConfig,
    pub encode: EncodeOptions,
}

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrimOutcome {
    /// Audio found; everything before `offset_ms` was dropped (0 = unchanged).
    Trimmed { offset_ms: u64 },
    /// Audio never reached the threshold; a silent placeholder was written.
    Placeholder { duration_ms: u32 },
    /// Audio never reached the threshold; the source was deleted.
    Deleted,
    /// Audio never reached the threshold; nothing was written.
    Skipped,
}

impl TrimOutcome {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TrimOutcome::Trimmed { offset_ms: 0 } => "unchanged",
            TrimOutcome::Trimmed { .. } => "trimmed",
            TrimOutcome::Placeholder { .. } => "placeholder",
            TrimOutcome::Deleted => "deleted",
            TrimOutcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TrimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrimOutcome::Trimmed { offset_ms } => write!(f, "trimmed {} ms", offset_ms),
            TrimOutcome::Placeholder { duration_ms } => {
                write!(f, "replaced with {} ms placeholder", duration_ms)
            }
            TrimOutcome::Deleted => f.write_str("deleted"),
            TrimOutcome::Skipped => f.write_str("skipped"),
        }
    }
}

/// Result of trimming one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimReport {
    pub input: PathBuf,
    /// Encoded output, when one was written.
    pub output: Option<PathBuf>,
    pub outcome: TrimOutcome,
}

/// Counts for a directory run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrimSummary {
    pub trimmed: usize,
    pub unchanged: usize,
    pub placeholders: usize,
    pub deleted: usize,
    pub skipped: usize,
    /// Files that failed, with the error message.
    pub failures: Vec<(PathBuf, String)>,
}

impl TrimSummary {
    fn record(&mut self, outcome: TrimOutcome) {
        match outcome {
            TrimOutcome::Trimmed { offset_ms: 0 } => self.unchanged += 1,
            TrimOutcome::Trimmed { .. } => self.trimmed += 1,
            TrimOutcome::Placeholder { .. } => self.placeholders += 1,
            TrimOutcome::Deleted => self.deleted += 1,
            TrimOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Number of files processed, failures included.
    pub fn total(&self) -> usize {
        self.trimmed
            + self.unchanged
            + self.placeholders
            + self.deleted
            + self.skipped
            + self.failures.len()
    }
}

/// What to do on disk for a plan.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Write(AudioBuffer, TrimOutcome),
    DeleteSource,
    Nothing,
}

fn resolve_action(buffer: &AudioBuffer, plan: TrimPlan, config: &SilenceConfig) -> MediaResult<Action> {
    let action = match plan {
        TrimPlan::Trim { offset_ms } => Action::Write(
            trim_leading(buffer, offset_ms),
            TrimOutcome::Trimmed { offset_ms },
        ),
        TrimPlan::Fallback(FallbackPolicy::Placeholder) => Action::Write(
            AudioBuffer::silent(config.placeholder_ms, buffer.sample_rate(), buffer.channels())?,
            TrimOutcome::Placeholder {
                duration_ms: config.placeholder_ms,
            },
        ),
        TrimPlan::Fallback(FallbackPolicy::Delete) => Action::DeleteSource,
        TrimPlan::Fallback(FallbackPolicy::NoOp) => Action::Nothing,
    };
    Ok(action)
}

/// `<stem>_final.mp3` next to `input`.
pub fn final_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}.mp3", stem, FINAL_SUFFIX))
}

/// True for `.mp3` files that are not outputs of a previous run.
pub fn is_trim_candidate(path: &Path) -> bool {
    let is_mp3 = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("mp3"))
        .unwrap_or(false);
    let is_output = path
        .file_stem()
        .map(|s| s.to_string_lossy().ends_with(FINAL_SUFFIX))
        .unwrap_or(false);
    is_mp3 && !is_output
}

/// Remove the `_final.mp3` an earlier run left for `input`, if any.
async fn remove_stale_output(input: &Path) -> MediaResult<bool> {
    let output = final_output_path(input);
    match tokio::fs::remove_file(&output).await {
        Ok(()) => {
            debug!(output = %output.display(), "Removed stale output");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Trim the leading silence of one file.
pub async fn trim_file(input: impl AsRef<Path>, config: &TrimJobConfig) -> MediaResult<TrimReport> {
    let input = input.as_ref();
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    config.silence.validate()?;

    let buffer = decode_audio(input).await?;
    let plan = plan_trim(&buffer, &config.silence)?;

    let (output, outcome) = match resolve_action(&buffer, plan, &config.silence)? {
        Action::Write(out_buffer, outcome) => {
            let output = final_output_path(input);
            encode_audio(&out_buffer, &output, &config.encode).await?;
            (Some(output), outcome)
        }
        Action::DeleteSource => {
            tokio::fs::remove_file(input).await?;
            remove_stale_output(input).await?;
            (None, TrimOutcome::Deleted)
        }
        Action::Nothing => (None, TrimOutcome::Skipped),
    };

    let removed_ms = match outcome {
        TrimOutcome::Trimmed { offset_ms } => offset_ms,
        _ => 0,
    };
    record_trim(outcome.label(), removed_ms);

    info!(
        input = %input.display(),
        outcome = outcome.label(),
        removed_ms,
        "{}",
        outcome
    );

    Ok(TrimReport {
        input: input.to_path_buf(),
        output,
        outcome,
    })
}

/// Recursively list trim candidates under `root`, sorted by path.
pub async fn collect_trim_candidates(root: impl AsRef<Path>) -> MediaResult<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(MediaError::FileNotFound(root.to_path_buf()));
    }

    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if is_trim_candidate(&path) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Trim every candidate under `root`. Per-file errors are logged and counted.
pub async fn trim_tree(root: impl AsRef<Path>, config: &TrimJobConfig) -> MediaResult<TrimSummary> {
    config.silence.validate()?;

    let candidates = collect_trim_candidates(root.as_ref()).await?;
    info!(
        root = %root.as_ref().display(),
        files = candidates.len(),
        "Trimming leading silence"
    );

    let mut summary = TrimSummary::default();
    for path in candidates {
        match trim_file(&path, config).await {
            Ok(report) => summary.record(report.outcome),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to trim file");
                record_trim("failed", 0);
                summary.failures.push((path, e.to_string()));
            }
        }
    }

    Ok(summary)
}
