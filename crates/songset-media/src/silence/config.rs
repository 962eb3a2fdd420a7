//! Configuration for leading-silence trimming.
//!
//! The threshold, window size and fallback are always passed in by the
//! caller. Nothing here reads process-wide state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};

/// How the loudness threshold is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "db", rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Absolute level in dBFS.
    Absolute(f32),
    /// Offset in dB from the loudness of the whole buffer
    /// (e.g. `-16.0` = 16 dB below the overall level).
    RelativeToOverall(f32),
}

impl ThresholdMode {
    /// The configured dB number, whichever mode it belongs to.
    pub fn db(&self) -> f32 {
        match self {
            ThresholdMode::Absolute(db) | ThresholdMode::RelativeToOverall(db) => *db,
        }
    }
}

/// What to do with a file whose audio never reaches the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Replace the clip with a short silent placeholder.
    #[default]
    Placeholder,
    /// Delete the source file and any output left by an earlier run.
    Delete,
    /// Leave the source untouched and write nothing.
    NoOp,
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FallbackPolicy::Placeholder => "placeholder",
            FallbackPolicy::Delete => "delete",
            FallbackPolicy::NoOp => "no-op",
        };
        f.write_str(name)
    }
}

impl FromStr for FallbackPolicy {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placeholder" => Ok(FallbackPolicy::Placeholder),
            "delete" => Ok(FallbackPolicy::Delete),
            "no-op" | "noop" | "none" => Ok(FallbackPolicy::NoOp),
            other => Err(MediaError::invalid_input(format!(
                "unknown fallback policy '{}' (expected placeholder, delete or no-op)",
                other
            ))),
        }
    }
}

/// Configuration for leading-silence detection and its fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilenceConfig {
    /// Loudness a window must reach to count as the start of the audio.
    pub threshold: ThresholdMode,

    /// Length of each measurement window in milliseconds.
    ///
    /// Smaller windows give a finer cut point but react to single
    /// transients. 10-50 ms is typical.
    pub window_ms: u32,

    /// Policy when no window reaches the threshold.
    pub fallback: FallbackPolicy,

    /// Length of the silent placeholder written by
    /// [`FallbackPolicy::Placeholder`], in milliseconds.
    pub placeholder_ms: u32,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdMode::Absolute(-50.0),
            window_ms: 50,
            fallback: FallbackPolicy::Placeholder,
            placeholder_ms: 100,
        }
    }
}

impl SilenceConfig {
    /// Builder-style setter for an absolute dBFS threshold.
    pub fn with_threshold_db(mut self, db: f32) -> Self {
        self.threshold = ThresholdMode::Absolute(db);
        self
    }

    /// Builder-style setter for a threshold relative to the overall level.
    pub fn with_relative_threshold_db(mut self, db: f32) -> Self {
        self.threshold = ThresholdMode::RelativeToOverall(db);
        self
    }

    /// Builder-style setter for the window size.
    pub fn with_window_ms(mut self, ms: u32) -> Self {
        self.window_ms = ms;
        self
    }

    /// Builder-style setter for the fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Builder-style setter for the placeholder duration.
    pub fn with_placeholder_ms(mut self, ms: u32) -> Self {
        self.placeholder_ms = ms;
        self
    }

    /// Check values that do not depend on a particular buffer.
    ///
    /// Invalid values are rejected, never clamped.
    pub fn validate(&self) -> MediaResult<()> {
        if !self.threshold.db().is_finite() {
            return Err(MediaError::invalid_input(format!(
                "threshold must be finite, got {}",
                self.threshold.db()
            )));
        }
        if self.window_ms == 0 {
            return Err(MediaError::invalid_input("window size must be positive"));
        }
        if self.fallback == FallbackPolicy::Placeholder && self.placeholder_ms == 0 {
            return Err(MediaError::invalid_input(
                "placeholder duration must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SilenceConfig::default();
        assert_eq!(config.threshold, ThresholdMode::Absolute(-50.0));
        assert_eq!(config.window_ms, 50);
        assert_eq!(config.fallback, FallbackPolicy::Placeholder);
        assert_eq!(config.placeholder_ms, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SilenceConfig::default()
            .with_relative_threshold_db(-16.0)
            .with_window_ms(10)
            .with_fallback(FallbackPolicy::Delete);

        assert_eq!(config.threshold, ThresholdMode::RelativeToOverall(-16.0));
        assert_eq!(config.window_ms, 10);
        assert_eq!(config.fallback, FallbackPolicy::Delete);
    }

    #[test]
    fn test_validation_rejects_without_clamping() {
        let err = SilenceConfig::default().with_window_ms(0).validate().unwrap_err();
        assert!(err.is_invalid_input());

        let err = SilenceConfig::default()
            .with_threshold_db(f32::NAN)
            .validate()
            .unwrap_err();
        assert!(err.is_invalid_input());

        let err = SilenceConfig::default()
            .with_placeholder_ms(0)
            .validate()
            .unwrap_err();
        assert!(err.is_invalid_input());

        // Placeholder length is irrelevant for other policies
        assert!(SilenceConfig::default()
            .with_placeholder_ms(0)
            .with_fallback(FallbackPolicy::NoOp)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_fallback_policy_names() {
        for policy in [
            FallbackPolicy::Placeholder,
            FallbackPolicy::Delete,
            FallbackPolicy::NoOp,
        ] {
            assert_eq!(policy.to_string().parse::<FallbackPolicy>().unwrap(), policy);
        }
        assert_eq!("NOOP".parse::<FallbackPolicy>().unwrap(), FallbackPolicy::NoOp);
        assert!("shrug".parse::<FallbackPolicy>().is_err());
    }

    #[test]
    fn test_fallback_policy_serde() {
        let json = serde_json::to_string(&FallbackPolicy::NoOp).unwrap();
        assert_eq!(json, "\"no-op\"");
    }
}
