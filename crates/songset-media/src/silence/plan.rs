//! Turn a detection result into a trim decision.
//!
//! Planning is pure: it never touches the filesystem. The pipeline carries
//! out the plan (writing a trimmed file, a placeholder, or deleting the
//! source).

use tracing::debug;

use super::config::{FallbackPolicy, SilenceConfig, ThresholdMode};
use super::detector::find_audio_start;
use crate::audio::AudioBuffer;
use crate::error::MediaResult;
use crate::loudness::dbfs;

/// Decision for one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimPlan {
    /// Audio starts at `offset_ms`; everything before it is dropped.
    /// An offset of 0 keeps the buffer as is.
    Trim { offset_ms: u64 },
    /// No window reached the threshold; apply the configured fallback.
    Fallback(FallbackPolicy),
}

/// Resolve the configured threshold to an absolute dBFS value for `buffer`.
///
/// A relative threshold over a buffer of pure digital silence has no
/// reference level and resolves to `None`.
pub fn resolve_threshold(buffer: &AudioBuffer, threshold: ThresholdMode) -> Option<f32> {
    match threshold {
        ThresholdMode::Absolute(db) => Some(db),
        ThresholdMode::RelativeToOverall(offset) => dbfs(buffer.samples()).map(|overall| overall + offset),
    }
}

/// Decide how to trim `buffer` under `config`.
pub fn plan_trim(buffer: &AudioBuffer, config: &SilenceConfig) -> MediaResult<TrimPlan> {
    config.validate()?;

    let Some(threshold_db) = resolve_threshold(buffer, config.threshold) else {
        debug!("Buffer is digital silence, no relative reference level");
        // Still run the detector so invalid windows are reported consistently
        find_audio_start(buffer, 0.0, config.window_ms)?;
        return Ok(TrimPlan::Fallback(config.fallback));
    };

    let plan = match find_audio_start(buffer, threshold_db, config.window_ms)? {
        Some(offset_ms) => TrimPlan::Trim { offset_ms },
        None => TrimPlan::Fallback(config.fallback),
    };

    debug!(
        threshold_db,
        window_ms = config.window_ms,
        duration_ms = buffer.duration_ms(),
        plan = ?plan,
        "Planned leading-silence trim"
    );

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loudness::db_to_amplitude;

    fn tone_after_silence(silence_ms: u64, total_ms: u64, db: f32) -> AudioBuffer {
        let rate = 1000u64;
        let amp = db_to_amplitude(db);
        let samples = (0..total_ms * rate / 1000)
            .map(|i| {
                if i < silence_ms {
                    0.0
                } else if i % 2 == 0 {
                    amp
                } else {
                    -amp
                }
            })
            .collect();
        AudioBuffer::new(samples, rate as u32, 1).unwrap()
    }

    #[test]
    fn test_plan_trim_found() {
        let buffer = tone_after_silence(200, 500, -3.0);
        let config = SilenceConfig::default().with_threshold_db(-5.0);
        let plan = plan_trim(&buffer, &config).unwrap();
        assert_eq!(plan, TrimPlan::Trim { offset_ms: 200 });
    }

    #[test]
    fn test_plan_uses_selected_fallback() {
        let buffer = tone_after_silence(500, 500, -3.0);
        for policy in [
            FallbackPolicy::Placeholder,
            FallbackPolicy::Delete,
            FallbackPolicy::NoOp,
        ] {
            let config = SilenceConfig::default().with_fallback(policy);
            assert_eq!(plan_trim(&buffer, &config).unwrap(), TrimPlan::Fallback(policy));
        }
    }

    #[test]
    fn test_positive_absolute_threshold_never_matches() {
        let buffer = tone_after_silence(0, 500, 0.0);
        let config = SilenceConfig::default()
            .with_threshold_db(5.0)
            .with_fallback(FallbackPolicy::Placeholder);
        assert_eq!(
            plan_trim(&buffer, &config).unwrap(),
            TrimPlan::Fallback(FallbackPolicy::Placeholder)
        );
    }

    #[test]
    fn test_relative_threshold_tracks_overall_level() {
        // Quiet intro at -40 dB followed by the song at -10 dB
        let rate = 1000usize;
        let quiet = db_to_amplitude(-40.0);
        let loud = db_to_amplitude(-10.0);
        let samples: Vec<f32> = (0..1000)
            .map(|i| {
                let amp = if i < 300 { quiet } else { loud };
                if i % 2 == 0 { amp } else { -amp }
            })
            .collect();
        let buffer = AudioBuffer::new(samples, rate as u32, 1).unwrap();

        let overall = dbfs(buffer.samples()).unwrap();
        assert_eq!(
            resolve_threshold(&buffer, ThresholdMode::RelativeToOverall(-6.0)),
            Some(overall - 6.0)
        );

        let config = SilenceConfig::default().with_relative_threshold_db(-6.0);
        assert_eq!(plan_trim(&buffer, &config).unwrap(), TrimPlan::Trim { offset_ms: 300 });
    }

    #[test]
    fn test_relative_threshold_on_digital_silence_falls_back() {
        let buffer = AudioBuffer::silent(500, 1000, 1).unwrap();
        let config = SilenceConfig::default()
            .with_relative_threshold_db(-16.0)
            .with_fallback(FallbackPolicy::Delete);
        assert_eq!(
            plan_trim(&buffer, &config).unwrap(),
            TrimPlan::Fallback(FallbackPolicy::Delete)
        );
    }

    #[test]
    fn test_plan_rejects_invalid_config() {
        let buffer = tone_after_silence(0, 100, -3.0);
        let config = SilenceConfig::default().with_window_ms(200);
        assert!(plan_trim(&buffer, &config).unwrap_err().is_invalid_input());
    }
}
