//! Leading-silence detection.
//!
//! The buffer is scanned in consecutive, non-overlapping windows. The first
//! window whose loudness reaches the threshold marks the start of the audio.
//! Window boundaries are derived from milliseconds (`ms * rate / 1000`
//! frames), so every window start is an exact multiple of the window size
//! in milliseconds. The final window may be shorter than the others.

use crate::audio::AudioBuffer;
use crate::error::{MediaError, MediaResult};
use crate::loudness::dbfs;

/// Find the start offset (ms) of the first window with loudness at or above
/// `threshold_db` dBFS.
///
/// Windows of digital silence have undefined loudness and never match.
/// Returns `Ok(None)` when no window reaches the threshold.
///
/// # Errors
///
/// Returns [`MediaError::InvalidInput`] when the buffer is empty, the
/// threshold is not finite, the window size is zero or shorter than one
/// frame, or the window is longer than the buffer.
pub fn find_audio_start(
    buffer: &AudioBuffer,
    threshold_db: f32,
    window_ms: u32,
) -> MediaResult<Option<u64>> {
    validate_scan(buffer, threshold_db, window_ms)?;

    let window_ms = window_ms as u64;
    let frames = buffer.frames();
    let mut start_ms = 0u64;

    loop {
        let start = buffer.frame_at_ms(start_ms);
        if start >= frames {
            return Ok(None);
        }
        let end = buffer.frame_at_ms(start_ms + window_ms);

        if let Some(level) = dbfs(buffer.frame_range(start, end)) {
            if level >= threshold_db {
                return Ok(Some(start_ms));
            }
        }

        start_ms += window_ms;
    }
}

/// Loudness of each window in scan order, `None` for silent windows.
///
/// Uses the same partitioning as [`find_audio_start`].
pub fn window_levels(buffer: &AudioBuffer, window_ms: u32) -> MediaResult<Vec<Option<f32>>> {
    validate_scan(buffer, 0.0, window_ms)?;

    let window_ms = window_ms as u64;
    let frames = buffer.frames();
    let mut levels = Vec::with_capacity(frames / buffer.frame_at_ms(window_ms).max(1) + 1);
    let mut start_ms = 0u64;

    loop {
        let start = buffer.frame_at_ms(start_ms);
        if start >= frames {
            return Ok(levels);
        }
        let end = buffer.frame_at_ms(start_ms + window_ms);
        levels.push(dbfs(buffer.frame_range(start, end)));
        start_ms += window_ms;
    }
}

/// Drop everything before `offset_ms`.
///
/// The remaining samples are copied unmodified. An offset of 0 returns an
/// identical buffer.
pub fn trim_leading(buffer: &AudioBuffer, offset_ms: u64) -> AudioBuffer {
    buffer.slice_from_ms(offset_ms)
}

fn validate_scan(buffer: &AudioBuffer, threshold_db: f32, window_ms: u32) -> MediaResult<()> {
    if buffer.frames() == 0 {
        return Err(MediaError::invalid_input("audio buffer is empty"));
    }
    if !threshold_db.is_finite() {
        return Err(MediaError::invalid_input(format!(
            "threshold must be finite, got {}",
            threshold_db
        )));
    }
    if window_ms == 0 {
        return Err(MediaError::invalid_input("window size must be positive"));
    }
    // Every window must hold at least one frame
    if (window_ms as u64) * (buffer.sample_rate() as u64) < 1000 {
        return Err(MediaError::invalid_input(format!(
            "window of {} ms is shorter than one frame at {} Hz",
            window_ms,
            buffer.sample_rate()
        )));
    }
    let duration_ms = buffer.duration_ms();
    if window_ms as u64 > duration_ms {
        return Err(MediaError::invalid_input(format!(
            "window of {} ms exceeds buffer duration of {} ms",
            window_ms, duration_ms
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loudness::db_to_amplitude;

    const RATE: u32 = 8000;

    /// Mono buffer built from (duration_ms, level_db) segments.
    /// `None` is digital silence; a level is a square wave at that dBFS.
    fn segments(parts: &[(u64, Option<f32>)]) -> AudioBuffer {
        let mut samples = Vec::new();
        for &(ms, level) in parts {
            let frames = (ms * RATE as u64 / 1000) as usize;
            let amp = level.map(db_to_amplitude).unwrap_or(0.0);
            samples.extend((0..frames).map(|i| if i % 2 == 0 { amp } else { -amp }));
        }
        AudioBuffer::new(samples, RATE, 1).unwrap()
    }

    /// Deterministic pseudo-random buffer with a level that drifts upward.
    fn noisy_ramp(ms: u64) -> AudioBuffer {
        let frames = (ms * RATE as u64 / 1000) as usize;
        let mut state: u32 = 0x2545_F491;
        let samples = (0..frames)
            .map(|i| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let noise = (state as f32 / u32::MAX as f32) * 2.0 - 1.0;
                noise * (i as f32 / frames as f32)
            })
            .collect();
        AudioBuffer::new(samples, RATE, 1).unwrap()
    }

    #[test]
    fn test_concrete_scenario_returns_200() {
        let buffer = segments(&[(200, None), (300, Some(-3.0))]);
        assert_eq!(buffer.duration_ms(), 500);
        assert_eq!(find_audio_start(&buffer, -5.0, 50).unwrap(), Some(200));
    }

    #[test]
    fn test_all_silent_returns_none() {
        let buffer = segments(&[(500, None)]);
        for threshold in [-120.0, -60.0, -5.0, 0.0, 5.0] {
            assert_eq!(find_audio_start(&buffer, threshold, 50).unwrap(), None);
        }
    }

    #[test]
    fn test_quiet_audio_below_threshold_returns_none() {
        let buffer = segments(&[(500, Some(-40.0))]);
        assert_eq!(find_audio_start(&buffer, -20.0, 25).unwrap(), None);
        assert_eq!(find_audio_start(&buffer, -45.0, 25).unwrap(), Some(0));
    }

    #[test]
    fn test_loud_first_window_returns_zero() {
        let buffer = segments(&[(50, Some(-1.0)), (450, None)]);
        assert_eq!(find_audio_start(&buffer, -5.0, 50).unwrap(), Some(0));
    }

    #[test]
    fn test_single_loud_window_at_index_k() {
        let window = 20u64;
        for k in 0..10u64 {
            let buffer = segments(&[
                (k * window, Some(-70.0)),
                (window, Some(-6.0)),
                (200 - (k + 1) * window, None),
            ]);
            let offset = find_audio_start(&buffer, -10.0, window as u32).unwrap();
            assert_eq!(offset, Some(k * window));

            // Every earlier window is below threshold or undefined
            let levels = window_levels(&buffer, window as u32).unwrap();
            for level in &levels[..k as usize] {
                assert!(level.map_or(true, |db| db < -10.0));
            }
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let buffer = segments(&[(100, None), (100, Some(-12.0))]);
        let level = window_levels(&buffer, 50).unwrap()[2].unwrap();
        assert_eq!(find_audio_start(&buffer, level, 50).unwrap(), Some(100));
    }

    #[test]
    fn test_short_final_window_is_scanned() {
        // 230 ms: windows at 0, 50, 100, 150 and a 30 ms window at 200
        let buffer = segments(&[(200, None), (30, Some(-3.0))]);
        assert_eq!(find_audio_start(&buffer, -5.0, 50).unwrap(), Some(200));
    }

    #[test]
    fn test_idempotent_after_trim() {
        let buffer = segments(&[(150, None), (350, Some(-3.0))]);
        let offset = find_audio_start(&buffer, -5.0, 50).unwrap().unwrap();
        let trimmed = trim_leading(&buffer, offset);

        assert_eq!(trimmed.duration_ms(), 350);
        assert_eq!(find_audio_start(&trimmed, -5.0, 50).unwrap(), Some(0));

        let again = trim_leading(&trimmed, 0);
        assert_eq!(again, trimmed);
    }

    #[test]
    fn test_monotonic_in_threshold() {
        let buffer = noisy_ramp(1000);
        let mut previous: Option<u64> = Some(0);
        let mut threshold = -80.0f32;

        while threshold <= 5.0 {
            let offset = find_audio_start(&buffer, threshold, 20).unwrap();
            match (previous, offset) {
                (Some(prev), Some(cur)) => assert!(cur >= prev, "{} moved earlier", threshold),
                (None, Some(_)) => panic!("offset reappeared at {} dB", threshold),
                _ => {}
            }
            previous = offset;
            threshold += 2.5;
        }
        assert_eq!(previous, None);
    }

    #[test]
    fn test_stereo_windows_use_all_channels() {
        // Left channel silent, right channel loud from 100 ms
        let frames = 300 * RATE as usize / 1000;
        let loud_from = 100 * RATE as usize / 1000;
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            samples.push(0.0);
            samples.push(if i >= loud_from { 0.9 } else { 0.0 });
        }
        let buffer = AudioBuffer::new(samples, RATE, 2).unwrap();
        assert_eq!(find_audio_start(&buffer, -10.0, 50).unwrap(), Some(100));
    }

    #[test]
    fn test_invalid_configuration_fails_fast() {
        let buffer = segments(&[(100, Some(-3.0))]);

        assert!(find_audio_start(&buffer, -5.0, 0).unwrap_err().is_invalid_input());
        assert!(find_audio_start(&buffer, -5.0, 101).unwrap_err().is_invalid_input());
        assert!(find_audio_start(&buffer, f32::NEG_INFINITY, 10)
            .unwrap_err()
            .is_invalid_input());

        let empty = AudioBuffer::new(Vec::new(), RATE, 1).unwrap();
        assert!(find_audio_start(&empty, -5.0, 10).unwrap_err().is_invalid_input());

        // A window equal to the whole buffer is allowed
        assert_eq!(find_audio_start(&buffer, -5.0, 100).unwrap(), Some(0));
    }

    #[test]
    fn test_window_shorter_than_a_frame_is_rejected() {
        // 10 Hz: one frame lasts 100 ms
        let buffer = AudioBuffer::new(vec![1.0; 10], 10, 1).unwrap();

        assert!(find_audio_start(&buffer, -5.0, 50).unwrap_err().is_invalid_input());
        assert!(window_levels(&buffer, 99).unwrap_err().is_invalid_input());
        assert_eq!(find_audio_start(&buffer, -5.0, 100).unwrap(), Some(0));
    }
}
