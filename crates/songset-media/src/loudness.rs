//! Loudness measurement in dBFS.

/// Root-mean-square amplitude of a block of samples.
///
/// Returns `0.0` for an empty block.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt()
}

/// Loudness of a block in decibels relative to full scale (amplitude 1.0).
///
/// Digital silence has no defined loudness and yields `None`.
pub fn dbfs(samples: &[f32]) -> Option<f32> {
    let rms = rms(samples);
    if rms > 0.0 && rms.is_finite() {
        Some((20.0 * rms.log10()) as f32)
    } else {
        None
    }
}

/// Linear amplitude for a dBFS value.
pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_undefined() {
        assert_eq!(dbfs(&[0.0; 128]), None);
        assert_eq!(dbfs(&[]), None);
    }

    #[test]
    fn test_full_scale_is_zero_db() {
        let square: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let db = dbfs(&square).unwrap();
        assert!(db.abs() < 1e-4);
    }

    #[test]
    fn test_known_level() {
        let amp = db_to_amplitude(-3.0);
        let square: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { amp } else { -amp }).collect();
        let db = dbfs(&square).unwrap();
        assert!((db + 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_rms_of_half_scale() {
        assert!((rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-9);
    }
}
