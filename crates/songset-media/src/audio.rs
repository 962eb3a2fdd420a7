//! Decoded audio buffers.

use crate::error::{MediaError, MediaResult};

/// Interleaved `f32` PCM samples with a fixed sample rate and channel count.
///
/// Samples are normalized so that full scale is `1.0`. A buffer is never
/// mutated in place by the trimming code; trimming produces a new buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Create a buffer, validating its layout.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> MediaResult<Self> {
        if sample_rate == 0 {
            return Err(MediaError::invalid_input("sample rate must be positive"));
        }
        if channels == 0 {
            return Err(MediaError::invalid_input("channel count must be positive"));
        }
        if samples.len() % channels as usize != 0 {
            return Err(MediaError::invalid_input(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Create a buffer of digital silence lasting `duration_ms`.
    pub fn silent(duration_ms: u32, sample_rate: u32, channels: u16) -> MediaResult<Self> {
        let frames = (duration_ms as u64 * sample_rate as u64 / 1000) as usize;
        Self::new(vec![0.0; frames * channels as usize], sample_rate, channels)
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in whole milliseconds (rounded down).
    pub fn duration_ms(&self) -> u64 {
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    /// Frame index at a millisecond offset, clamped to the buffer length.
    pub fn frame_at_ms(&self, ms: u64) -> usize {
        let frame = ms.saturating_mul(self.sample_rate as u64) / 1000;
        frame.min(self.frames() as u64) as usize
    }

    /// Interleaved samples for frames `start..end`.
    pub fn frame_range(&self, start: usize, end: usize) -> &[f32] {
        let ch = self.channels as usize;
        let end = end.min(self.frames());
        let start = start.min(end);
        &self.samples[start * ch..end * ch]
    }

    /// New buffer containing every frame from `start_ms` to the end.
    pub fn slice_from_ms(&self, start_ms: u64) -> AudioBuffer {
        let start = self.frame_at_ms(start_ms);
        AudioBuffer {
            samples: self.frame_range(start, self.frames()).to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Encode the samples as raw little-endian `f32` bytes.
    pub fn to_f32le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Decode raw little-endian `f32` bytes.
    ///
    /// Trailing bytes that do not form a whole sample are ignored.
    pub fn from_f32le_bytes(bytes: &[u8], sample_rate: u32, channels: u16) -> MediaResult<Self> {
        let mut samples: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        // A truncated final frame can appear when FFmpeg is interrupted
        let whole = samples.len() - samples.len() % channels.max(1) as usize;
        samples.truncate(whole);

        Self::new(samples, sample_rate, channels)
    }
}
