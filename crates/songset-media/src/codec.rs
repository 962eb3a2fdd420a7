//! Decoding to and encoding from [`AudioBuffer`] through FFmpeg.
//!
//! Both directions go through a temporary raw `f32le` file. The temporary
//! file is removed when it goes out of scope, whether or not FFmpeg succeeds.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::audio::AudioBuffer;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_audio;
use crate::progress::log_progress;

/// Default post-processing chain: light denoise, gentle compression,
/// loudness normalization to -14 LUFS.
pub const DEFAULT_FILTERS: &str = "afftdn=nf=-20,\
acompressor=threshold=-22dB:ratio=2:attack=10:release=120,\
loudnorm=I=-14:TP=-1:LRA=11";

/// Default MP3 bitrate for final clips.
pub const DEFAULT_BITRATE: &str = "320k";

/// Options for encoding a buffer to a compressed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// FFmpeg `-af` chain; `None` encodes without filtering.
    pub filters: Option<String>,
    /// Audio bitrate (e.g. `320k`).
    pub bitrate: String,
    /// Audio codec.
    pub codec: String,
    /// FFmpeg timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            filters: Some(DEFAULT_FILTERS.to_string()),
            bitrate: DEFAULT_BITRATE.to_string(),
            codec: "libmp3lame".to_string(),
            timeout_secs: 300,
        }
    }
}

impl EncodeOptions {
    /// Builder-style setter for the filter chain. An empty string disables
    /// filtering.
    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        let filters = filters.into();
        self.filters = if filters.trim().is_empty() {
            None
        } else {
            Some(filters)
        };
        self
    }

    /// Builder-style setter for the bitrate.
    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }

    fn apply(&self, mut cmd: FfmpegCommand) -> FfmpegCommand {
        if let Some(filters) = &self.filters {
            cmd = cmd.audio_filter(filters.clone());
        }
        cmd.audio_codec(self.codec.clone())
            .audio_bitrate(self.bitrate.clone())
    }
}

/// Decode any audio file FFmpeg understands into an [`AudioBuffer`] at its
/// native sample rate and channel count.
pub async fn decode_audio(input: impl AsRef<Path>) -> MediaResult<AudioBuffer> {
    let input = input.as_ref();
    let info = probe_audio(input).await?;

    let raw = NamedTempFile::new()?;
    let cmd = FfmpegCommand::new(input, raw.path()).raw_f32_output(info.sample_rate, info.channels);
    let expected_ms = (info.duration * 1000.0) as i64;
    FfmpegRunner::new()
        .with_timeout(300)
        .run_with_progress(&cmd, log_progress("decode", expected_ms))
        .await?;

    let bytes = tokio::fs::read(raw.path()).await?;
    if bytes.is_empty() {
        return Err(MediaError::invalid_audio(format!(
            "No audio data decoded from {}",
            input.display()
        )));
    }

    let buffer = AudioBuffer::from_f32le_bytes(&bytes, info.sample_rate, info.channels)?;
    debug!(
        input = %input.display(),
        sample_rate = info.sample_rate,
        channels = info.channels,
        duration_ms = buffer.duration_ms(),
        "Decoded audio"
    );

    Ok(buffer)
}

/// Encode `buffer` to `output` with the given options.
pub async fn encode_audio(
    buffer: &AudioBuffer,
    output: impl AsRef<Path>,
    options: &EncodeOptions,
) -> MediaResult<()> {
    let output = output.as_ref();

    let raw = NamedTempFile::new()?;
    tokio::fs::write(raw.path(), buffer.to_f32le_bytes()).await?;

    let cmd = FfmpegCommand::new(raw.path(), output)
        .raw_f32_input(buffer.sample_rate(), buffer.channels())
        .no_video();
    let cmd = options.apply(cmd);

    FfmpegRunner::new()
        .with_timeout(options.timeout_secs)
        .run_with_progress(&cmd, log_progress("encode", buffer.duration_ms() as i64))
        .await?;

    debug!(
        output = %output.display(),
        duration_ms = buffer.duration_ms(),
        bitrate = %options.bitrate,
        "Encoded audio"
    );

    Ok(())
}
