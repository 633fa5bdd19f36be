//! PCM decoding for synthesized speech.

use crate::SynthError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;

/// Sample rate of the speech backend's output.
pub const SPEECH_SAMPLE_RATE_HZ: u32 = 24_000;

/// Decoded mono clip, owned by the playback that created it.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationClip {
    /// Normalised samples in `[-1.0, 1.0)`.
    pub samples: Arc<[f32]>,
    pub sample_rate_hz: u32,
}

impl NarrationClip {
    /// Decodes base64 little-endian PCM16 mono audio.
    pub fn from_base64_pcm16(encoded: &str) -> Result<Self, SynthError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|err| SynthError::Decode(err.to_string()))?;
        Self::from_pcm16_le(&bytes)
    }

    /// Converts raw little-endian PCM16 bytes.
    pub fn from_pcm16_le(bytes: &[u8]) -> Result<Self, SynthError> {
        if bytes.len() % 2 != 0 {
            return Err(SynthError::Decode(format!(
                "odd PCM16 payload length {}",
                bytes.len()
            )));
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32_768.0)
            .collect();
        Ok(Self {
            samples,
            sample_rate_hz: SPEECH_SAMPLE_RATE_HZ,
        })
    }

    /// Playback length, rounded up to the next millisecond.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        let samples = self.samples.len() as u64;
        let rate = u64::from(self.sample_rate_hz);
        (samples * 1_000).div_ceil(rate)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
