//! Wire conversion for realtime audio.
//!
//! Outbound: mono `f32` samples -> little-endian PCM16 -> base64.
//! Inbound: base64 -> PCM16 bytes handed to the audio output as-is.

use crate::error::{DesktopError, Result};
use crate::gateway::AudioFrame;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Scale used to map `[-1.0, 1.0]` onto the PCM16 range.
const PCM16_SCALE: f32 = 32768.0;

/// Convert samples to PCM16 LE. Out-of-range samples saturate.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        // `as` saturates, so 1.0 maps to i16::MAX rather than wrapping.
        let value = (sample * PCM16_SCALE) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Convert PCM16 LE bytes back to samples. A trailing odd byte is ignored.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / PCM16_SCALE)
        .collect()
}

/// Build the outbound frame for one capture chunk.
pub fn encode_frame(samples: &[f32], mime_type: &str) -> AudioFrame {
    AudioFrame {
        data: STANDARD.encode(encode_pcm16(samples)),
        mime_type: mime_type.to_owned(),
    }
}

/// Decode base64 audio from a server message.
///
/// # Errors
///
/// `Audio` when the payload is not valid base64.
pub fn decode_audio(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| DesktopError::Audio(format!("invalid audio payload: {e}")))
}
