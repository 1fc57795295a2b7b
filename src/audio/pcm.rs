use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::error::{Result, VoicemintError};
use super::DecodedAudioBuffer;

/// Divisor mapping a signed 16-bit sample onto -1.0..1.0
pub const PCM16_SCALE: f32 = 32768.0;

/// Decode standard-alphabet base64 into raw bytes
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(payload.trim())?)
}

/// Decode a base64 payload of little-endian 16-bit PCM into an audio buffer.
///
/// The sample rate and channel count are taken from the caller; nothing is
/// inferred from the payload and no resampling is done.
pub fn decode_pcm_base64(payload: &str, sample_rate: u32, channels: u16) -> Result<DecodedAudioBuffer> {
    let bytes = decode_base64(payload)?;
    decode_pcm16(&bytes, sample_rate, channels)
}

/// Interpret raw bytes as interleaved little-endian 16-bit PCM.
///
/// A trailing odd byte, and any partial trailing frame, is dropped.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<DecodedAudioBuffer> {
    if channels == 0 {
        return Err(VoicemintError::Decode("Channel count must be at least 1".to_string()));
    }
    if sample_rate == 0 {
        return Err(VoicemintError::Decode("Sample rate must be positive".to_string()));
    }

    let channel_count = channels as usize;
    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / PCM16_SCALE)
        .collect();
    let frames = samples.len() / channel_count;

    let mut data = vec![Vec::with_capacity(frames); channel_count];
    for frame in samples.chunks_exact(channel_count) {
        for (channel, sample) in data.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    debug!(
        "Decoded {} bytes into {} frames ({} channel(s) @ {} Hz)",
        bytes.len(),
        frames,
        channels,
        sample_rate
    );

    Ok(DecodedAudioBuffer::from_channels(sample_rate, data))
}
