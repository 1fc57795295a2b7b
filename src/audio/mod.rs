// Audio decode and playback synchronization
//
// - pcm: base64 raw 16-bit PCM into a decoded buffer
// - wav: raw PCM into a WAV container
// - player: muted video and decoded audio played in lockstep

pub mod pcm;
pub mod wav;
pub mod player;

pub use pcm::*;
pub use wav::*;
pub use player::*;

/// Decoded audio held in memory, one sample vector per channel.
///
/// Samples are normalized to -1.0..1.0. A buffer is never mutated after it
/// has been created; the player shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedAudioBuffer {
    pub(crate) fn from_channels(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self { sample_rate, channels }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Re-quantize to interleaved 16-bit little-endian PCM.
    pub fn to_pcm16_le(&self) -> Vec<u8> {
        let frames = self.frames();
        let mut bytes = Vec::with_capacity(frames * self.channels.len() * 2);
        for frame in 0..frames {
            for channel in &self.channels {
                let scaled = (channel[frame] * pcm::PCM16_SCALE).round();
                let sample = scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
        }
        bytes
    }
}
