use std::io::Cursor;
use tracing::debug;

use crate::error::{Result, VoicemintError};
use super::{DecodedAudioBuffer, PCM16_SCALE};

/// Size of the canonical PCM WAV header
pub const WAV_HEADER_LEN: usize = 44;

/// Format parameters written into the WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl WavSpec {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    fn bytes_per_sample(&self) -> Result<u16> {
        if self.bits_per_sample == 0 || self.bits_per_sample % 8 != 0 {
            return Err(VoicemintError::Validation(format!(
                "Unsupported WAV bit depth: {}",
                self.bits_per_sample
            )));
        }
        Ok(self.bits_per_sample / 8)
    }

    /// Bytes per frame; must fit the 16-bit header field
    pub fn block_align(&self) -> Result<u16> {
        let bytes = self.bytes_per_sample()?;
        self.channels.checked_mul(bytes).ok_or_else(|| {
            VoicemintError::Validation(format!(
                "{} channels of {}-bit audio do not fit a WAV header",
                self.channels, self.bits_per_sample
            ))
        })
    }

    /// Bytes per second; must fit the 32-bit header field
    pub fn byte_rate(&self) -> Result<u32> {
        let block_align = self.block_align()?;
        self.sample_rate.checked_mul(block_align as u32).ok_or_else(|| {
            VoicemintError::Validation(format!(
                "A sample rate of {} Hz with {} byte frames does not fit a WAV header",
                self.sample_rate, block_align
            ))
        })
    }
}

/// A complete WAV file held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavBlob {
    bytes: Vec<u8>,
}

impl WavBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The PCM payload following the header
    pub fn payload(&self) -> &[u8] {
        &self.bytes[WAV_HEADER_LEN..]
    }
}

/// Wrap raw PCM bytes in a RIFF/WAVE container.
///
/// The payload is copied verbatim after the 44-byte header. Output depends
/// only on the inputs.
pub fn encode_wav(pcm: &[u8], spec: WavSpec) -> Result<WavBlob> {
    let data_len = u32::try_from(pcm.len())
        .ok()
        .filter(|len| len.checked_add(36).is_some())
        .ok_or_else(|| {
            VoicemintError::Validation(format!(
                "PCM payload of {} bytes is too large for a WAV container",
                pcm.len()
            ))
        })?;

    let block_align = spec.block_align()?;
    let byte_rate = spec.byte_rate()?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&spec.channels.to_le_bytes());
    bytes.extend_from_slice(&spec.sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&spec.bits_per_sample.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.extend_from_slice(pcm);

    debug!("Encoded {} PCM bytes into a {} byte WAV", pcm.len(), bytes.len());
    Ok(WavBlob { bytes })
}

/// Read a WAV file into a decoded buffer.
///
/// Accepts 16-bit integer and 32-bit float PCM, which is what the media
/// conversion step produces.
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudioBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / PCM16_SCALE))
            .collect::<std::result::Result<_, _>>()?,
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        (format, bits) => {
            return Err(VoicemintError::Decode(format!(
                "Unsupported WAV sample format: {:?} {}-bit",
                format, bits
            )));
        }
    };

    if channel_count == 0 {
        return Err(VoicemintError::Decode("WAV file declares no channels".to_string()));
    }

    let mut data = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, sample) in data.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    Ok(DecodedAudioBuffer::from_channels(spec.sample_rate, data))
}
