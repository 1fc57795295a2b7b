// Media processing on top of ffmpeg, ffprobe and ffplay
//
// - commands: command builders and execution
// - processor: frame capture, duration probing and audio conversion
// - ffplay: video and audio surfaces for the synchronized player

pub mod commands;
pub mod processor;
pub mod ffplay;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;
pub use ffplay::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Duration of a media file in seconds; 0.0 when the container does not say
    async fn probe_duration(&self, media_path: &Path) -> Result<f64>;

    /// Capture one frame at `at` seconds as JPEG bytes
    async fn capture_frame(&self, video_path: &Path, at: f64) -> Result<Vec<u8>>;

    /// Convert any audio (or the audio track of a video) to 16-bit PCM WAV
    async fn convert_to_pcm_wav(
        &self,
        input_path: &Path,
        output_path: &Path,
        sample_rate: u32,
        channels: u16,
    ) -> Result<()>;

    /// Check if media tools are available
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
