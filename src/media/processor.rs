use async_trait::async_trait;
use std::path::Path;
use tracing::{info, debug, warn};

use crate::config::MediaConfig;
use crate::error::{Result, VoicemintError};
use super::{MediaProcessorTrait, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(
            &config.ffmpeg_path,
            &config.ffprobe_path,
            &config.ffplay_path,
        );

        Self { command_builder }
    }
}

/// Parse ffprobe's duration output; "N/A" and garbage become 0.0
pub fn parse_probed_duration(stdout: &str) -> f64 {
    match stdout.trim().parse::<f64>() {
        Ok(duration) if duration.is_finite() && duration > 0.0 => duration,
        _ => {
            warn!("Could not determine media duration from {:?}", stdout.trim());
            0.0
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn probe_duration(&self, media_path: &Path) -> Result<f64> {
        if !media_path.exists() {
            return Err(VoicemintError::FileNotFound(media_path.display().to_string()));
        }

        let stdout = self.command_builder.probe_duration(media_path).execute_capture().await?;
        let duration = parse_probed_duration(&String::from_utf8_lossy(&stdout));
        debug!("Duration of {}: {:.3}s", media_path.display(), duration);
        Ok(duration)
    }

    async fn capture_frame(&self, video_path: &Path, at: f64) -> Result<Vec<u8>> {
        info!("Capturing frame at {:.2}s from {}", at, video_path.display());

        let jpeg = self.command_builder.capture_frame(video_path, at).execute_capture().await?;
        if jpeg.is_empty() {
            return Err(VoicemintError::Media(format!(
                "No frame could be captured at {:.2}s",
                at
            )));
        }
        Ok(jpeg)
    }

    async fn convert_to_pcm_wav(
        &self,
        input_path: &Path,
        output_path: &Path,
        sample_rate: u32,
        channels: u16,
    ) -> Result<()> {
        info!("Converting {} to PCM WAV at {} Hz", input_path.display(), sample_rate);

        if !input_path.exists() {
            return Err(VoicemintError::FileNotFound(input_path.display().to_string()));
        }

        self.command_builder
            .convert_to_pcm_wav(input_path, output_path, sample_rate, channels)
            .execute()
            .await?;

        info!("Audio conversion completed");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| VoicemintError::Media(format!("Media processor not found: {}", e)))?;

        info!("Media processor is available");
        Ok(())
    }
}
