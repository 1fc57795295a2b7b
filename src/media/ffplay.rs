use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempPath;
use tracing::{debug, warn};

use crate::audio::{AudioOutput, AudioSourceHandle, DecodedAudioBuffer, VideoElement, WavSpec, encode_wav};
use crate::error::{Result, VoicemintError};
use super::MediaCommandBuilder;

fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("Player process already gone: {}", e);
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap player process: {}", e);
    }
}

/// Muted video window backed by an ffplay process.
///
/// ffplay cannot be paused from outside, so pausing stops the process and
/// the clock is kept here.
pub struct FfplayVideo {
    builder: MediaCommandBuilder,
    path: PathBuf,
    duration: f64,
    position: f64,
    started_at: Option<Instant>,
    child: Option<Child>,
}

impl FfplayVideo {
    pub fn new<P: AsRef<Path>>(builder: MediaCommandBuilder, path: P, duration: f64) -> Self {
        Self {
            builder,
            path: path.as_ref().to_path_buf(),
            duration,
            position: 0.0,
            started_at: None,
            child: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn halt(&mut self) {
        if let Some(mut child) = self.child.take() {
            terminate(&mut child);
        }
        self.started_at = None;
    }
}

impl VideoElement for FfplayVideo {
    fn current_time(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let time = self.position + elapsed;
        if self.duration > 0.0 { time.min(self.duration) } else { time }
    }

    fn set_current_time(&mut self, seconds: f64) {
        let playing = self.child.is_some();
        self.halt();
        self.position = seconds.max(0.0);
        if playing {
            if let Err(e) = self.play() {
                warn!("Failed to resume video after seek: {}", e);
            }
        }
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn play(&mut self) -> Result<()> {
        self.halt();
        let child = self.builder.play_video(&self.path, self.position).spawn()?;
        self.child = Some(child);
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) {
        self.position = self.current_time();
        self.halt();
    }

    fn poll_ended(&mut self) -> bool {
        let exited = match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(Some(_))) => true,
            Some(Ok(None)) | None => false,
            Some(Err(e)) => {
                warn!("Lost track of video process: {}", e);
                true
            }
        };
        if exited {
            self.position = self.current_time();
            self.child = None;
            self.started_at = None;
        }
        exited
    }
}

impl Drop for FfplayVideo {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Audio output that plays buffers through a headless ffplay process.
///
/// The buffer is written once to a temporary WAV file; a new buffer
/// supersedes the file and the old one is removed when its last source is
/// released.
pub struct FfplayAudioOutput {
    builder: MediaCommandBuilder,
    preview: Option<(Arc<DecodedAudioBuffer>, Arc<TempPath>)>,
}

impl FfplayAudioOutput {
    pub fn new(builder: MediaCommandBuilder) -> Self {
        Self {
            builder,
            preview: None,
        }
    }

    fn preview_for(&mut self, buffer: &Arc<DecodedAudioBuffer>) -> Result<Arc<TempPath>> {
        if let Some((current, path)) = &self.preview {
            if Arc::ptr_eq(current, buffer) {
                return Ok(Arc::clone(path));
            }
        }

        let spec = WavSpec::new(buffer.sample_rate(), buffer.channel_count(), 16);
        let wav = encode_wav(&buffer.to_pcm16_le(), spec)?;

        let mut file = tempfile::Builder::new()
            .prefix("voicemint-")
            .suffix(".wav")
            .tempfile()?;
        file.write_all(wav.as_bytes())?;
        file.flush()?;

        let path = Arc::new(file.into_temp_path());
        debug!("Wrote playback preview to {}", path.display());
        self.preview = Some((Arc::clone(buffer), Arc::clone(&path)));
        Ok(path)
    }
}

impl AudioOutput for FfplayAudioOutput {
    type Source = FfplayAudioSource;

    fn create_source(&mut self, buffer: Arc<DecodedAudioBuffer>) -> Result<FfplayAudioSource> {
        let path = self.preview_for(&buffer)?;
        Ok(FfplayAudioSource {
            builder: self.builder.clone(),
            path: Some(path),
            child: None,
        })
    }
}

/// One play-through of a preview file
pub struct FfplayAudioSource {
    builder: MediaCommandBuilder,
    path: Option<Arc<TempPath>>,
    child: Option<Child>,
}

impl AudioSourceHandle for FfplayAudioSource {
    fn start(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Err(VoicemintError::Media(
                "Audio source was already disconnected".to_string(),
            ));
        };
        let child = self.builder.play_audio(path.to_path_buf()).spawn()?;
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            terminate(&mut child);
        }
    }

    fn disconnect(&mut self) {
        self.stop();
        self.path = None;
    }

    fn poll_ended(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(Some(_))) => {
                self.child = None;
                true
            }
            Some(Err(e)) => {
                warn!("Lost track of audio process: {}", e);
                self.child = None;
                true
            }
            Some(Ok(None)) | None => false,
        }
    }
}

impl Drop for FfplayAudioSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode_pcm16;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg", "ffprobe", "voicemint-no-such-ffplay")
    }

    #[test]
    fn test_preview_reused_for_same_buffer() {
        let mut output = FfplayAudioOutput::new(builder());
        let buffer = Arc::new(decode_pcm16(&[0u8; 96], 24_000, 1).unwrap());

        let first = output.create_source(Arc::clone(&buffer)).unwrap();
        let second = output.create_source(Arc::clone(&buffer)).unwrap();

        let first_path = first.path.as_ref().unwrap().to_path_buf();
        assert_eq!(first_path, second.path.as_ref().unwrap().to_path_buf());

        let wav = std::fs::read(&first_path).unwrap();
        assert_eq!(wav.len(), 44 + 96);
        assert_eq!(&wav[0..4], b"RIFF");
    }

    #[test]
    fn test_superseded_preview_is_removed() {
        let mut output = FfplayAudioOutput::new(builder());
        let first = Arc::new(decode_pcm16(&[0u8; 48], 24_000, 1).unwrap());
        let second = Arc::new(decode_pcm16(&[1u8; 48], 24_000, 1).unwrap());

        let mut source = output.create_source(first).unwrap();
        let old_path = source.path.as_ref().unwrap().to_path_buf();
        output.create_source(second).unwrap();

        // still held by the live source
        assert!(old_path.exists());
        source.disconnect();
        assert!(!old_path.exists());
    }

    #[test]
    fn test_start_without_player_binary_fails() {
        let mut output = FfplayAudioOutput::new(builder());
        let buffer = Arc::new(decode_pcm16(&[0u8; 48], 24_000, 1).unwrap());
        let mut source = output.create_source(buffer).unwrap();

        assert!(source.start().is_err());
        assert!(!source.poll_ended());
    }

    #[test]
    fn test_video_clock_while_paused() {
        let mut video = FfplayVideo::new(builder(), "clip.mp4", 10.0);
        video.set_current_time(4.0);
        assert_eq!(video.current_time(), 4.0);
        video.pause();
        assert_eq!(video.current_time(), 4.0);
        assert!(!video.poll_ended());
        assert!(video.play().is_err());
    }
}
