use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use super::DecodedAudioBuffer;

/// A muted video surface the player drives.
///
/// Time is in seconds. `duration` may be NaN or zero while metadata is
/// unknown.
pub trait VideoElement {
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn duration(&self) -> f64;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    /// Returns true once after playback reached the end of the video
    fn poll_ended(&mut self) -> bool;
}

/// Live playback of one audio buffer during one play-through.
///
/// A handle must be stopped and disconnected before it is dropped, otherwise
/// the underlying output keeps the node alive.
pub trait AudioSourceHandle {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    fn disconnect(&mut self);
    /// Returns true once after the buffer finished playing on its own
    fn poll_ended(&mut self) -> bool;
}

/// Audio output context that hands out source handles
pub trait AudioOutput {
    type Source: AudioSourceHandle;

    fn create_source(&mut self, buffer: Arc<DecodedAudioBuffer>) -> Result<Self::Source>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
}

/// Plays a muted video and a decoded audio buffer together.
///
/// Only the player creates or destroys its audio source handle; there is at
/// most one live handle at any time.
pub struct SyncPlayer<V: VideoElement, O: AudioOutput> {
    video: V,
    output: O,
    buffer: Arc<DecodedAudioBuffer>,
    source: Option<O::Source>,
    progress: f64,
}

impl<V: VideoElement, O: AudioOutput> SyncPlayer<V, O> {
    /// Start idle, with the video at its beginning
    pub fn new(mut video: V, output: O, buffer: Arc<DecodedAudioBuffer>) -> Self {
        video.set_current_time(0.0);
        Self {
            video,
            output,
            buffer,
            source: None,
            progress: 0.0,
        }
    }

    pub fn state(&self) -> PlayerState {
        if self.source.is_some() {
            PlayerState::Playing
        } else {
            PlayerState::Idle
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlayerState::Playing
    }

    /// Fraction of the video played, 0.0..=1.0
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn buffer(&self) -> &Arc<DecodedAudioBuffer> {
        &self.buffer
    }

    /// Start video and audio from the beginning.
    ///
    /// Any running play-through is torn down first.
    pub fn play(&mut self) -> Result<()> {
        self.stop();

        let mut source = self.output.create_source(Arc::clone(&self.buffer))?;

        self.video.set_current_time(0.0);
        if let Err(e) = self.video.play() {
            warn!("Video failed to start: {}", e);
            source.disconnect();
            self.video.set_current_time(0.0);
            return Err(e);
        }
        if let Err(e) = source.start() {
            warn!("Audio failed to start: {}", e);
            source.disconnect();
            self.video.pause();
            self.video.set_current_time(0.0);
            return Err(e);
        }

        self.source = Some(source);
        info!("Playback started ({:.2}s of audio)", self.buffer.duration());
        Ok(())
    }

    /// Stop playback and release the audio source. No-op while idle.
    pub fn stop(&mut self) {
        let Some(mut source) = self.source.take() else {
            return;
        };

        source.stop();
        source.disconnect();
        self.video.pause();
        self.video.set_current_time(0.0);
        self.progress = 0.0;
        debug!("Playback stopped");
    }

    pub fn toggle(&mut self) -> Result<()> {
        match self.state() {
            PlayerState::Playing => {
                self.stop();
                Ok(())
            }
            PlayerState::Idle => self.play(),
        }
    }

    /// Recompute progress from the video clock
    pub fn on_time_update(&mut self) {
        let duration = self.video.duration();
        self.progress = if duration.is_finite() && duration > 0.0 {
            (self.video.current_time() / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn on_video_ended(&mut self) {
        debug!("Video ended");
        self.stop();
    }

    /// The audio source finished on its own
    pub fn on_audio_ended(&mut self) {
        if self.is_playing() {
            debug!("Audio ended");
            self.stop();
        }
    }

    /// Check both media for end signals and dispatch them
    pub fn poll(&mut self) {
        if self.video.poll_ended() {
            self.on_video_ended();
        }
        let audio_ended = self
            .source
            .as_mut()
            .map(|source| source.poll_ended())
            .unwrap_or(false);
        if audio_ended {
            self.on_audio_ended();
        }
    }

    /// Swap in a new audio buffer; the current play-through ends.
    pub fn load_audio(&mut self, buffer: Arc<DecodedAudioBuffer>) {
        self.stop();
        self.buffer = buffer;
        self.progress = 0.0;
    }

    /// Swap in a new video; the current play-through ends.
    pub fn load_video(&mut self, video: V) {
        self.stop();
        self.video = video;
        self.video.set_current_time(0.0);
        self.progress = 0.0;
    }
}

impl<V: VideoElement, O: AudioOutput> Drop for SyncPlayer<V, O> {
    fn drop(&mut self) {
        self.stop();
    }
}
