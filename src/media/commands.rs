use std::path::Path;
use std::process::{Child, Stdio};
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, VoicemintError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file (or a bare positional path for ffprobe/ffplay)
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Quiet the tool's own logging
    pub fn quiet(self) -> Self {
        self.arg("-loglevel").arg("error")
    }

    /// Seek to a position in seconds (before `input` for fast seeking)
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(format!("{:.3}", seconds.max(0.0)))
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Disable audio
    pub fn no_audio(self) -> Self {
        self.arg("-an")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u16) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        self.execute_capture().await.map(|_| ())
    }

    /// Execute the command and return its standard output
    pub async fn execute_capture(&self) -> Result<Vec<u8>> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| VoicemintError::Media(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoicemintError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }

    /// Start the command without waiting for it, for long-running players
    pub fn spawn(&self) -> Result<Child> {
        debug!("Spawning media command: {} {:?}", self.binary_path, self.args);

        std::process::Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VoicemintError::Media(format!("{} could not start: {}", self.description, e)))
    }
}

/// Builder for the media operations the dubbing workflow needs
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
    ffplay_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1, S2, S3>(ffmpeg_path: S1, ffprobe_path: S2, ffplay_path: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            ffplay_path: ffplay_path.into(),
        }
    }

    /// Build a command that writes one JPEG frame at `at` seconds to stdout
    pub fn capture_frame<P: AsRef<Path>>(&self, video_path: P, at: f64) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Frame capture")
            .quiet()
            .seek(at)
            .input(video_path)
            .arg("-frames:v").arg("1")
            .video_codec("mjpeg")
            .arg("-f").arg("image2")
            .arg("pipe:1")
    }

    /// Build a command that prints the container duration in seconds
    pub fn probe_duration<P: AsRef<Path>>(&self, media_path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Duration probe")
            .arg("-v").arg("error")
            .arg("-show_entries").arg("format=duration")
            .arg("-of").arg("default=noprint_wrappers=1:nokey=1")
            .output(media_path)
    }

    /// Build a conversion to 16-bit PCM WAV at the given rate and channel count
    pub fn convert_to_pcm_wav<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: P,
        sample_rate: u32,
        channels: u16,
    ) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Audio conversion")
            .quiet()
            .input(input_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(sample_rate)
            .audio_channels(channels)
            .overwrite()
            .output(output_path)
    }

    /// Build a muted, windowed video playback starting at `start` seconds
    pub fn play_video<P: AsRef<Path>>(&self, video_path: P, start: f64) -> MediaCommand {
        MediaCommand::new(&self.ffplay_path, "Video playback")
            .quiet()
            .no_audio()
            .arg("-autoexit")
            .seek(start)
            .output(video_path)
    }

    /// Build a headless audio playback
    pub fn play_audio<P: AsRef<Path>>(&self, audio_path: P) -> MediaCommand {
        MediaCommand::new(&self.ffplay_path, "Audio playback")
            .quiet()
            .arg("-nodisp")
            .arg("-autoexit")
            .output(audio_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Version check")
            .arg("-version")
    }
}
