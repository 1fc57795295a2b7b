use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, VoicemintError};

/// Sample rate of the PCM produced by the speech synthesis service
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Channel count of the PCM produced by the speech synthesis service
pub const SPEECH_CHANNELS: u16 = 1;

/// Bits per sample of the PCM produced by the speech synthesis service
pub const SPEECH_BITS_PER_SAMPLE: u16 = 16;

fn default_tick_millis() -> u64 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub media: MediaConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the generative language API
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Model used for script generation, translation and transcription
    pub text_model: String,
    /// Model used for speech synthesis
    pub speech_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate the synthesized PCM is tagged with
    pub sample_rate: u32,
    /// Channel count the synthesized PCM is tagged with
    pub channels: u16,
    /// Interval between progress updates during playback
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Path to ffplay binary
    pub ffplay_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the session record and registered users
    pub data_dir: PathBuf,
    /// Digest rounds applied when storing a password
    pub hash_rounds: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                endpoint: "https://generativelanguage.googleapis.com".to_string(),
                api_key_env: "API_KEY".to_string(),
                text_model: "gemini-2.5-flash".to_string(),
                speech_model: "gemini-2.5-flash-preview-tts".to_string(),
                timeout_secs: 120,
            },
            audio: AudioConfig {
                sample_rate: SPEECH_SAMPLE_RATE,
                channels: SPEECH_CHANNELS,
                tick_millis: default_tick_millis(),
            },
            media: MediaConfig {
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
                ffplay_path: "ffplay".to_string(),
            },
            session: SessionConfig {
                data_dir: PathBuf::from(".voicemint"),
                hash_rounds: 100_000,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VoicemintError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VoicemintError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VoicemintError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VoicemintError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.service.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(VoicemintError::Config(format!(
                "{} environment variable is not set",
                self.service.api_key_env
            ))),
        }
    }
}
