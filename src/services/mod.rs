// Generative AI collaborators
//
// Script generation, translation, speech synthesis and transcription all go
// through one trait so the workflow can be driven by a fake in tests:
// - catalog: voices and target languages
// - speech: emotion and speed instructions for synthesis
// - gemini: REST implementation

pub mod catalog;
pub mod speech;
pub mod gemini;

use async_trait::async_trait;

pub use catalog::*;
pub use speech::*;
use crate::config::ServiceConfig;
use crate::error::Result;

/// Prompt sent alongside the captured frame
pub const SCRIPT_PROMPT: &str = "You are a creative scriptwriter. Based on the scene in this image, write a descriptive and engaging script for a voice-over that could last around 15 seconds. Describe the atmosphere, potential character thoughts, or the unfolding action. Provide only the script text, without any labels like 'Script:' or quotation marks.";

/// Prompt sent alongside audio to transcribe
pub const TRANSCRIBE_PROMPT: &str = "Transcribe the following audio:";

/// Main trait for the external generative service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Write a voice-over script for a base64 JPEG frame
    async fn generate_script(&self, jpeg_base64: &str) -> Result<String>;

    /// Translate text into the named language
    async fn translate(&self, text: &str, language_name: &str) -> Result<String>;

    /// Synthesize speech; returns base64 16-bit PCM or `None` when the
    /// service produced no audio
    async fn synthesize_speech(
        &self,
        text: &str,
        voice: SynthVoice,
        emotion: u8,
        speed: u8,
    ) -> Result<Option<String>>;

    /// Transcribe base64 audio of the given MIME type
    async fn transcribe(&self, audio_base64: &str, mime_type: &str) -> Result<String>;
}

/// Factory for creating service instances
pub struct ServiceFactory;

impl ServiceFactory {
    /// Create the Gemini-backed service
    pub fn create_service(config: ServiceConfig, api_key: String) -> Result<Box<dyn GenerativeService>> {
        Ok(Box::new(gemini::GeminiService::new(config, api_key)?))
    }
}
