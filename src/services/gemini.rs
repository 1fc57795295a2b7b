use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{Result, VoicemintError};
use super::{GenerativeService, SynthVoice, SCRIPT_PROMPT, TRANSCRIBE_PROMPT, build_speech_prompt};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline<S1: Into<String>, S2: Into<String>>(mime_type: S1, data: S2) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
            generation_config: None,
        }
    }

    pub fn speech(text: String, voice: SynthVoice) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part::text(text)],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.name().to_string(),
                        },
                    },
                },
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }

    /// Inline data of the first part of the first candidate
    pub fn inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .parts
            .first()?
            .inline_data
            .as_ref()
            .filter(|data| !data.data.is_empty())
    }
}

/// Gemini REST client
pub struct GeminiService {
    client: Client,
    config: ServiceConfig,
    api_key: String,
}

impl GeminiService {
    pub fn new(config: ServiceConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint_for(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        )
    }

    async fn generate(&self, model: &str, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let url = self.endpoint_for(model);
        debug!("Sending generateContent request to: {}", url);

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| VoicemintError::Service(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VoicemintError::Service(format!(
                "API error {}: {}", status, error_text
            )));
        }

        response.json().await
            .map_err(|e| VoicemintError::Service(format!("Failed to parse response: {}", e)))
    }

    async fn generate_text(&self, parts: Vec<Part>) -> Result<String> {
        let request = GenerateContentRequest::from_parts(parts);
        let response = self.generate(&self.config.text_model, &request).await?;
        response
            .text()
            .ok_or_else(|| VoicemintError::Service("The API returned no text".to_string()))
    }
}

#[async_trait]
impl GenerativeService for GeminiService {
    async fn generate_script(&self, jpeg_base64: &str) -> Result<String> {
        info!("Requesting script for captured frame");
        let script = self
            .generate_text(vec![
                Part::inline("image/jpeg", jpeg_base64),
                Part::text(SCRIPT_PROMPT),
            ])
            .await?;
        Ok(script.trim().to_string())
    }

    async fn translate(&self, text: &str, language_name: &str) -> Result<String> {
        info!("Requesting translation to {}", language_name);
        let prompt = format!(
            "Translate the following text to {}. Provide only the translation, without any additional comments or formatting. Text to translate: \"{}\"",
            language_name, text
        );
        let translation = self.generate_text(vec![Part::text(prompt)]).await?;
        Ok(translation.trim().to_string())
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        voice: SynthVoice,
        emotion: u8,
        speed: u8,
    ) -> Result<Option<String>> {
        let prompt = build_speech_prompt(text, emotion, speed);
        info!("Requesting speech with voice {} (emotion {}, speed {})", voice.name(), emotion, speed);
        debug!("Speech prompt: {}", prompt);

        let request = GenerateContentRequest::speech(prompt, voice);
        let response = self.generate(&self.config.speech_model, &request).await?;

        Ok(response.inline_data().map(|data| data.data.clone()))
    }

    async fn transcribe(&self, audio_base64: &str, mime_type: &str) -> Result<String> {
        info!("Requesting transcription of {} audio", mime_type);
        let transcript = self
            .generate_text(vec![
                Part::inline(mime_type, audio_base64),
                Part::text(TRANSCRIBE_PROMPT),
            ])
            .await?;
        Ok(transcript.trim().to_string())
    }
}
