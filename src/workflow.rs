use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;

use crate::audio::{DecodedAudioBuffer, WavSpec, decode_base64, decode_pcm16, decode_wav, encode_wav};
use crate::config::{Config, SPEECH_BITS_PER_SAMPLE};
use crate::error::{Result, VoicemintError};
use crate::media::MediaProcessorTrait;
use crate::panel::PanelState;
use crate::script::{extract_representative_frame, generate_script};
use crate::services::{GenerativeService, SynthVoice, Voice, language_name};

const NO_AUDIO_MESSAGE: &str = "Failed to generate audio. The API returned no data.";
const DUB_REQUIREMENTS_MESSAGE: &str = "A script must be generated and an AI voice selected.";

/// Parameters of one dubbing run
#[derive(Debug, Clone)]
pub struct DubRequest {
    pub script: String,
    /// Language code, e.g. "ja"
    pub language: String,
    pub voice: Voice,
    pub emotion: u8,
    pub speed: u8,
}

/// Audio ready to be played against the video
#[derive(Debug, Clone)]
pub struct DubbingOutput {
    /// The translated script; `None` for user-supplied audio
    pub translated_script: Option<String>,
    pub audio: Arc<DecodedAudioBuffer>,
}

/// The feature panels of the application.
///
/// Each panel's state moves to Loading when an operation starts and settles
/// to Success or Error when it ends. A second request simply overwrites the
/// panel.
pub struct Workflow {
    config: Config,
    service: Box<dyn GenerativeService>,
    media: Box<dyn MediaProcessorTrait>,
    pub script: PanelState<String>,
    pub dubbing: PanelState<DubbingOutput>,
    pub tts: PanelState<PathBuf>,
    pub stt: PanelState<String>,
}

impl Workflow {
    pub fn new(
        config: Config,
        service: Box<dyn GenerativeService>,
        media: Box<dyn MediaProcessorTrait>,
    ) -> Self {
        Self {
            config,
            service,
            media,
            script: PanelState::Idle,
            dubbing: PanelState::Idle,
            tts: PanelState::Idle,
            stt: PanelState::Idle,
        }
    }

    pub fn media(&self) -> &dyn MediaProcessorTrait {
        self.media.as_ref()
    }

    fn speech_spec(&self) -> WavSpec {
        WavSpec::new(self.config.audio.sample_rate, self.config.audio.channels, SPEECH_BITS_PER_SAMPLE)
    }

    /// Generate a voice-over script from a frame in the middle of the video
    pub async fn generate_script(&mut self, video_path: &Path) -> Result<String> {
        info!("Generating script for {}", video_path.display());
        self.script.begin();

        let result: Result<String> = async {
            if !video_path.exists() {
                return Err(VoicemintError::FileNotFound(video_path.display().to_string()));
            }
            let frame = extract_representative_frame(self.media.as_ref(), video_path).await?;
            generate_script(self.service.as_ref(), &frame).await
        }
        .await;

        self.script.settle(result)
    }

    /// Reject a custom voice before anything is sent to the service
    pub fn check_dub_voice(&mut self, voice: &Voice) -> Result<SynthVoice> {
        voice.synth().map_err(|_| {
            let e = VoicemintError::Validation(DUB_REQUIREMENTS_MESSAGE.to_string());
            self.dubbing = PanelState::Error(e.user_message());
            e
        })
    }

    /// Translate the script, synthesize the translation, decode the audio
    pub async fn dub(&mut self, request: &DubRequest) -> Result<DubbingOutput> {
        let voice = match (request.voice.synth(), request.script.trim().is_empty()) {
            (Ok(voice), false) => voice,
            _ => {
                return self.dubbing.settle(Err(VoicemintError::Validation(
                    DUB_REQUIREMENTS_MESSAGE.to_string(),
                )));
            }
        };

        self.dubbing.begin();
        let language = language_name(&request.language);
        info!("Dubbing into {} with voice {}", language, voice.name());

        let result: Result<DubbingOutput> = async {
            let translated = self.service.translate(&request.script, language).await?;
            info!("Translated script: {}", translated);

            let audio = self
                .service
                .synthesize_speech(&translated, voice, request.emotion, request.speed)
                .await?
                .ok_or_else(|| VoicemintError::Service(NO_AUDIO_MESSAGE.to_string()))?;

            let bytes = decode_base64(&audio)?;
            let buffer = decode_pcm16(&bytes, self.config.audio.sample_rate, self.config.audio.channels)?;
            info!("Dubbed audio is {:.2}s long", buffer.duration());

            Ok(DubbingOutput {
                translated_script: Some(translated),
                audio: Arc::new(buffer),
            })
        }
        .await;

        self.dubbing.settle(result)
    }

    /// Use a recording supplied by the user instead of synthesized speech
    pub async fn load_custom_audio(&mut self, audio_path: &Path) -> Result<DubbingOutput> {
        info!("Processing custom audio {}", audio_path.display());
        self.dubbing.begin();

        let result: Result<DubbingOutput> = async {
            let converted = tempfile::Builder::new()
                .prefix("voicemint-custom-")
                .suffix(".wav")
                .tempfile()?
                .into_temp_path();

            self.media
                .convert_to_pcm_wav(
                    audio_path,
                    &converted,
                    self.config.audio.sample_rate,
                    self.config.audio.channels,
                )
                .await?;

            let bytes = fs::read(&converted).await?;
            let buffer = decode_wav(&bytes)?;
            info!("Custom audio is {:.2}s long", buffer.duration());

            Ok(DubbingOutput {
                translated_script: None,
                audio: Arc::new(buffer),
            })
        }
        .await;

        let result = result.map_err(|e| {
            VoicemintError::Validation(format!(
                "Failed to process audio file: {}. Please ensure it's a valid audio format.",
                e.detail()
            ))
        });
        self.dubbing.settle(result)
    }

    /// Write dubbed audio to a WAV file
    pub async fn export_wav(&self, output: &DubbingOutput, path: &Path) -> Result<()> {
        let buffer = &output.audio;
        let spec = WavSpec::new(buffer.sample_rate(), buffer.channel_count(), SPEECH_BITS_PER_SAMPLE);
        let wav = encode_wav(&buffer.to_pcm16_le(), spec)?;
        write_output(path, wav.as_bytes()).await?;
        info!("Wrote {} ({} bytes)", path.display(), wav.len());
        Ok(())
    }

    /// Synthesize text and save it as a WAV file
    pub async fn text_to_speech(
        &mut self,
        text: &str,
        voice: Voice,
        emotion: u8,
        speed: u8,
        output_path: &Path,
    ) -> Result<PathBuf> {
        if text.trim().is_empty() {
            return self.tts.settle(Err(VoicemintError::Validation(
                "Please enter some text to generate speech.".to_string(),
            )));
        }
        let voice = match voice.synth() {
            Ok(voice) => voice,
            Err(e) => return self.tts.settle(Err(e)),
        };

        self.tts.begin();

        let result: Result<PathBuf> = async {
            let audio = self
                .service
                .synthesize_speech(text, voice, emotion, speed)
                .await?
                .ok_or_else(|| VoicemintError::Service(NO_AUDIO_MESSAGE.to_string()))?;

            let pcm = decode_base64(&audio)?;
            let wav = encode_wav(&pcm, self.speech_spec())?;
            write_output(output_path, wav.as_bytes()).await?;
            info!("Wrote {} ({} bytes)", output_path.display(), wav.len());

            Ok(output_path.to_path_buf())
        }
        .await;

        self.tts.settle(result)
    }

    /// Transcribe an audio file
    pub async fn transcribe(&mut self, audio_path: Option<&Path>) -> Result<String> {
        let Some(audio_path) = audio_path else {
            return self.stt.settle(Err(VoicemintError::Validation(
                "Please upload an audio file to transcribe.".to_string(),
            )));
        };

        self.stt.begin();

        let result: Result<String> = async {
            if !audio_path.exists() {
                return Err(VoicemintError::FileNotFound(audio_path.display().to_string()));
            }
            let bytes = fs::read(audio_path).await?;
            let mime_type = mime_type_for(audio_path);
            info!("Transcribing {} ({}, {} bytes)", audio_path.display(), mime_type, bytes.len());

            self.service.transcribe(&STANDARD.encode(&bytes), mime_type).await
        }
        .await;

        self.stt.settle(result)
    }
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;
    Ok(())
}

/// MIME type reported to the transcription service, from the file extension
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaProcessorTrait;
    use crate::services::MockGenerativeService;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    fn workflow(service: MockGenerativeService, media: MockMediaProcessorTrait) -> Workflow {
        Workflow::new(Config::default(), Box::new(service), Box::new(media))
    }

    fn request(script: &str, voice: Voice) -> DubRequest {
        DubRequest {
            script: script.to_string(),
            language: "ja".to_string(),
            voice,
            emotion: 50,
            speed: 50,
        }
    }

    #[tokio::test]
    async fn test_dub_synthesizes_the_translation() {
        let mut service = MockGenerativeService::new();
        service
            .expect_translate()
            .withf(|text, language| text == "A quiet harbor." && language == "Japanese")
            .times(1)
            .returning(|_, _| Ok("静かな港。".to_string()));
        service
            .expect_synthesize_speech()
            .withf(|text, voice, _, _| text == "静かな港。" && *voice == SynthVoice::Kore)
            .times(1)
            .returning(|_, _, _, _| Ok(Some("AAH/fw==".to_string())));

        let mut flow = workflow(service, MockMediaProcessorTrait::new());
        let output = flow
            .dub(&request("A quiet harbor.", Voice::Synth(SynthVoice::Kore)))
            .await
            .unwrap();

        assert_eq!(output.translated_script.as_deref(), Some("静かな港。"));
        assert_eq!(output.audio.sample_rate(), 24_000);
        assert_eq!(output.audio.frames(), 2);
        assert!(flow.dubbing.success().is_some());
    }

    #[tokio::test]
    async fn test_dub_without_audio_is_error() {
        let mut service = MockGenerativeService::new();
        service.expect_translate().returning(|_, _| Ok("hola".to_string()));
        service.expect_synthesize_speech().returning(|_, _, _, _| Ok(None));

        let mut flow = workflow(service, MockMediaProcessorTrait::new());
        let result = flow.dub(&request("hello", Voice::default())).await;

        assert!(matches!(result, Err(VoicemintError::Service(_))));
        assert_eq!(
            flow.dubbing.error(),
            Some("An error occurred: Failed to generate audio. The API returned no data.")
        );
    }

    #[tokio::test]
    async fn test_translation_failure_skips_synthesis() {
        let mut service = MockGenerativeService::new();
        service
            .expect_translate()
            .returning(|_, _| Err(VoicemintError::Service("quota exceeded".to_string())));
        service.expect_synthesize_speech().never();

        let mut flow = workflow(service, MockMediaProcessorTrait::new());
        assert!(flow.dub(&request("hello", Voice::default())).await.is_err());
        assert!(flow.dubbing.error().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_dub_requires_script_and_ai_voice() {
        let mut service = MockGenerativeService::new();
        service.expect_translate().never();

        let mut flow = workflow(service, MockMediaProcessorTrait::new());

        let result = flow.dub(&request("   ", Voice::default())).await;
        assert!(matches!(result, Err(VoicemintError::Validation(_))));

        let result = flow.dub(&request("hello", Voice::Custom)).await;
        assert!(matches!(result, Err(VoicemintError::Validation(_))));
        assert_eq!(flow.dubbing.error(), Some("A script must be generated and an AI voice selected."));
    }

    #[test]
    fn test_custom_voice_rejected_before_any_request() {
        let mut service = MockGenerativeService::new();
        service.expect_generate_script().never();
        service.expect_translate().never();

        let mut flow = workflow(service, MockMediaProcessorTrait::new());
        let result = flow.check_dub_voice(&Voice::Custom);
        assert!(matches!(result, Err(VoicemintError::Validation(_))));
        assert_eq!(flow.dubbing.error(), Some("A script must be generated and an AI voice selected."));

        assert_eq!(flow.check_dub_voice(&Voice::Synth(SynthVoice::Charon)).unwrap(), SynthVoice::Charon);
    }

    #[tokio::test]
    async fn test_malformed_audio_is_decode_error() {
        let mut service = MockGenerativeService::new();
        service.expect_translate().returning(|_, _| Ok("hola".to_string()));
        service
            .expect_synthesize_speech()
            .returning(|_, _, _, _| Ok(Some("%%%".to_string())));

        let mut flow = workflow(service, MockMediaProcessorTrait::new());
        let result = flow.dub(&request("hello", Voice::default())).await;
        assert!(matches!(result, Err(VoicemintError::Decode(_))));
    }

    #[tokio::test]
    async fn test_text_to_speech_writes_wav() {
        let dir = TempDir::new().unwrap();
        let output = dir.child("out/speech.wav");

        let mut service = MockGenerativeService::new();
        service
            .expect_synthesize_speech()
            .withf(|text, voice, emotion, speed| {
                text == "Hello" && *voice == SynthVoice::Puck && *emotion == 90 && *speed == 20
            })
            .returning(|_, _, _, _| Ok(Some("AAH/fw==".to_string())));

        let mut flow = workflow(service, MockMediaProcessorTrait::new());
        let path = flow
            .text_to_speech("Hello", Voice::Synth(SynthVoice::Puck), 90, 20, output.path())
            .await
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 44 + 4);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[44..], &[0x00, 0x01, 0xff, 0x7f]);
        assert_eq!(flow.tts.success(), Some(&path));
    }

    #[tokio::test]
    async fn test_text_to_speech_validation() {
        let mut service = MockGenerativeService::new();
        service.expect_synthesize_speech().never();
        let mut flow = workflow(service, MockMediaProcessorTrait::new());

        let result = flow
            .text_to_speech("  ", Voice::default(), 50, 50, Path::new("x.wav"))
            .await;
        assert!(matches!(result, Err(VoicemintError::Validation(_))));
        assert_eq!(flow.tts.error(), Some("Please enter some text to generate speech."));

        let result = flow
            .text_to_speech("Hello", Voice::Custom, 50, 50, Path::new("x.wav"))
            .await;
        assert!(matches!(result, Err(VoicemintError::Validation(_))));
        assert_eq!(flow.tts.error(), Some("Please select a valid AI voice."));
    }

    #[tokio::test]
    async fn test_transcribe_sends_base64_and_mime_type() {
        let dir = TempDir::new().unwrap();
        let audio = dir.child("memo.mp3");
        audio.write_binary(&[1, 2, 3]).unwrap();

        let mut service = MockGenerativeService::new();
        service
            .expect_transcribe()
            .withf(|data, mime| data == "AQID" && mime == "audio/mpeg")
            .returning(|_, _| Ok("remember the milk".to_string()));

        let mut flow = workflow(service, MockMediaProcessorTrait::new());
        let transcript = flow.transcribe(Some(audio.path())).await.unwrap();

        assert_eq!(transcript, "remember the milk");
        assert_eq!(flow.stt.success().map(String::as_str), Some("remember the milk"));
    }

    #[tokio::test]
    async fn test_transcribe_requires_file() {
        let mut flow = workflow(MockGenerativeService::new(), MockMediaProcessorTrait::new());
        let result = flow.transcribe(None).await;
        assert!(matches!(result, Err(VoicemintError::Validation(_))));
        assert_eq!(flow.stt.error(), Some("Please upload an audio file to transcribe."));
    }

    #[tokio::test]
    async fn test_generate_script_for_missing_video() {
        let mut flow = workflow(MockGenerativeService::new(), MockMediaProcessorTrait::new());
        let result = flow.generate_script(Path::new("/nonexistent/clip.mp4")).await;
        assert!(matches!(result, Err(VoicemintError::FileNotFound(_))));
        assert!(flow.script.error().is_some());
    }

    #[tokio::test]
    async fn test_generate_script_pipeline() {
        let dir = TempDir::new().unwrap();
        let video = dir.child("clip.mp4");
        video.touch().unwrap();

        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe_duration().returning(|_| Ok(20.0));
        media
            .expect_capture_frame()
            .withf(|_, at| *at == 10.0)
            .returning(|_, _| Ok(vec![0xff, 0xd8, 0xff]));

        let mut service = MockGenerativeService::new();
        service
            .expect_generate_script()
            .withf(|jpeg| jpeg == "/9j/")
            .returning(|_| Ok("Waves crash against the pier.".to_string()));

        let mut flow = workflow(service, media);
        let script = flow.generate_script(video.path()).await.unwrap();
        assert_eq!(script, "Waves crash against the pier.");
        assert_eq!(flow.script.success().map(String::as_str), Some("Waves crash against the pier."));
    }

    #[tokio::test]
    async fn test_custom_audio_replaces_dub() {
        let dir = TempDir::new().unwrap();
        let source = dir.child("voice.m4a");
        source.touch().unwrap();

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_convert_to_pcm_wav()
            .withf(|_, _, rate, channels| *rate == 24_000 && *channels == 1)
            .returning(|_, output, _, _| {
                let pcm: Vec<u8> = [0i16, 500, -500].iter().flat_map(|s| s.to_le_bytes()).collect();
                let wav = encode_wav(&pcm, WavSpec::new(24_000, 1, 16))?;
                std::fs::write(output, wav.as_bytes())?;
                Ok(())
            });

        let mut flow = workflow(MockGenerativeService::new(), media);
        let output = flow.load_custom_audio(source.path()).await.unwrap();

        assert!(output.translated_script.is_none());
        assert_eq!(output.audio.frames(), 3);
        assert!(flow.dubbing.success().is_some());
    }

    #[tokio::test]
    async fn test_unreadable_custom_audio_message() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_convert_to_pcm_wav()
            .returning(|_, _, _, _| Err(VoicemintError::Media("Audio conversion failed: moov atom not found".to_string())));

        let mut flow = workflow(MockGenerativeService::new(), media);
        let result = flow.load_custom_audio(Path::new("broken.m4a")).await;

        assert!(result.is_err());
        assert_eq!(
            flow.dubbing.error(),
            Some("Failed to process audio file: Audio conversion failed: moov atom not found. Please ensure it's a valid audio format.")
        );
    }

    #[tokio::test]
    async fn test_export_wav_roundtrips_buffer() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("dub.wav");
        let pcm: Vec<u8> = [7i16, -7, 1234].iter().flat_map(|s| s.to_le_bytes()).collect();
        let output = DubbingOutput {
            translated_script: None,
            audio: Arc::new(decode_pcm16(&pcm, 24_000, 1).unwrap()),
        };

        let flow = workflow(MockGenerativeService::new(), MockMediaProcessorTrait::new());
        flow.export_wav(&output, path.path()).await.unwrap();

        let bytes = std::fs::read(path.path()).unwrap();
        assert_eq!(&bytes[44..], pcm.as_slice());
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("a.WAV")), "audio/wav");
        assert_eq!(mime_type_for(Path::new("a.mp3")), "audio/mpeg");
        assert_eq!(mime_type_for(Path::new("a")), "application/octet-stream");
    }

    #[test]
    fn test_new_workflow_panels_idle() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_check_availability().times(1).returning(|| Ok(()));

        let flow = workflow(MockGenerativeService::new(), media);
        assert_eq!(flow.script, PanelState::Idle);
        assert_eq!(flow.stt, PanelState::Idle);
        assert!(!flow.dubbing.is_loading());
        assert!(tokio_test::block_on(flow.media().check_availability()).is_ok());
    }
}
