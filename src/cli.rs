use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::services::Voice;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Sign in to an existing account
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List available AI voices
    Voices,

    /// List available target languages
    Languages,

    /// Generate a voice-over script from a frame of the video
    Script {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Dub a video: generate or take a script, translate it, synthesize speech
    Dub {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language code
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Voice to synthesize with
        #[arg(long, default_value = "Zephyr")]
        voice: Voice,

        /// Emotion from 0 (sad) to 100 (happy)
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
        emotion: u8,

        /// Speed from 0 (slow) to 100 (fast)
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
        speed: u8,

        /// Use this script instead of generating one from the video
        #[arg(short, long)]
        script: Option<String>,

        /// Use your own recording instead of an AI voice
        #[arg(long)]
        custom_audio: Option<PathBuf>,

        /// Output WAV file (defaults to <video>_<language>.wav next to the video)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Play the dubbed audio against the muted video when done
        #[arg(long)]
        play: bool,
    },

    /// Convert text to speech
    Tts {
        /// Text to speak
        #[arg(short, long)]
        text: String,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Voice to synthesize with
        #[arg(long, default_value = "Zephyr")]
        voice: Voice,

        /// Emotion from 0 (sad) to 100 (happy)
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
        emotion: u8,

        /// Speed from 0 (slow) to 100 (fast)
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
        speed: u8,
    },

    /// Transcribe an audio file
    Stt {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Play a WAV file synchronized with a muted video
    Play {
        /// Video file
        #[arg(long)]
        video: PathBuf,

        /// WAV file holding the dubbed audio
        #[arg(long)]
        audio: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SynthVoice;

    #[test]
    fn test_parse_dub() {
        let args = Args::try_parse_from([
            "voicemint", "dub", "-i", "clip.mp4", "-l", "ja", "--voice", "Kore", "--emotion", "90", "--play",
        ])
        .unwrap();

        match args.command {
            Commands::Dub { input, language, voice, emotion, speed, play, .. } => {
                assert_eq!(input, PathBuf::from("clip.mp4"));
                assert_eq!(language, "ja");
                assert_eq!(voice, Voice::Synth(SynthVoice::Kore));
                assert_eq!(emotion, 90);
                assert_eq!(speed, 50);
                assert!(play);
            }
            _ => panic!("expected dub"),
        }
    }

    #[test]
    fn test_emotion_out_of_range_rejected() {
        let result = Args::try_parse_from(["voicemint", "tts", "-t", "hi", "-o", "a.wav", "--emotion", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_voice_rejected() {
        let result = Args::try_parse_from(["voicemint", "tts", "-t", "hi", "-o", "a.wav", "--voice", "Nova"]);
        assert!(result.is_err());
    }
}
