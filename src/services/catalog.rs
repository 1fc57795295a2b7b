use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VoicemintError;

/// Prebuilt voice the synthesis service can speak with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynthVoice {
    Zephyr,
    Kore,
    Puck,
    Charon,
    Fenrir,
}

impl SynthVoice {
    pub const ALL: [SynthVoice; 5] = [
        SynthVoice::Zephyr,
        SynthVoice::Kore,
        SynthVoice::Puck,
        SynthVoice::Charon,
        SynthVoice::Fenrir,
    ];

    /// Identifier sent to the service
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zephyr => "Zephyr",
            Self::Kore => "Kore",
            Self::Puck => "Puck",
            Self::Charon => "Charon",
            Self::Fenrir => "Fenrir",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Zephyr => "Zephyr (Friendly)",
            Self::Kore => "Kore (Calm)",
            Self::Puck => "Puck (Playful)",
            Self::Charon => "Charon (Deep)",
            Self::Fenrir => "Fenrir (Assertive)",
        }
    }
}

/// Voice selection: a prebuilt voice or audio the user supplies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    Synth(SynthVoice),
    Custom,
}

impl Voice {
    /// The prebuilt voice, or a validation error for a custom selection
    pub fn synth(&self) -> Result<SynthVoice, VoicemintError> {
        match self {
            Self::Synth(voice) => Ok(*voice),
            Self::Custom => Err(VoicemintError::Validation(
                "Please select a valid AI voice.".to_string(),
            )),
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::Synth(SynthVoice::Zephyr)
    }
}

impl FromStr for Voice {
    type Err = VoicemintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("custom") {
            return Ok(Self::Custom);
        }
        SynthVoice::ALL
            .iter()
            .find(|voice| voice.name().eq_ignore_ascii_case(s))
            .map(|voice| Self::Synth(*voice))
            .ok_or_else(|| VoicemintError::Validation(format!("Unknown voice: {}", s)))
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synth(voice) => f.write_str(voice.name()),
            Self::Custom => f.write_str("custom"),
        }
    }
}

/// Target languages offered for dubbing, as (code, display name)
pub const LANGUAGES: [(&str, &str); 12] = [
    ("ar", "Arabic"),
    ("zh", "Chinese (Mandarin)"),
    ("en", "English"),
    ("fr", "French"),
    ("de", "German"),
    ("hi", "Hindi"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("es", "Spanish"),
];

/// Display name for a language code; unknown codes pass through unchanged
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_parsing() {
        assert_eq!("kore".parse::<Voice>().unwrap(), Voice::Synth(SynthVoice::Kore));
        assert_eq!("Custom".parse::<Voice>().unwrap(), Voice::Custom);
        assert!("Nova".parse::<Voice>().is_err());
    }

    #[test]
    fn test_custom_voice_cannot_synthesize() {
        assert!(matches!(Voice::Custom.synth(), Err(VoicemintError::Validation(_))));
        assert_eq!(Voice::default().synth().unwrap(), SynthVoice::Zephyr);
    }

    #[test]
    fn test_language_name_lookup() {
        assert_eq!(language_name("ja"), "Japanese");
        assert_eq!(language_name("ZH"), "Chinese (Mandarin)");
        assert_eq!(language_name("Klingon"), "Klingon");
    }
}
