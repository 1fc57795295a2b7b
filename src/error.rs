use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoicemintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Audio decode error: {0}")]
    Decode(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("{0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl VoicemintError {
    /// Message shown to the user when an operation on a feature panel fails.
    ///
    /// Validation failures are already phrased for the user and are shown as is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            other => format!("An error occurred: {}", other.detail()),
        }
    }

    /// The message without its category prefix for failures raised by this
    /// crate; wrapped library errors keep their full description.
    pub fn detail(&self) -> String {
        match self {
            Self::Service(message) | Self::Media(message) | Self::Decode(message) | Self::Validation(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl From<base64::DecodeError> for VoicemintError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Decode(format!("Invalid base64 audio: {}", e))
    }
}

impl From<hound::Error> for VoicemintError {
    fn from(e: hound::Error) -> Self {
        Self::Decode(format!("Invalid WAV data: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, VoicemintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let e = VoicemintError::Validation("Please enter some text to generate speech.".to_string());
        assert_eq!(e.user_message(), "Please enter some text to generate speech.");

        let e = VoicemintError::Service("quota exceeded".to_string());
        assert_eq!(e.user_message(), "An error occurred: quota exceeded");

        let e = VoicemintError::Decode("Invalid base64 audio: bad byte".to_string());
        assert_eq!(e.user_message(), "An error occurred: Invalid base64 audio: bad byte");

        let e = VoicemintError::FileNotFound("clip.mp4".to_string());
        assert_eq!(e.user_message(), "An error occurred: File not found: clip.mp4");
    }
}
