use tracing::warn;

use crate::error::Result;

/// State of one feature panel.
///
/// Replaces separate loading/error/result flags so a panel can never be
/// loading and hold a result at the same time.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState<T> {
    Idle,
    Loading,
    Error(String),
    Success(T),
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T: Clone> PanelState<T> {
    /// Enter Loading, discarding any previous result or error
    pub fn begin(&mut self) {
        *self = Self::Loading;
    }

    /// Record the outcome of an operation and pass it through
    pub fn settle(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                *self = Self::Success(value.clone());
                Ok(value)
            }
            Err(e) => {
                warn!("Operation failed: {}", e);
                *self = Self::Error(e.user_message());
                Err(e)
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoicemintError;

    #[test]
    fn test_success_flow() {
        let mut panel: PanelState<String> = PanelState::default();
        assert_eq!(panel, PanelState::Idle);

        panel.begin();
        assert!(panel.is_loading());

        let value = panel.settle(Ok("transcript".to_string())).unwrap();
        assert_eq!(value, "transcript");
        assert_eq!(panel.success().map(String::as_str), Some("transcript"));
        assert!(!panel.is_loading());
        assert!(panel.error().is_none());
    }

    #[test]
    fn test_error_flow_clears_result() {
        let mut panel = PanelState::Success(1u32);
        panel.begin();
        assert!(panel.success().is_none());

        let result = panel.settle(Err(VoicemintError::Service("quota".to_string())));
        assert!(result.is_err());
        assert_eq!(panel.error(), Some("An error occurred: quota"));
        assert!(panel.success().is_none());
    }

    #[test]
    fn test_validation_message_shown_verbatim() {
        let mut panel: PanelState<u32> = PanelState::Idle;
        let _ = panel.settle(Err(VoicemintError::Validation(
            "Please upload an audio file to transcribe.".to_string(),
        )));
        assert_eq!(panel.error(), Some("Please upload an audio file to transcribe."));

        panel.reset();
        assert_eq!(panel, PanelState::Idle);
    }
}
