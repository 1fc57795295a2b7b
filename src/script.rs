use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use tracing::info;

use crate::error::{Result, VoicemintError};
use crate::media::MediaProcessorTrait;
use crate::services::GenerativeService;

/// A still frame captured from a video
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// Position of the frame in seconds
    pub timestamp: f64,
    pub jpeg: Vec<u8>,
}

impl CapturedFrame {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }
}

/// Midpoint of the video, or its start when the duration is unknown
pub fn representative_timestamp(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration / 2.0
    } else {
        0.0
    }
}

/// Step one: seek to the midpoint and capture a frame.
pub async fn extract_representative_frame(
    media: &dyn MediaProcessorTrait,
    video_path: &Path,
) -> Result<CapturedFrame> {
    let duration = media.probe_duration(video_path).await?;
    let timestamp = representative_timestamp(duration);
    let jpeg = media.capture_frame(video_path, timestamp).await?;

    info!("Captured {} byte frame at {:.2}s of {:.2}s", jpeg.len(), timestamp, duration);
    Ok(CapturedFrame { timestamp, jpeg })
}

/// Step two: hand the frame to the script service.
pub async fn generate_script(service: &dyn GenerativeService, frame: &CapturedFrame) -> Result<String> {
    let script = service.generate_script(&frame.to_base64()).await?;
    if script.trim().is_empty() {
        return Err(VoicemintError::Service("The script service returned an empty script".to_string()));
    }
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaProcessorTrait;
    use crate::services::MockGenerativeService;

    #[test]
    fn test_representative_timestamp() {
        assert_eq!(representative_timestamp(30.0), 15.0);
        assert_eq!(representative_timestamp(0.0), 0.0);
        assert_eq!(representative_timestamp(f64::NAN), 0.0);
        assert_eq!(representative_timestamp(f64::INFINITY), 0.0);
    }

    #[tokio::test]
    async fn test_frame_captured_at_midpoint() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe_duration().returning(|_| Ok(8.0));
        media
            .expect_capture_frame()
            .withf(|_, at| *at == 4.0)
            .times(1)
            .returning(|_, _| Ok(vec![0xff, 0xd8, 0xff]));

        let frame = extract_representative_frame(&media, Path::new("clip.mp4")).await.unwrap();

        assert_eq!(frame.timestamp, 4.0);
        assert_eq!(frame.to_base64(), "/9j/");
    }

    #[tokio::test]
    async fn test_unknown_duration_captures_first_frame() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe_duration().returning(|_| Ok(0.0));
        media
            .expect_capture_frame()
            .withf(|_, at| *at == 0.0)
            .returning(|_, _| Ok(vec![1, 2, 3]));

        let frame = extract_representative_frame(&media, Path::new("clip.mp4")).await.unwrap();
        assert_eq!(frame.timestamp, 0.0);
    }

    #[tokio::test]
    async fn test_capture_failure_propagates() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe_duration().returning(|_| Ok(8.0));
        media
            .expect_capture_frame()
            .returning(|_, _| Err(VoicemintError::Media("decoder error".to_string())));

        let result = extract_representative_frame(&media, Path::new("clip.mp4")).await;
        assert!(matches!(result, Err(VoicemintError::Media(_))));
    }

    #[tokio::test]
    async fn test_script_from_frame() {
        let mut service = MockGenerativeService::new();
        service
            .expect_generate_script()
            .withf(|jpeg| jpeg == "AQID")
            .returning(|_| Ok("A quiet harbor at dawn.".to_string()));

        let frame = CapturedFrame { timestamp: 1.0, jpeg: vec![1, 2, 3] };
        let script = generate_script(&service, &frame).await.unwrap();
        assert_eq!(script, "A quiet harbor at dawn.");
    }

    #[tokio::test]
    async fn test_empty_script_is_service_error() {
        let mut service = MockGenerativeService::new();
        service.expect_generate_script().returning(|_| Ok("   ".to_string()));

        let frame = CapturedFrame { timestamp: 0.0, jpeg: vec![0] };
        let result = generate_script(&service, &frame).await;
        assert!(matches!(result, Err(VoicemintError::Service(_))));
    }
}
