/// Emotion and speed scalars below this are "low"
const LOW_THRESHOLD: u8 = 30;

/// Emotion and speed scalars above this are "high"
const HIGH_THRESHOLD: u8 = 70;

fn emotion_modifier(emotion: u8) -> Option<&'static str> {
    if emotion < LOW_THRESHOLD {
        Some(" in a sad, melancholic tone")
    } else if emotion > HIGH_THRESHOLD {
        Some(" in a happy, energetic tone")
    } else {
        None
    }
}

fn speed_modifier(speed: u8) -> Option<&'static str> {
    if speed < LOW_THRESHOLD {
        Some(" and speak slowly")
    } else if speed > HIGH_THRESHOLD {
        Some(" and speak quickly")
    } else {
        None
    }
}

/// Text submitted for synthesis.
///
/// Emotion and speed run 0 (sad, slow) to 100 (happy, fast). Values in
/// 30..=70 add nothing; when neither adds anything the text goes out as is.
pub fn build_speech_prompt(text: &str, emotion: u8, speed: u8) -> String {
    let emotion = emotion_modifier(emotion.min(100));
    let speed = speed_modifier(speed.min(100));

    if emotion.is_none() && speed.is_none() {
        return text.to_string();
    }

    format!(
        "Say the following{}{}: {}",
        emotion.unwrap_or(""),
        speed.unwrap_or(""),
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sad_and_slow() {
        let prompt = build_speech_prompt("Hello there", 20, 20);
        assert!(prompt.contains("sad"));
        assert!(prompt.contains("slowly"));
        assert_eq!(
            prompt,
            "Say the following in a sad, melancholic tone and speak slowly: Hello there"
        );
    }

    #[test]
    fn test_neutral_text_sent_verbatim() {
        assert_eq!(build_speech_prompt("Hello there", 50, 50), "Hello there");
        assert_eq!(build_speech_prompt("Hello there", 30, 70), "Hello there");
    }

    #[test]
    fn test_happy_and_quick() {
        let prompt = build_speech_prompt("Hello there", 90, 90);
        assert!(prompt.contains("happy"));
        assert!(prompt.contains("quickly"));
    }

    #[test]
    fn test_single_modifier() {
        assert_eq!(
            build_speech_prompt("Hi", 50, 100),
            "Say the following and speak quickly: Hi"
        );
        assert_eq!(
            build_speech_prompt("Hi", 0, 50),
            "Say the following in a sad, melancholic tone: Hi"
        );
    }
}
