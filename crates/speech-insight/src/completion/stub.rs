use super::Completion;
use super::error::CompletionError;
use async_trait::async_trait;
use serde_json::json;

/// Report text returned for coach prompts.
pub const STUB_REPORT: &str = "Communication Overview
- Clarity Score: 85/100 (Good)
- Fluency: Good with structured delivery
- Vocabulary: Advanced level

Confidence & Emotional Tone
- Confidence Level: High
- Nervousness: Low
- Emotional State: Calm and composed

Personality Insights
- Type: Balanced communicator
- Assertiveness: Moderate
- Expressiveness: Moderate

Key Strengths
- Clear and structured communication
- Confident delivery with controlled emotions
- Professional and balanced approach

Improvement Recommendations
- Continue practicing for even more natural flow
- Consider adding more vocal variety for engagement
- Maintain current confident pace

Note: This is a stub response, no completion backend is running.";

/// Deterministic completion keyed on the prompt's role line.
///
/// Used when no real backend is reachable and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubCompletion;

impl StubCompletion {
    pub fn new() -> Self {
        Self
    }

    /// The literal response for `prompt`.
    pub fn respond(prompt: &str) -> String {
        let p = prompt.to_lowercase();

        let value = if p.contains("communication analysis ai agent") {
            json!({
                "clarity_score": 85,
                "fluency_level": "Good",
                "speech_structure": "Structured",
                "vocabulary_level": "Advanced"
            })
        } else if p.contains("confidence & emotion analysis ai agent") {
            json!({
                "confidence_level": "High",
                "nervousness": "Low",
                "emotion": "Calm"
            })
        } else if p.contains("personality mapping ai agent") {
            json!({
                "personality_type": "Balanced",
                "assertiveness": "Moderate",
                "expressiveness": "Moderate"
            })
        } else if p.contains("communication coach") {
            return STUB_REPORT.to_string();
        } else {
            json!({
                "message": "stub response",
                "note": "no completion backend running, using fallback"
            })
        };

        value.to_string()
    }
}

#[async_trait]
impl Completion for StubCompletion {
    fn name(&self) -> &str {
        "stub"
    }

    async fn invoke(&self, prompt: &str) -> Result<String, CompletionError> {
        Ok(Self::respond(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parsed(prompt: &str) -> Value {
        serde_json::from_str(&StubCompletion::respond(prompt)).unwrap()
    }

    #[test]
    fn test_role_lines_select_records() {
        assert_eq!(
            parsed("You are a Communication Analysis AI Agent.")["clarity_score"],
            85
        );
        assert_eq!(
            parsed("You are a Confidence & Emotion Analysis AI Agent.")["emotion"],
            "Calm"
        );
        assert_eq!(
            parsed("You are a Personality Mapping AI Agent.")["personality_type"],
            "Balanced"
        );
        assert_eq!(parsed("hello")["message"], "stub response");
    }

    #[tokio::test]
    async fn test_report_prompt_returns_text() {
        let text = StubCompletion
            .invoke("You are an AI Communication Coach generating a personalized report.")
            .await
            .unwrap();
        assert!(text.starts_with("Communication Overview"));
    }
}
