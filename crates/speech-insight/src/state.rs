//! Per-job analysis state and the shapes of degraded records.

use serde_json::{Map, Value, json};
use std::fmt;
use thiserror::Error;

/// Status value carried by a record produced from a failed stage.
pub const STATUS_FAILED: &str = "failed";

/// Status value carried by a record whose completion text never parsed.
pub const STATUS_PARSE_FAILED: &str = "parse_failed";

/// Input key holding the transcript text.
pub const TRANSCRIPT_KEY: &str = "transcript";

/// Input key holding the acoustic feature mapping.
pub const AUDIO_FEATURES_KEY: &str = "audio_features";

/// Identifies one of the three fixed analysis stages.
///
/// The order of [`StageKey::ORDER`] is the execution order; each stage may read
/// the results of the stages before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKey {
    Communication,
    ConfidenceEmotion,
    Personality,
}

impl StageKey {
    /// All stages, in execution order.
    pub const ORDER: [StageKey; 3] = [
        StageKey::Communication,
        StageKey::ConfidenceEmotion,
        StageKey::Personality,
    ];

    /// The result key this stage writes into the combined result.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKey::Communication => "communication_analysis",
            StageKey::ConfidenceEmotion => "confidence_emotion_analysis",
            StageKey::Personality => "personality_analysis",
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A required input key was missing or had the wrong shape.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputContractError {
    #[error("Input must be a JSON object")]
    NotAnObject,

    #[error("Missing required input key: '{0}'")]
    MissingKey(&'static str),

    #[error("Input key '{key}' must be {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },
}

/// The mutable record threaded through the stages of a single job.
///
/// Starts as the job input (`transcript`, `audio_features`) and gains one key
/// per completed stage. Keys are never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisState {
    entries: Map<String, Value>,
}

impl AnalysisState {
    /// Builds the initial state, enforcing the input contract.
    pub fn from_input(input: Value) -> Result<Self, InputContractError> {
        let Value::Object(entries) = input else {
            return Err(InputContractError::NotAnObject);
        };

        match entries.get(TRANSCRIPT_KEY) {
            None | Some(Value::Null) => {
                return Err(InputContractError::MissingKey(TRANSCRIPT_KEY));
            }
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(InputContractError::WrongType {
                    key: TRANSCRIPT_KEY,
                    expected: "a string",
                });
            }
        }

        match entries.get(AUDIO_FEATURES_KEY) {
            None | Some(Value::Null) => {
                return Err(InputContractError::MissingKey(AUDIO_FEATURES_KEY));
            }
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(InputContractError::WrongType {
                    key: AUDIO_FEATURES_KEY,
                    expected: "an object",
                });
            }
        }

        Ok(Self { entries })
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn transcript(&self) -> Option<&str> {
        self.entries.get(TRANSCRIPT_KEY).and_then(Value::as_str)
    }

    pub fn audio_features(&self) -> Option<&Map<String, Value>> {
        self.entries.get(AUDIO_FEATURES_KEY).and_then(Value::as_object)
    }

    /// Returns the recorded output of an earlier stage.
    pub fn stage_output(&self, key: StageKey) -> Option<&Value> {
        self.entries.get(key.as_str())
    }

    /// Returns the recorded output of an earlier stage when it is a mapping.
    pub fn stage_record(&self, key: StageKey) -> Option<&Map<String, Value>> {
        self.stage_output(key).and_then(Value::as_object)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Records a stage result so later stages can read it.
    pub(crate) fn merge(&mut self, key: StageKey, value: Value) {
        self.entries.insert(key.as_str().to_string(), value);
    }

    /// Replaces the transcript with a sanitized version.
    pub(crate) fn replace_transcript(&mut self, transcript: String) {
        self.entries
            .insert(TRANSCRIPT_KEY.to_string(), Value::String(transcript));
    }
}

/// Builds the `{error, status: "failed"}` record used for stage and job failures.
pub fn failed_record(error: impl fmt::Display) -> Value {
    json!({
        "error": error.to_string(),
        "status": STATUS_FAILED,
    })
}

/// Returns true when a stage result carries the degraded shape.
///
/// The tag is structural: any mapping holding an `error` or `status` key.
pub fn is_degraded(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key("error") || map.contains_key("status"))
}

/// Renders a feature value for prompts and queries, `"N/A"` when absent.
pub fn feature_text(features: Option<&Map<String, Value>>, key: &str) -> String {
    match features.and_then(|f| f.get(key)) {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Reads a numeric feature, ignoring non-numeric values.
pub fn feature_number(features: Option<&Map<String, Value>>, key: &str) -> Option<f64> {
    features.and_then(|f| f.get(key)).and_then(Value::as_f64)
}

/// Truncates to at most `limit` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> Value {
        json!({
            "transcript": "This is a test.",
            "audio_features": {
                "speech_rate": 140,
                "pitch_variance": 20,
                "pause_ratio": 0.1,
                "energy_level": "high"
            }
        })
    }

    #[test]
    fn test_from_input_accepts_well_formed_input() {
        let state = AnalysisState::from_input(sample_input()).unwrap();
        assert_eq!(state.transcript(), Some("This is a test."));
        assert_eq!(
            feature_number(state.audio_features(), "speech_rate"),
            Some(140.0)
        );
    }

    #[test]
    fn test_from_input_rejects_missing_transcript() {
        let err = AnalysisState::from_input(json!({"audio_features": {}})).unwrap_err();
        assert_eq!(err, InputContractError::MissingKey("transcript"));
    }

    #[test]
    fn test_from_input_rejects_missing_features() {
        let err = AnalysisState::from_input(json!({"transcript": "hi"})).unwrap_err();
        assert_eq!(err, InputContractError::MissingKey("audio_features"));
    }

    #[test]
    fn test_from_input_rejects_non_object() {
        let err = AnalysisState::from_input(json!("just text")).unwrap_err();
        assert_eq!(err, InputContractError::NotAnObject);
    }

    #[test]
    fn test_merge_keeps_existing_keys() {
        let mut state = AnalysisState::from_input(sample_input()).unwrap();
        state.merge(StageKey::Communication, json!({"clarity_score": 80}));
        state.merge(StageKey::ConfidenceEmotion, json!({"emotion": "Calm"}));

        assert!(state.get("transcript").is_some());
        assert!(state.stage_record(StageKey::Communication).is_some());
        assert_eq!(state.as_map().len(), 4);
    }

    #[test]
    fn test_feature_text_uses_na_sentinel() {
        let state = AnalysisState::from_input(sample_input()).unwrap();
        assert_eq!(feature_text(state.audio_features(), "speech_rate"), "140");
        assert_eq!(feature_text(state.audio_features(), "energy_level"), "high");
        assert_eq!(feature_text(state.audio_features(), "missing"), "N/A");
        assert_eq!(feature_text(None, "speech_rate"), "N/A");
    }

    #[test]
    fn test_degraded_shape_detection() {
        assert!(is_degraded(&failed_record("boom")));
        assert!(is_degraded(&json!({"raw": "x", "error": "e", "status": "parse_failed"})));
        assert!(!is_degraded(&json!({"emotion": "Calm"})));
        assert!(!is_degraded(&json!("text")));
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_stage_order_and_keys() {
        let keys: Vec<_> = StageKey::ORDER.iter().map(StageKey::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "communication_analysis",
                "confidence_emotion_analysis",
                "personality_analysis"
            ]
        );
    }
}
