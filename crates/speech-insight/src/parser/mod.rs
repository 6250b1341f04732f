//! Resilient conversion of completion text into structured records.
//!
//! Completion text is unreliable: it arrives wrapped in prose, inside
//! Markdown fences, with single-quoted keys, or with trailing commas.
//! [`ResponseParser`] runs an ordered list of independent [`ParseAttempt`]s
//! and returns the first mapping that any of them produces. When every attempt
//! fails it still returns a mapping, shaped as a degraded record:
//!
//! ```rust
//! use speech_insight::parser::ResponseParser;
//!
//! let parser = ResponseParser::new();
//!
//! let parsed = parser.parse_text("Here you go: {'emotion': 'Calm',}");
//! assert_eq!(parsed["emotion"], "Calm");
//!
//! let failed = parser.parse_text("no structure at all");
//! assert_eq!(failed["status"], "parse_failed");
//! ```

pub mod core;
pub mod error;
pub mod extractors;

pub use self::core::{ParseAttempt, ParsingConfig, parse_object};
pub use self::error::ParseError;

use crate::state::{STATUS_PARSE_FAILED, truncate_chars};
use serde_json::{Map, Value};
use tracing::debug;

/// Total parser from completion output to a JSON object.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    config: ParsingConfig,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Parses any JSON value.
    ///
    /// Objects are returned unchanged. Strings are parsed as completion text;
    /// every other value is rendered to text first.
    pub fn parse(&self, input: Value) -> Map<String, Value> {
        match input {
            Value::Object(map) => map,
            Value::String(text) => self.parse_text(&text),
            Value::Null => self.parse_text(""),
            other => self.parse_text(&other.to_string()),
        }
    }

    /// Parses completion text, never failing.
    pub fn parse_text(&self, text: &str) -> Map<String, Value> {
        let trimmed = text.trim();
        match self.try_parse(trimmed) {
            Ok(map) => map,
            Err(errors) => self.failure_record(trimmed, &errors),
        }
    }

    /// Runs the configured attempts, returning every error when none succeeds.
    pub fn try_parse(&self, text: &str) -> Result<Map<String, Value>, Vec<ParseError>> {
        let mut errors = Vec::new();

        for attempt in &self.config.attempts {
            match attempt.run(text) {
                Ok(map) => {
                    debug!(
                        target: "speech_insight::parser",
                        attempt = ?attempt,
                        "Parsed completion text"
                    );
                    return Ok(map);
                }
                Err(e) => errors.push(e),
            }
        }

        Err(errors)
    }

    fn failure_record(&self, text: &str, errors: &[ParseError]) -> Map<String, Value> {
        let description = errors
            .first()
            .map(ToString::to_string)
            .unwrap_or_else(|| {
                ParseError::AllStrategiesFailed(Vec::new()).to_string()
            });

        debug!(
            target: "speech_insight::parser",
            attempts = errors.len(),
            error = %description,
            "All parse attempts failed"
        );

        let mut record = Map::new();
        record.insert(
            "raw".to_string(),
            Value::String(truncate_chars(text, self.config.raw_char_limit)),
        );
        record.insert("error".to_string(), Value::String(description));
        record.insert(
            "status".to_string(),
            Value::String(STATUS_PARSE_FAILED.to_string()),
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mapping_input_returned_unchanged() {
        let parser = ResponseParser::new();
        let input = json!({"emotion": "Calm", "nested": {"x": [1, 2]}});
        let parsed = parser.parse(input.clone());
        assert_eq!(Value::Object(parsed), input);
    }

    #[test]
    fn test_round_trip_of_well_formed_json() {
        let parser = ResponseParser::new();
        let value = json!({
            "clarity_score": 85,
            "fluency_level": "Good",
            "speech_structure": "Structured",
            "vocabulary_level": "Advanced"
        });
        let parsed = parser.parse_text(&value.to_string());
        assert_eq!(Value::Object(parsed), value);
    }

    #[test]
    fn test_fenced_block_extraction() {
        let parser = ResponseParser::new();
        let text = "Here is the analysis:\n```json\n{\"confidence_level\": \"High\"}\n```\nLet me know!";
        let parsed = parser.parse_text(text);
        assert_eq!(parsed["confidence_level"], "High");
    }

    #[test]
    fn test_prose_wrapped_object() {
        let parser = ResponseParser::new();
        let text = "Sure! {\"personality_type\": \"Balanced\"} Hope this helps.";
        let parsed = parser.parse_text(text);
        assert_eq!(parsed["personality_type"], "Balanced");
    }

    #[test]
    fn test_single_quote_repair() {
        let parser = ResponseParser::new();
        let parsed = parser.parse_text("{'nervousness': 'Low', 'emotion': 'Calm'}");
        assert_eq!(
            Value::Object(parsed),
            json!({"nervousness": "Low", "emotion": "Calm"})
        );
    }

    #[test]
    fn test_trailing_comma_repair_keeps_apostrophes() {
        let parser = ResponseParser::new();
        let parsed = parser.parse_text("{\"note\": \"it's fine\", \"score\": 70,}");
        assert_eq!(
            Value::Object(parsed),
            json!({"note": "it's fine", "score": 70})
        );
    }

    #[test]
    fn test_gibberish_yields_parse_failed_record() {
        let parser = ResponseParser::new();
        let gibberish = "qwe ".repeat(300);
        let parsed = parser.parse_text(&gibberish);

        assert_eq!(parsed["status"], "parse_failed");
        assert!(parsed["error"].as_str().unwrap().starts_with("Failed to parse response"));
        assert!(parsed["raw"].as_str().unwrap().chars().count() <= 500);
    }

    #[test]
    fn test_empty_and_null_inputs() {
        let parser = ResponseParser::new();
        assert_eq!(parser.parse_text("   ")["status"], "parse_failed");
        assert_eq!(parser.parse(Value::Null)["status"], "parse_failed");
    }

    #[test]
    fn test_non_object_json_is_not_accepted() {
        let parser = ResponseParser::new();
        let parsed = parser.parse(json!([1, 2, 3]));
        assert_eq!(parsed["status"], "parse_failed");
        assert_eq!(parsed["raw"], "[1,2,3]");
    }

    #[test]
    fn test_custom_raw_limit() {
        let parser =
            ResponseParser::with_config(ParsingConfig::default().with_raw_char_limit(10));
        let parsed = parser.parse_text("this text is not json at all");
        assert_eq!(parsed["raw"], "this text ");
    }
}
