use super::error::ParseError;
use super::extractors::{
    extract_brace_span, extract_fenced_block, replace_single_quotes, strip_trailing_commas,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One independent way of turning completion text into a mapping.
///
/// Attempts are tried in order by [`super::ResponseParser`]; the first one
/// that yields a JSON object wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseAttempt {
    /// Parse the whole (trimmed) text.
    Direct,

    /// Parse the inner text of the first fenced code block.
    FencedBlock,

    /// Parse the span from the first `{` to the last `}`.
    BraceSpan,

    /// Brace span with unescaped single quotes turned into double quotes.
    RepairSingleQuotes,

    /// Brace span with trailing commas removed.
    RepairTrailingCommas,

    /// Brace span with both repairs applied.
    RepairAll,
}

impl ParseAttempt {
    /// The full cascade in its fixed order.
    pub fn standard_cascade() -> Vec<ParseAttempt> {
        vec![
            ParseAttempt::Direct,
            ParseAttempt::FencedBlock,
            ParseAttempt::BraceSpan,
            ParseAttempt::RepairSingleQuotes,
            ParseAttempt::RepairTrailingCommas,
            ParseAttempt::RepairAll,
        ]
    }

    /// Produces the candidate text this attempt will hand to the JSON parser.
    pub fn candidate(&self, text: &str) -> Result<String, ParseError> {
        match self {
            ParseAttempt::Direct => Ok(text.to_string()),
            ParseAttempt::FencedBlock => extract_fenced_block(text),
            ParseAttempt::BraceSpan => extract_brace_span(text).map(str::to_string),
            ParseAttempt::RepairSingleQuotes => {
                let span = extract_brace_span(text)?;
                changed(span, replace_single_quotes(span))
            }
            ParseAttempt::RepairTrailingCommas => {
                let span = extract_brace_span(text)?;
                changed(span, strip_trailing_commas(span))
            }
            ParseAttempt::RepairAll => {
                let span = extract_brace_span(text)?;
                changed(span, strip_trailing_commas(&replace_single_quotes(span)))
            }
        }
    }

    /// Runs the attempt end to end.
    pub fn run(&self, text: &str) -> Result<Map<String, Value>, ParseError> {
        let candidate = self.candidate(text)?;
        parse_object(&candidate)
    }
}

/// A repair that did not change anything cannot succeed where `BraceSpan` failed.
fn changed(original: &str, repaired: String) -> Result<String, ParseError> {
    if repaired == original {
        Err(ParseError::RepairNotApplicable)
    } else {
        Ok(repaired)
    }
}

/// Parses `text` as JSON and requires the result to be an object.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(ParseError::NotAnObject("array")),
        Value::String(_) => Err(ParseError::NotAnObject("string")),
        Value::Number(_) => Err(ParseError::NotAnObject("number")),
        Value::Bool(_) => Err(ParseError::NotAnObject("boolean")),
        Value::Null => Err(ParseError::NotAnObject("null")),
    }
}

/// Configuration for response parsing
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    /// Ordered list of parse attempts
    pub attempts: Vec<ParseAttempt>,

    /// Maximum characters of the original text kept in a `parse_failed` record
    pub raw_char_limit: usize,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            attempts: ParseAttempt::standard_cascade(),
            raw_char_limit: 500,
        }
    }
}

impl ParsingConfig {
    /// Overrides the truncation limit for `raw`.
    pub fn with_raw_char_limit(mut self, limit: usize) -> Self {
        self.raw_char_limit = limit;
        self
    }
}
