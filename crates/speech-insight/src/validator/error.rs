use thiserror::Error;

/// Errors raised while validating content.
///
/// These never block the pipeline; they end up as the `error` annotation of a
/// [`ValidationMetadata`](super::ValidationMetadata).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Validation backend error: {0}")]
    Backend(String),

    #[error("Invalid validation rule: {0}")]
    Rule(String),

    #[error("Content could not be serialized for validation: {0}")]
    Serialization(String),
}

impl From<regex::Error> for ValidationError {
    fn from(err: regex::Error) -> Self {
        ValidationError::Rule(err.to_string())
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::Serialization(err.to_string())
    }
}
