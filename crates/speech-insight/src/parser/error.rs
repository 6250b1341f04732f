/// Response parsing errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse response: {0}")]
    JsonParsingFailed(String),

    #[error("Parsed response is not an object (found {0})")]
    NotAnObject(&'static str),

    #[error("No fenced code block found in response")]
    NoFencedBlock,

    #[error("No brace-delimited content found in response")]
    NoBraceSpan,

    #[error("Repair had no effect on response")]
    RepairNotApplicable,

    #[error("Failed to extract content from response: {0:?}")]
    AllStrategiesFailed(Vec<String>),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::JsonParsingFailed(err.to_string())
    }
}
