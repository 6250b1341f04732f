use thiserror::Error;

/// Errors raised by a similarity backend.
///
/// None of these ever reach a caller of
/// [`KnowledgeRetriever`](super::KnowledgeRetriever); they only select the
/// keyword fallback.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RetrievalError {
    #[error("Similarity backend unavailable: {0}")]
    Unavailable(String),

    #[error("Index build failed: {0}")]
    IndexFailed(String),

    #[error("Similarity query failed: {0}")]
    QueryFailed(String),

    #[error("Similarity index has not been built")]
    NotIndexed,
}
