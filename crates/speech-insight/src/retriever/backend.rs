//! Pluggable similarity search over the knowledge corpus.

use super::error::RetrievalError;
use crate::knowledge::{Category, KnowledgeDocument, RetrievedDocument};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// A vector-similarity capability the retriever prefers over keyword scoring.
///
/// Implementations may fail in any method; the retriever treats every
/// failure as a signal to fall back.
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the backend can serve queries at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Loads the corpus into the backend. Called at most once per retriever.
    async fn index(&self, documents: &[KnowledgeDocument]) -> Result<(), RetrievalError>;

    /// Returns at most `top_k` hits, most relevant first.
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        category: Option<Category>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError>;
}

/// The named "no similarity search" default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSimilarityBackend;

#[async_trait]
impl SimilarityBackend for NoSimilarityBackend {
    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn index(&self, _documents: &[KnowledgeDocument]) -> Result<(), RetrievalError> {
        Err(RetrievalError::Unavailable(
            "no similarity backend configured".to_string(),
        ))
    }

    async fn query(
        &self,
        _text: &str,
        _top_k: usize,
        _category: Option<Category>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Err(RetrievalError::Unavailable(
            "no similarity backend configured".to_string(),
        ))
    }
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    document: KnowledgeDocument,
    terms: HashMap<String, f32>,
    norm: f32,
}

/// In-process bag-of-words cosine similarity.
///
/// Suitable when no external vector store is deployed. The index lives behind
/// a lock and is only written by [`SimilarityBackend::index`].
#[derive(Debug, Default)]
pub struct TermVectorBackend {
    index: RwLock<Option<Vec<IndexedDocument>>>,
}

impl TermVectorBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn term_vector(text: &str) -> HashMap<String, f32> {
    let mut terms = HashMap::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *terms.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }
    terms
}

fn norm(terms: &HashMap<String, f32>) -> f32 {
    terms.values().map(|w| w * w).sum::<f32>().sqrt()
}

fn cosine(
    query: &HashMap<String, f32>,
    query_norm: f32,
    doc: &HashMap<String, f32>,
    doc_norm: f32,
) -> f32 {
    if query_norm == 0.0 || doc_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = query
        .iter()
        .filter_map(|(term, w)| doc.get(term).map(|d| w * d))
        .sum();
    dot / (query_norm * doc_norm)
}

#[async_trait]
impl SimilarityBackend for TermVectorBackend {
    fn name(&self) -> &str {
        "term-vector"
    }

    async fn index(&self, documents: &[KnowledgeDocument]) -> Result<(), RetrievalError> {
        let indexed: Vec<IndexedDocument> = documents
            .iter()
            .map(|document| {
                let terms = term_vector(&document.content);
                let norm = norm(&terms);
                IndexedDocument {
                    document: document.clone(),
                    terms,
                    norm,
                }
            })
            .collect();

        let mut guard = self
            .index
            .write()
            .map_err(|e| RetrievalError::IndexFailed(e.to_string()))?;
        *guard = Some(indexed);

        debug!(
            target: "speech_insight::retriever",
            documents = documents.len(),
            "Built term-vector index"
        );
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
        category: Option<Category>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let guard = self
            .index
            .read()
            .map_err(|e| RetrievalError::QueryFailed(e.to_string()))?;
        let Some(index) = guard.as_ref() else {
            return Err(RetrievalError::NotIndexed);
        };

        let query_terms = term_vector(text);
        let query_norm = norm(&query_terms);

        let mut scored: Vec<(f32, &IndexedDocument)> = index
            .iter()
            .filter(|entry| category.is_none_or(|c| entry.document.category == c))
            .map(|entry| {
                (
                    cosine(&query_terms, query_norm, &entry.terms, entry.norm),
                    entry,
                )
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| RetrievedDocument::from(&entry.document).with_score(score))
            .collect())
    }
}
