//! Knowledge retrieval with graceful degradation.
//!
//! [`KnowledgeRetriever`] turns an analysis type plus metric values into a
//! formatted context block for a stage prompt. Ranking goes through a
//! [`SimilarityBackend`] when one is configured and healthy, and falls back to
//! deterministic [`keyword_rank`] scoring otherwise. Backend failures are
//! logged and swallowed; callers always receive a string.
//!
//! ```rust
//! use speech_insight::knowledge::KnowledgeCorpus;
//! use speech_insight::retriever::{AnalysisType, KnowledgeRetriever, RetrievalMetrics};
//! use std::sync::Arc;
//!
//! let retriever = KnowledgeRetriever::new(Arc::new(KnowledgeCorpus::builtin()));
//! let metrics = RetrievalMetrics {
//!     pitch_variance: Some(45.0),
//!     ..Default::default()
//! };
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let context = runtime.block_on(retriever.get_context(AnalysisType::Confidence, &metrics));
//! assert!(context.starts_with("Expert Knowledge (Confidence):"));
//! ```

pub mod backend;
pub mod error;
pub mod keyword;
pub mod query;

pub use backend::{NoSimilarityBackend, SimilarityBackend, TermVectorBackend};
pub use error::RetrievalError;
pub use keyword::keyword_rank;
pub use query::{AnalysisType, RetrievalMetrics, build_query};

use crate::knowledge::{Category, KnowledgeCorpus, RetrievedDocument};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Default number of documents placed in a context block.
pub const DEFAULT_TOP_K: usize = 3;

/// Long-lived retrieval service shared by every job.
///
/// The backend index is built lazily, at most once, on first use.
pub struct KnowledgeRetriever {
    corpus: Arc<KnowledgeCorpus>,
    backend: Arc<dyn SimilarityBackend>,
    top_k: usize,
    index_ready: OnceCell<bool>,
}

impl KnowledgeRetriever {
    /// Creates a keyword-only retriever over `corpus`.
    pub fn new(corpus: Arc<KnowledgeCorpus>) -> Self {
        Self {
            corpus,
            backend: Arc::new(NoSimilarityBackend),
            top_k: DEFAULT_TOP_K,
            index_ready: OnceCell::new(),
        }
    }

    /// Prefers `backend` for ranking.
    pub fn with_backend(mut self, backend: Arc<dyn SimilarityBackend>) -> Self {
        self.backend = backend;
        self.index_ready = OnceCell::new();
        self
    }

    /// Documents per context block, for every stage and the report.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn corpus(&self) -> &KnowledgeCorpus {
        &self.corpus
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Builds the backend index on first call; later calls reuse the outcome.
    async fn similarity_ready(&self) -> bool {
        *self
            .index_ready
            .get_or_init(|| async {
                if !self.backend.is_available() {
                    debug!(
                        target: "speech_insight::retriever",
                        backend = self.backend.name(),
                        "Similarity backend unavailable, using keyword scoring"
                    );
                    return false;
                }

                match self.backend.index(self.corpus.documents()).await {
                    Ok(()) => {
                        debug!(
                            target: "speech_insight::retriever",
                            backend = self.backend.name(),
                            documents = self.corpus.len(),
                            "Indexed knowledge corpus"
                        );
                        true
                    }
                    Err(e) => {
                        warn!(
                            target: "speech_insight::retriever",
                            backend = self.backend.name(),
                            error = %e,
                            "Index build failed, using keyword scoring"
                        );
                        false
                    }
                }
            })
            .await
    }

    /// Ranks corpus documents for `query`, never failing.
    ///
    /// Returns at most `top_k` documents, most relevant first.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        category: Option<Category>,
    ) -> Vec<RetrievedDocument> {
        if top_k == 0 {
            return Vec::new();
        }

        if self.similarity_ready().await {
            match self.backend.query(query, top_k, category).await {
                Ok(hits) => {
                    let hits: Vec<RetrievedDocument> = hits
                        .into_iter()
                        .filter(|hit| category.is_none_or(|c| hit.category == Some(c)))
                        .take(top_k)
                        .collect();
                    if !hits.is_empty() {
                        debug!(
                            target: "speech_insight::retriever",
                            backend = self.backend.name(),
                            hits = hits.len(),
                            "Similarity search returned documents"
                        );
                        return hits;
                    }
                    debug!(
                        target: "speech_insight::retriever",
                        backend = self.backend.name(),
                        "Similarity search returned nothing, using keyword scoring"
                    );
                }
                Err(e) => {
                    warn!(
                        target: "speech_insight::retriever",
                        backend = self.backend.name(),
                        error = %e,
                        "Similarity search failed, using keyword scoring"
                    );
                }
            }
        }

        keyword_rank(self.corpus.documents(), query, top_k, category)
    }

    /// Produces the formatted context block for a stage prompt.
    ///
    /// Returns `""` when no document is relevant.
    pub async fn get_context(
        &self,
        analysis_type: AnalysisType,
        metrics: &RetrievalMetrics,
    ) -> String {
        self.context_for(analysis_type, metrics, self.top_k).await
    }

    /// [`get_context`](Self::get_context) with an explicit document count.
    pub async fn context_for(
        &self,
        analysis_type: AnalysisType,
        metrics: &RetrievalMetrics,
        top_k: usize,
    ) -> String {
        let query = build_query(analysis_type, metrics);

        let mut documents = self
            .retrieve(&query, top_k, Some(analysis_type.category()))
            .await;
        if documents.is_empty() {
            documents = self.retrieve(&query, top_k, None).await;
        }

        debug!(
            target: "speech_insight::retriever",
            analysis_type = %analysis_type,
            document_count = documents.len(),
            "Retrieved context documents"
        );

        format_context(analysis_type, &documents)
    }
}

impl fmt::Debug for KnowledgeRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeRetriever")
            .field("documents", &self.corpus.len())
            .field("backend", &self.backend.name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

/// Renders the header plus a numbered list of trimmed contents.
pub fn format_context(analysis_type: AnalysisType, documents: &[RetrievedDocument]) -> String {
    if documents.is_empty() {
        return String::new();
    }

    let mut lines = vec![format!("Expert Knowledge ({}):", analysis_type.title())];
    for (i, doc) in documents.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, doc.content.trim()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{Category, KnowledgeDocument};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        index_calls: AtomicUsize,
        hits: Vec<RetrievedDocument>,
    }

    #[async_trait]
    impl SimilarityBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        async fn index(&self, _documents: &[KnowledgeDocument]) -> Result<(), RetrievalError> {
            self.index_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(())
        }

        async fn query(
            &self,
            _text: &str,
            _top_k: usize,
            _category: Option<Category>,
        ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
            Ok(self.hits.clone())
        }
    }

    fn retriever() -> KnowledgeRetriever {
        KnowledgeRetriever::new(Arc::new(KnowledgeCorpus::builtin()))
    }

    #[tokio::test]
    async fn test_keyword_fallback_without_backend() {
        let docs = retriever()
            .retrieve("pitch variance nervous", 3, Some(Category::Confidence))
            .await;
        assert!(!docs.is_empty());
        assert!(docs.len() <= 3);
        assert!(docs.iter().all(|d| d.category == Some(Category::Confidence)));
    }

    #[tokio::test]
    async fn test_backend_indexed_once_and_hits_truncated() {
        let hit = RetrievedDocument::new("Backend hit").with_category(Category::Personality);
        let backend = Arc::new(CountingBackend {
            index_calls: AtomicUsize::new(0),
            hits: vec![hit.clone(), hit.clone(), hit.clone(), hit],
        });
        let retriever = retriever().with_backend(backend.clone());

        let first = retriever.retrieve("q", 2, None).await;
        let second = retriever.retrieve("q", 2, Some(Category::Personality)).await;

        assert_eq!(first.len(), 2);
        assert_eq!(second[0].content, "Backend hit");
        assert_eq!(backend.index_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_indexes_once() {
        let hit = RetrievedDocument::new("Backend hit").with_category(Category::Confidence);
        let backend = Arc::new(CountingBackend {
            index_calls: AtomicUsize::new(0),
            hits: vec![hit],
        });
        let retriever = retriever().with_backend(backend.clone());

        let (first, second) = tokio::join!(
            retriever.retrieve("q", 1, None),
            retriever.retrieve("q", 1, Some(Category::Confidence)),
        );

        assert_eq!(first[0].content, "Backend hit");
        assert_eq!(second[0].content, "Backend hit");
        assert_eq!(backend.index_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backend_hits_outside_category_fall_back() {
        let backend = Arc::new(CountingBackend {
            index_calls: AtomicUsize::new(0),
            hits: vec![RetrievedDocument::new("wrong").with_category(Category::Communication)],
        });
        let retriever = retriever().with_backend(backend);

        let docs = retriever
            .retrieve("energy level", 3, Some(Category::Confidence))
            .await;
        assert!(docs.iter().all(|d| d.category == Some(Category::Confidence)));
        assert!(docs.iter().all(|d| d.content != "wrong"));
    }

    #[tokio::test]
    async fn test_get_context_format() {
        let metrics = RetrievalMetrics {
            speech_rate: Some(170.0),
            ..Default::default()
        };
        let context = retriever()
            .get_context(AnalysisType::Communication, &metrics)
            .await;

        let mut lines = context.lines();
        assert_eq!(lines.next(), Some("Expert Knowledge (Communication):"));
        assert!(context.contains("\n1. "));
        assert!(!context.contains("\n4. "));
    }

    #[tokio::test]
    async fn test_get_context_empty_when_nothing_matches() {
        let corpus = KnowledgeCorpus::new(vec![KnowledgeDocument::new(
            "x",
            Category::Improvement,
            "zzz",
        )]);
        let retriever = KnowledgeRetriever::new(Arc::new(corpus));
        let context = retriever
            .get_context(AnalysisType::Confidence, &RetrievalMetrics::default())
            .await;
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn test_get_context_retries_without_category() {
        let corpus = KnowledgeCorpus::new(vec![KnowledgeDocument::new(
            "x",
            Category::Improvement,
            "Confidence building",
        )]);
        let retriever = KnowledgeRetriever::new(Arc::new(corpus));
        let context = retriever
            .get_context(AnalysisType::Confidence, &RetrievalMetrics::default())
            .await;
        assert_eq!(context, "Expert Knowledge (Confidence):\n1. Confidence building");
    }

    #[test]
    fn test_format_context_trims_contents() {
        let docs = vec![
            RetrievedDocument::new("  first  "),
            RetrievedDocument::new("second\n"),
        ];
        assert_eq!(
            format_context(AnalysisType::Improvement, &docs),
            "Expert Knowledge (Improvement):\n1. first\n2. second"
        );
        assert_eq!(format_context(AnalysisType::Improvement, &[]), "");
    }
}
