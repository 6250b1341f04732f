//! Knowledge retrieval through the public API, including backend faults.

use async_trait::async_trait;
use speech_insight::knowledge::{Category, KnowledgeCorpus, KnowledgeDocument, RetrievedDocument};
use speech_insight::retriever::{
    AnalysisType, KnowledgeRetriever, RetrievalError, RetrievalMetrics, SimilarityBackend,
    TermVectorBackend, keyword_rank,
};
use std::sync::Arc;

struct BrokenBackend;

#[async_trait]
impl SimilarityBackend for BrokenBackend {
    fn name(&self) -> &str {
        "broken"
    }

    async fn index(&self, _documents: &[KnowledgeDocument]) -> Result<(), RetrievalError> {
        Err(RetrievalError::IndexFailed("disk full".to_string()))
    }

    async fn query(
        &self,
        _text: &str,
        _top_k: usize,
        _category: Option<Category>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Err(RetrievalError::QueryFailed("never indexed".to_string()))
    }
}

fn builtin() -> Arc<KnowledgeCorpus> {
    Arc::new(KnowledgeCorpus::builtin())
}

#[tokio::test]
async fn test_failing_backend_still_yields_context() {
    let retriever = KnowledgeRetriever::new(builtin()).with_backend(Arc::new(BrokenBackend));
    let metrics = RetrievalMetrics {
        speech_rate: Some(185.0),
        pause_ratio: Some(0.3),
        ..Default::default()
    };

    let context = retriever
        .get_context(AnalysisType::Communication, &metrics)
        .await;

    assert!(context.starts_with("Expert Knowledge (Communication):\n1. "));
}

#[tokio::test]
async fn test_similarity_backend_serves_category_hits() {
    let retriever =
        KnowledgeRetriever::new(builtin()).with_backend(Arc::new(TermVectorBackend::new()));

    let docs = retriever
        .retrieve("nervous anxiety filler words", 2, Some(Category::Confidence))
        .await;

    assert!(!docs.is_empty());
    assert!(docs.len() <= 2);
    assert!(docs.iter().all(|d| d.category == Some(Category::Confidence)));
}

#[tokio::test]
async fn test_zero_top_k_returns_nothing() {
    let retriever = KnowledgeRetriever::new(builtin());
    assert!(retriever.retrieve("clarity", 0, None).await.is_empty());
}

#[test]
fn test_keyword_rank_properties() {
    let corpus = KnowledgeCorpus::builtin();

    let docs = keyword_rank(corpus.documents(), "speaking pace rate", 3, None);
    assert!(docs.len() <= 3);
    assert!(docs.iter().all(|d| d.score.is_some_and(|s| s > 0.0)));
    assert!(
        docs.windows(2)
            .all(|pair| pair[0].score >= pair[1].score)
    );

    let filtered = keyword_rank(corpus.documents(), "speaking", 10, Some(Category::Personality));
    assert!(
        filtered
            .iter()
            .all(|d| d.category == Some(Category::Personality))
    );

    assert!(keyword_rank(corpus.documents(), "zzzqqq", 3, None).is_empty());
}

#[tokio::test]
async fn test_improvement_context_from_weak_areas() {
    let retriever = KnowledgeRetriever::new(builtin());
    let metrics = RetrievalMetrics::default()
        .with_weak_areas(vec!["confidence".to_string(), "fluency".to_string()]);

    let context = retriever
        .get_context(AnalysisType::Improvement, &metrics)
        .await;

    assert!(context.starts_with("Expert Knowledge (Improvement):"));
}
