//! Deterministic keyword scoring used when similarity search is unavailable.

use crate::knowledge::{Category, KnowledgeDocument, RetrievedDocument};

/// Ranks `documents` by how many query words occur in their content.
///
/// The query is lower-cased and split on whitespace; each word (duplicates
/// included) scores one point when it occurs as a substring of the lower-cased
/// content. Zero-score documents are excluded, ties keep corpus order, and at
/// most `top_k` documents are returned.
pub fn keyword_rank(
    documents: &[KnowledgeDocument],
    query: &str,
    top_k: usize,
    category: Option<Category>,
) -> Vec<RetrievedDocument> {
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    let mut scored: Vec<(usize, &KnowledgeDocument)> = documents
        .iter()
        .filter(|doc| category.is_none_or(|c| doc.category == c))
        .filter_map(|doc| {
            let content = doc.content.to_lowercase();
            let score = words.iter().filter(|w| content.contains(**w)).count();
            (score > 0).then_some((score, doc))
        })
        .collect();

    // sort_by is stable, so equal scores keep corpus order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(top_k)
        .map(|(score, doc)| RetrievedDocument::from(doc).with_score(score as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<KnowledgeDocument> {
        vec![
            KnowledgeDocument::new("a", Category::Communication, "Speech rate and pacing"),
            KnowledgeDocument::new("b", Category::Confidence, "Pitch, rate, and PACING tips"),
            KnowledgeDocument::new("c", Category::Confidence, "Nothing relevant"),
            KnowledgeDocument::new("d", Category::Communication, "Rate"),
        ]
    }

    #[test]
    fn test_scores_count_query_words() {
        let ranked = keyword_rank(&docs(), "rate pacing pitch", 10, None);
        let ids: Vec<_> = ranked.iter().map(|d| d.id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["b", "a", "d"]);
        assert_eq!(ranked[0].score, Some(3.0));
    }

    #[test]
    fn test_duplicate_query_words_count_twice() {
        let ranked = keyword_rank(&docs(), "rate rate", 1, None);
        assert_eq!(ranked[0].score, Some(2.0));
        assert_eq!(ranked[0].id.as_deref(), Some("a"));
    }

    #[test]
    fn test_category_filter_and_top_k() {
        let ranked = keyword_rank(&docs(), "rate", 1, Some(Category::Communication));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id.as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_query_and_zero_top_k() {
        assert!(keyword_rank(&docs(), "   ", 3, None).is_empty());
        assert!(keyword_rank(&docs(), "rate", 0, None).is_empty());
    }
}
