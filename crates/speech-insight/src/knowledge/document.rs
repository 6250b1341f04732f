use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Topic a knowledge snippet belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Communication,
    Confidence,
    Personality,
    Improvement,
}

/// A short expert snippet in the knowledge corpus. Identity is `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeDocument {
    pub id: String,
    pub category: Category,
    pub content: String,
}

impl KnowledgeDocument {
    pub fn new(id: impl Into<String>, category: Category, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            content: content.into(),
        }
    }
}

/// A corpus document returned by a ranking pass.
///
/// # Examples
///
/// ```rust
/// use speech_insight::knowledge::{Category, RetrievedDocument};
///
/// let doc = RetrievedDocument::new("Pause ratio <0.15: Good fluency")
///     .with_id("conf_002")
///     .with_category(Category::Confidence)
///     .with_score(0.71);
/// assert_eq!(doc.score, Some(0.71));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedDocument {
    /// The textual content of the document
    pub content: String,

    /// Corpus identifier of the document
    pub id: Option<String>,

    pub category: Option<Category>,

    /// Relevance score (higher = more relevant). Backends that report a
    /// distance convert it before returning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl RetrievedDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            id: None,
            category: None,
            score: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

impl From<&KnowledgeDocument> for RetrievedDocument {
    fn from(doc: &KnowledgeDocument) -> Self {
        RetrievedDocument::new(doc.content.clone())
            .with_id(doc.id.clone())
            .with_category(doc.category)
    }
}
