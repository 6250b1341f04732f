//! The knowledge corpus used to ground stage prompts.
//!
//! A [`KnowledgeCorpus`] is a read-only list of [`KnowledgeDocument`]s, each
//! tagged with a [`Category`]. Ranking passes return [`RetrievedDocument`]s,
//! which carry the document identity plus an optional relevance score.

pub mod corpus;
pub mod document;

pub use corpus::KnowledgeCorpus;
pub use document::{Category, KnowledgeDocument, RetrievedDocument};
