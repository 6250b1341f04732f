//! 'speech-insight' - Staged behavioral analysis of speech transcripts.
//!
//! A job takes a transcript plus a handful of acoustic features and runs three
//! dependent analysis stages through a text-completion capability:
//!
//! 1. `communication_analysis`: clarity, fluency, structure, vocabulary
//! 2. `confidence_emotion_analysis`: confidence, nervousness, emotion
//! 3. `personality_analysis`: personality tendency, assertiveness, expressiveness
//!
//! Each stage grounds its prompt with knowledge retrieved from a small expert
//! corpus, parses whatever text comes back into a mapping, and optionally runs
//! it through a content-safety validator before the next stage sees it.
//!
//! The pipeline is built to degrade rather than fail:
//!
//! - [`parser::ResponseParser`] always yields a mapping, falling back to a
//!   `{raw, error, status: "parse_failed"}` record.
//! - [`retriever::KnowledgeRetriever`] falls back from similarity search to
//!   deterministic keyword scoring and always yields a string.
//! - A failing stage becomes `{error, status: "failed"}` under its own key;
//!   later stages still run.
//! - Only a broken input contract (missing `transcript` or `audio_features`)
//!   collapses the whole result to `{error, status: "failed"}`.
//!
//! # Quick start
//!
//! ```rust
//! use speech_insight::completion::StubCompletion;
//! use speech_insight::knowledge::KnowledgeCorpus;
//! use speech_insight::orchestrator::Orchestrator;
//! use speech_insight::retriever::KnowledgeRetriever;
//! use speech_insight::stage::PipelineServices;
//! use speech_insight::validator::PolicyValidator;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let retriever = Arc::new(KnowledgeRetriever::new(Arc::new(KnowledgeCorpus::builtin())));
//! let services = PipelineServices::new(Arc::new(StubCompletion), retriever)
//!     .with_validator(Arc::new(PolicyValidator::rule_based()));
//! let orchestrator = Orchestrator::new(Arc::new(services));
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let result = runtime.block_on(orchestrator.run(json!({
//!     "transcript": "Good morning everyone, today I will walk you through our plan.",
//!     "audio_features": {
//!         "speech_rate": 130,
//!         "pitch_variance": 22.5,
//!         "pause_ratio": 0.18,
//!         "energy_level": "medium-high"
//!     }
//! })));
//!
//! assert_eq!(result["communication_analysis"]["fluency_level"], "Good");
//! assert_eq!(result["personality_analysis"]["personality_type"], "Balanced");
//! ```

// Re-export tracing for the instrument attribute and downstream subscribers
pub use tracing;

pub mod completion;
pub mod config;
pub mod knowledge;
pub mod observability;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod report;
pub mod retriever;
pub mod stage;
pub mod state;
pub mod validator;

pub use completion::{Completion, CompletionError, StubCompletion};
pub use config::PipelineConfig;
pub use knowledge::{Category, KnowledgeCorpus, KnowledgeDocument};
pub use orchestrator::{Orchestrator, PipelineError};
pub use parser::{ParseError, ResponseParser};
pub use prompt::PromptBuilder;
pub use report::{Report, ReportGenerator, identify_weak_areas};
pub use retriever::{AnalysisType, KnowledgeRetriever, RetrievalMetrics};
pub use stage::{AnalysisStage, PipelineServices, Stage, StageError};
pub use state::{AnalysisState, StageKey};
pub use validator::{Channel, NoopValidator, OutputValidator, PolicyValidator};
