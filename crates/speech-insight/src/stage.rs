//! The three analysis stages and the services they share.

use crate::completion::{Completion, CompletionError, retry_completion};
use crate::config::PipelineConfig;
use crate::parser::ResponseParser;
use crate::prompt::{PromptBuilder, PromptError};
use crate::retriever::{AnalysisType, KnowledgeRetriever, RetrievalMetrics};
use crate::state::{AnalysisState, InputContractError, StageKey, failed_record};
use crate::validator::{Channel, NoopValidator, OutputValidator};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised inside a stage boundary.
#[derive(Debug, Error)]
pub enum StageError {
    /// The job input lacks a key the stage needs. Escapes the stage boundary.
    #[error(transparent)]
    InputContract(#[from] InputContractError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("Stage failed: {0}")]
    Other(String),
}

impl StageError {
    pub fn is_input_contract(&self) -> bool {
        matches!(self, StageError::InputContract(_))
    }

    /// The `{error, status: "failed"}` record stored under the stage key.
    pub fn to_record(&self) -> Value {
        failed_record(self)
    }
}

/// One step of the pipeline.
///
/// Returns an envelope mapping, normally `{<stage key>: record}`.
#[async_trait]
pub trait Stage: Send + Sync {
    fn key(&self) -> StageKey;

    async fn run(&self, state: &AnalysisState) -> Result<Value, StageError>;
}

/// Long-lived collaborators shared by every stage of every job.
pub struct PipelineServices {
    completion: Arc<dyn Completion>,
    retriever: Arc<KnowledgeRetriever>,
    validator: Arc<dyn OutputValidator>,
    parser: ResponseParser,
    prompts: PromptBuilder,
    config: PipelineConfig,
}

impl PipelineServices {
    /// Composes services with the default configuration and no validation.
    pub fn new(completion: Arc<dyn Completion>, retriever: Arc<KnowledgeRetriever>) -> Self {
        let config = PipelineConfig::default();
        Self {
            completion,
            retriever,
            validator: Arc::new(NoopValidator),
            parser: ResponseParser::with_config(config.parsing()),
            prompts: PromptBuilder::new().with_transcript_char_limit(config.transcript_char_limit),
            config,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn OutputValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.parser = ResponseParser::with_config(config.parsing());
        self.prompts = PromptBuilder::new().with_transcript_char_limit(config.transcript_char_limit);
        self.config = config;
        self
    }

    pub fn completion(&self) -> &Arc<dyn Completion> {
        &self.completion
    }

    pub fn retriever(&self) -> &Arc<KnowledgeRetriever> {
        &self.retriever
    }

    pub fn validator(&self) -> &Arc<dyn OutputValidator> {
        &self.validator
    }

    pub fn parser(&self) -> &ResponseParser {
        &self.parser
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Calls the completion backend with the configured timeout and retries.
    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let completion = self.completion.clone();
        let timeout = self.config.completion_timeout;

        retry_completion(self.config.completion_max_retries, prompt, move |p: &str| {
            let completion = completion.clone();
            let prompt = p.to_string();
            async move {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, completion.invoke(&prompt))
                        .await
                        .map_err(|_| CompletionError::Timeout(limit))?,
                    None => completion.invoke(&prompt).await,
                }
            }
        })
        .await
    }
}

impl fmt::Debug for PipelineServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineServices")
            .field("completion", &self.completion.name())
            .field("retriever", &self.retriever)
            .field("validator_available", &self.validator.is_available())
            .field("config", &self.config)
            .finish()
    }
}

/// The retrieve, render, complete, parse, validate sequence for one stage key.
#[derive(Debug, Clone)]
pub struct AnalysisStage {
    key: StageKey,
    services: Arc<PipelineServices>,
}

impl AnalysisStage {
    pub fn new(key: StageKey, services: Arc<PipelineServices>) -> Self {
        Self { key, services }
    }

    /// All three stages in execution order.
    pub fn standard(services: Arc<PipelineServices>) -> Vec<Arc<dyn Stage>> {
        StageKey::ORDER
            .iter()
            .map(|key| Arc::new(AnalysisStage::new(*key, services.clone())) as Arc<dyn Stage>)
            .collect()
    }
}

#[async_trait]
impl Stage for AnalysisStage {
    fn key(&self) -> StageKey {
        self.key
    }

    #[tracing::instrument(
        name = "analysis_stage.run",
        skip(self, state),
        fields(stage = %self.key, completion = self.services.completion.name())
    )]
    async fn run(&self, state: &AnalysisState) -> Result<Value, StageError> {
        let services = &self.services;

        let metrics = RetrievalMetrics::for_stage(self.key, state);
        let context = services
            .retriever
            .get_context(AnalysisType::from(self.key), &metrics)
            .await;

        let prompt = services.prompts.render(self.key, state, &context)?;
        debug!(
            target: "speech_insight::stage",
            prompt_chars = prompt.chars().count(),
            has_context = !context.is_empty(),
            "Rendered stage prompt"
        );

        let text = services.complete(&prompt).await?;
        let parsed = services.parser.parse_text(&text);

        let outcome = services
            .validator
            .validate(Value::Object(parsed), Channel::StageOutput)
            .await;
        if let Some(error) = &outcome.metadata.error {
            debug!(
                target: "speech_insight::stage",
                error = %error,
                "Stage output validation reported an error"
            );
        }

        let mut envelope = Map::new();
        envelope.insert(self.key.as_str().to_string(), outcome.content);
        Ok(Value::Object(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::StubCompletion;
    use crate::knowledge::KnowledgeCorpus;
    use serde_json::json;
    use std::time::Duration;

    struct SlowCompletion;

    #[async_trait]
    impl Completion for SlowCompletion {
        fn name(&self) -> &str {
            "slow"
        }

        async fn invoke(&self, _prompt: &str) -> Result<String, CompletionError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("{}".to_string())
        }
    }

    fn services(completion: Arc<dyn Completion>) -> Arc<PipelineServices> {
        let retriever = Arc::new(KnowledgeRetriever::new(Arc::new(KnowledgeCorpus::builtin())));
        Arc::new(PipelineServices::new(completion, retriever))
    }

    fn state() -> AnalysisState {
        AnalysisState::from_input(json!({
            "transcript": "This is a test.",
            "audio_features": {"speech_rate": 140, "pause_ratio": 0.1}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_stage_envelope_holds_parsed_record() {
        let stage = AnalysisStage::new(StageKey::Communication, services(Arc::new(StubCompletion)));
        let envelope = stage.run(&state()).await.unwrap();
        assert_eq!(envelope["communication_analysis"]["clarity_score"], 85);
    }

    #[tokio::test]
    async fn test_completion_timeout_is_a_stage_error() {
        let retriever = Arc::new(KnowledgeRetriever::new(Arc::new(KnowledgeCorpus::builtin())));
        let services = PipelineServices::new(Arc::new(SlowCompletion), retriever).with_config(
            PipelineConfig {
                completion_timeout: Some(Duration::from_millis(20)),
                ..Default::default()
            },
        );
        let stage = AnalysisStage::new(StageKey::ConfidenceEmotion, Arc::new(services));

        let err = stage.run(&state()).await.unwrap_err();
        assert!(matches!(err, StageError::Completion(CompletionError::Timeout(_))));
        assert_eq!(err.to_record()["status"], "failed");
    }

    #[derive(Default)]
    struct PromptLog {
        prompts: tokio::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Completion for PromptLog {
        fn name(&self) -> &str {
            "prompt-log"
        }

        async fn invoke(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().await.push(prompt.to_string());
            Ok(StubCompletion::respond(prompt))
        }
    }

    #[tokio::test]
    async fn test_context_size_follows_retriever_top_k() {
        let completion = Arc::new(PromptLog::default());
        let retriever = Arc::new(
            KnowledgeRetriever::new(Arc::new(KnowledgeCorpus::builtin())).with_top_k(1),
        );
        let services = Arc::new(PipelineServices::new(completion.clone(), retriever));
        let stage = AnalysisStage::new(StageKey::Communication, services);

        stage.run(&state()).await.unwrap();

        let prompts = completion.prompts.lock().await;
        assert!(prompts[0].contains("Expert Knowledge (Communication):\n1. "));
        assert!(!prompts[0].contains("\n2. "));
    }

    #[test]
    fn test_standard_stage_order() {
        let stages = AnalysisStage::standard(services(Arc::new(StubCompletion)));
        let keys: Vec<_> = stages.iter().map(|s| s.key()).collect();
        assert_eq!(keys, StageKey::ORDER.to_vec());
    }
}
