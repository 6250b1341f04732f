//! Drives the three stages of a job and assembles the combined result.
//!
//! The orchestrator never fails: stage faults become degraded records under
//! that stage's key, and only a broken input contract replaces the whole
//! result with `{error, status: "failed"}`.
//!
//! ```rust
//! use speech_insight::completion::StubCompletion;
//! use speech_insight::knowledge::KnowledgeCorpus;
//! use speech_insight::orchestrator::Orchestrator;
//! use speech_insight::retriever::KnowledgeRetriever;
//! use speech_insight::stage::PipelineServices;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let retriever = Arc::new(KnowledgeRetriever::new(Arc::new(KnowledgeCorpus::builtin())));
//! let services = PipelineServices::new(Arc::new(StubCompletion), retriever);
//! let orchestrator = Orchestrator::new(Arc::new(services));
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let result = runtime.block_on(orchestrator.run(json!({
//!     "transcript": "This is a test.",
//!     "audio_features": {"speech_rate": 140, "pause_ratio": 0.1}
//! })));
//! assert_eq!(result["confidence_emotion_analysis"]["emotion"], "Calm");
//! ```

use crate::stage::{AnalysisStage, PipelineServices, Stage, StageError};
use crate::state::{AnalysisState, InputContractError, StageKey, failed_record, is_degraded};
use crate::validator::{Channel, NoopValidator, OutputValidator};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, error, info, warn};

/// Faults that replace the entire combined result.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InputContract(#[from] InputContractError),

    #[error("Stage '{stage}' violated the input contract: {source}")]
    StageContract {
        stage: StageKey,
        #[source]
        source: StageError,
    },
}

/// Runs stages in order over a per-job [`AnalysisState`].
#[derive(Clone)]
pub struct Orchestrator {
    stages: Vec<Arc<dyn Stage>>,
    validator: Arc<dyn OutputValidator>,
}

impl Orchestrator {
    /// The standard three-stage pipeline over shared services.
    pub fn new(services: Arc<PipelineServices>) -> Self {
        let validator = services.validator().clone();
        Self {
            stages: AnalysisStage::standard(services),
            validator,
        }
    }

    /// A pipeline over caller-supplied stages, without input validation.
    pub fn with_stages(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            stages,
            validator: Arc::new(NoopValidator),
        }
    }

    /// Validates the transcript on the input channel before the first stage.
    pub fn with_validator(mut self, validator: Arc<dyn OutputValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn stage_keys(&self) -> Vec<StageKey> {
        self.stages.iter().map(|s| s.key()).collect()
    }

    /// Runs one job to completion. Never fails.
    pub async fn run(&self, input: Value) -> Value {
        match self.try_run(input).await {
            Ok(combined) => Value::Object(combined),
            Err(e) => {
                error!(
                    target: "speech_insight::pipeline",
                    error = %e,
                    "Pipeline failed"
                );
                failed_record(e)
            }
        }
    }

    /// Runs one job, surfacing the faults that [`run`](Self::run) collapses.
    pub async fn try_run(&self, input: Value) -> Result<Map<String, Value>, PipelineError> {
        let mut state = AnalysisState::from_input(input)?;
        self.validate_transcript(&mut state).await;

        let mut combined = Map::new();

        for stage in &self.stages {
            let key = stage.key();
            let envelope = self.run_stage(stage.clone(), &state).await?;

            match envelope.get(key.as_str()).filter(|v| !v.is_null()) {
                Some(value) => {
                    if is_degraded(value) {
                        warn!(
                            target: "speech_insight::pipeline",
                            stage = %key,
                            "Stage produced a degraded record"
                        );
                    }
                    state.merge(key, value.clone());
                    combined.insert(key.as_str().to_string(), value.clone());
                }
                None => {
                    warn!(
                        target: "speech_insight::pipeline",
                        stage = %key,
                        "Stage envelope lacks its key, storing it as is"
                    );
                    combined.insert(key.as_str().to_string(), envelope);
                }
            }
        }

        info!(
            target: "speech_insight::pipeline",
            stages = combined.len(),
            "Pipeline completed"
        );
        Ok(combined)
    }

    /// Runs a stage on its own task so a panic stays inside the stage boundary.
    ///
    /// Dropping the job future mid-stage aborts the task, so a cancelled job
    /// leaves no completion call running.
    async fn run_stage(
        &self,
        stage: Arc<dyn Stage>,
        state: &AnalysisState,
    ) -> Result<Value, PipelineError> {
        let key = stage.key();
        let snapshot = state.clone();

        debug!(target: "speech_insight::pipeline", stage = %key, "Running stage");

        let task = tokio::spawn(async move { stage.run(&snapshot).await }.in_current_span());
        let joined = AbortOnDrop(task).await;

        match joined {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(e)) if e.is_input_contract() => {
                Err(PipelineError::StageContract { stage: key, source: e })
            }
            Ok(Err(e)) => {
                warn!(
                    target: "speech_insight::pipeline",
                    stage = %key,
                    error = %e,
                    "Stage failed"
                );
                Ok(stage_envelope(key, e.to_record()))
            }
            Err(join_error) => {
                warn!(
                    target: "speech_insight::pipeline",
                    stage = %key,
                    error = %join_error,
                    "Stage task aborted"
                );
                Ok(stage_envelope(
                    key,
                    failed_record(format!("Stage task aborted: {join_error}")),
                ))
            }
        }
    }

    async fn validate_transcript(&self, state: &mut AnalysisState) {
        if !self.validator.is_available() {
            return;
        }
        let Some(transcript) = state.transcript().map(str::to_string) else {
            return;
        };

        let outcome = self
            .validator
            .validate(Value::String(transcript.clone()), Channel::Input)
            .await;

        if !outcome.metadata.passed {
            info!(
                target: "speech_insight::pipeline",
                flagged = ?outcome.metadata.flagged,
                "Transcript validation flagged issues"
            );
        }

        if let Value::String(validated) = outcome.content
            && validated != transcript
        {
            state.replace_transcript(validated);
        }
    }
}

/// Join handle that aborts its task when dropped before completion.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn stage_envelope(key: StageKey, record: Value) -> Value {
    let mut envelope = Map::new();
    envelope.insert(key.as_str().to_string(), record);
    Value::Object(envelope)
}
