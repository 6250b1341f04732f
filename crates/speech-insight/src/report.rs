//! Final report generation from a combined pipeline result.

use crate::completion::CompletionError;
use crate::prompt::PromptError;
use crate::retriever::{AnalysisType, RetrievalMetrics};
use crate::stage::PipelineServices;
use crate::state::StageKey;
use crate::validator::{Channel, ValidationMetadata};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Weak area used when the analyses reveal nothing specific.
pub const GENERAL_WEAK_AREA: &str = "general speaking skills";

const CLARITY_THRESHOLD: f64 = 70.0;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// A generated report plus what went into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub text: String,
    pub weak_areas: Vec<String>,
    pub validation: ValidationMetadata,
}

fn lowered(record: &Map<String, Value>, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.to_lowercase(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string().to_lowercase(),
    }
}

/// Derives improvement areas from the stage records of a combined result.
///
/// Degraded or non-mapping records contribute nothing. Never returns an
/// empty list.
pub fn identify_weak_areas(combined: &Value) -> Vec<String> {
    let record = |key: StageKey| combined.get(key.as_str()).and_then(Value::as_object);
    let mut areas = Vec::new();

    if let Some(comm) = record(StageKey::Communication) {
        if comm
            .get("clarity_score")
            .and_then(Value::as_f64)
            .is_some_and(|score| score < CLARITY_THRESHOLD)
        {
            areas.push("clarity");
        }
        if matches!(lowered(comm, "fluency_level").as_str(), "poor" | "average") {
            areas.push("fluency");
        }
        if matches!(
            lowered(comm, "speech_structure").as_str(),
            "disorganized" | "basic"
        ) {
            areas.push("speech structure");
        }
    }

    if let Some(conf) = record(StageKey::ConfidenceEmotion) {
        if lowered(conf, "confidence_level") == "low" {
            areas.push("confidence");
        }
        if matches!(lowered(conf, "nervousness").as_str(), "high" | "medium") {
            areas.push("nervousness reduction");
        }
    }

    if let Some(pers) = record(StageKey::Personality)
        && lowered(pers, "assertiveness") == "low"
    {
        areas.push("assertiveness");
    }

    if areas.is_empty() {
        areas.push(GENERAL_WEAK_AREA);
    }
    areas.into_iter().map(str::to_string).collect()
}

/// Turns a combined result into a user-facing report.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    services: Arc<PipelineServices>,
}

impl ReportGenerator {
    pub fn new(services: Arc<PipelineServices>) -> Self {
        Self { services }
    }

    /// Retrieves improvement advice, renders the report prompt, calls the
    /// completion backend and validates the text on the report channel.
    ///
    /// Unlike stages, a failed completion is returned to the caller.
    pub async fn generate(&self, combined: &Value) -> Result<Report, ReportError> {
        let services = &self.services;
        let weak_areas = identify_weak_areas(combined);

        let metrics = RetrievalMetrics::default().with_weak_areas(weak_areas.clone());
        let context = services
            .retriever()
            .get_context(AnalysisType::Improvement, &metrics)
            .await;

        let prompt = services.prompts().render_report(combined, &context)?;
        debug!(
            target: "speech_insight::report",
            weak_areas = ?weak_areas,
            has_context = !context.is_empty(),
            "Rendered report prompt"
        );

        let text = services.complete(&prompt).await?;

        let outcome = services
            .validator()
            .validate(Value::String(text.clone()), Channel::Report)
            .await;
        let text = match outcome.content {
            Value::String(validated) => validated,
            _ => text,
        };

        info!(
            target: "speech_insight::report",
            passed = outcome.metadata.passed,
            "Report generated"
        );

        Ok(Report {
            text,
            weak_areas,
            validation: outcome.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_weak_areas_from_all_stages() {
        let combined = json!({
            "communication_analysis": {
                "clarity_score": 60,
                "fluency_level": "Average",
                "speech_structure": "Basic"
            },
            "confidence_emotion_analysis": {
                "confidence_level": "Low",
                "nervousness": "Medium"
            },
            "personality_analysis": {"assertiveness": "low"}
        });

        assert_eq!(
            identify_weak_areas(&combined),
            vec![
                "clarity",
                "fluency",
                "speech structure",
                "confidence",
                "nervousness reduction",
                "assertiveness"
            ]
        );
    }

    #[test]
    fn test_strong_results_fall_back_to_general_area() {
        let combined = json!({
            "communication_analysis": {
                "clarity_score": 85,
                "fluency_level": "Good",
                "speech_structure": "Structured"
            },
            "confidence_emotion_analysis": {"confidence_level": "High", "nervousness": "Low"},
            "personality_analysis": {"assertiveness": "Moderate"}
        });
        assert_eq!(identify_weak_areas(&combined), vec![GENERAL_WEAK_AREA]);
    }

    #[test]
    fn test_degraded_records_contribute_nothing() {
        let combined = json!({
            "communication_analysis": {"error": "boom", "status": "failed"},
            "confidence_emotion_analysis": "not a mapping"
        });
        assert_eq!(identify_weak_areas(&combined), vec![GENERAL_WEAK_AREA]);
    }
}
