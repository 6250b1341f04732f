//! Free-text query construction from analysis metrics.

use crate::knowledge::Category;
use crate::state::{AnalysisState, StageKey, feature_number, feature_text, truncate_chars};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Characters of transcript carried as a preview in communication metrics.
pub const TRANSCRIPT_PREVIEW_CHARS: usize = 100;

/// The kind of analysis a context block is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Communication,
    Confidence,
    Personality,
    Improvement,
}

impl AnalysisType {
    /// Corpus category searched first for this analysis.
    pub fn category(&self) -> Category {
        match self {
            AnalysisType::Communication => Category::Communication,
            AnalysisType::Confidence => Category::Confidence,
            AnalysisType::Personality => Category::Personality,
            AnalysisType::Improvement => Category::Improvement,
        }
    }

    /// Title-case name used in the context header.
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisType::Communication => "Communication",
            AnalysisType::Confidence => "Confidence",
            AnalysisType::Personality => "Personality",
            AnalysisType::Improvement => "Improvement",
        }
    }

    /// Fixed topic phrase every query of this type starts with.
    pub fn topic_phrase(&self) -> &'static str {
        match self {
            AnalysisType::Communication => {
                "speech communication clarity fluency vocabulary structure"
            }
            AnalysisType::Confidence => "confidence vocal delivery emotional tone",
            AnalysisType::Personality => {
                "personality traits communication style behavioral indicators"
            }
            AnalysisType::Improvement => "improvement tips techniques recommendations",
        }
    }
}

impl From<StageKey> for AnalysisType {
    fn from(key: StageKey) -> Self {
        match key {
            StageKey::Communication => AnalysisType::Communication,
            StageKey::ConfidenceEmotion => AnalysisType::Confidence,
            StageKey::Personality => AnalysisType::Personality,
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category())
    }
}

/// Metric values that condition a retrieval query.
///
/// Every field is optional; absent fields add nothing to the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalMetrics {
    pub speech_rate: Option<f64>,
    pub pause_ratio: Option<f64>,
    pub pitch_variance: Option<f64>,
    pub energy_level: Option<String>,
    pub transcript_preview: Option<String>,
    pub fluency_level: Option<String>,
    pub confidence_level: Option<String>,
    pub emotion: Option<String>,
    #[serde(default)]
    pub weak_areas: Vec<String>,
}

impl RetrievalMetrics {
    /// Collects the metrics a stage's retrieval query is conditioned on.
    ///
    /// Personality metrics are read from earlier stage outputs, and only when
    /// those outputs are mappings.
    pub fn for_stage(key: StageKey, state: &AnalysisState) -> Self {
        let features = state.audio_features();
        match key {
            StageKey::Communication => RetrievalMetrics {
                speech_rate: feature_number(features, "speech_rate"),
                pause_ratio: feature_number(features, "pause_ratio"),
                transcript_preview: state
                    .transcript()
                    .filter(|t| !t.is_empty())
                    .map(|t| truncate_chars(t, TRANSCRIPT_PREVIEW_CHARS)),
                ..Default::default()
            },
            StageKey::ConfidenceEmotion => RetrievalMetrics {
                energy_level: features
                    .and_then(|f| f.get("energy_level"))
                    .filter(|v| !v.is_null())
                    .map(|_| feature_text(features, "energy_level")),
                pitch_variance: feature_number(features, "pitch_variance"),
                pause_ratio: feature_number(features, "pause_ratio"),
                ..Default::default()
            },
            StageKey::Personality => {
                let communication = state.stage_record(StageKey::Communication);
                let confidence = state.stage_record(StageKey::ConfidenceEmotion);
                RetrievalMetrics {
                    fluency_level: communication.and_then(|m| text_field(m.get("fluency_level"))),
                    confidence_level: confidence
                        .and_then(|m| text_field(m.get("confidence_level"))),
                    emotion: confidence.and_then(|m| text_field(m.get("emotion"))),
                    ..Default::default()
                }
            }
        }
    }

    pub fn with_weak_areas(mut self, weak_areas: Vec<String>) -> Self {
        self.weak_areas = weak_areas;
        self
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Renders a number the way a person would write it: `140`, not `140.0`.
fn number_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn speech_rate_phrase(rate: f64) -> &'static str {
    if rate < 120.0 {
        "slow speech rate thoughtful delivery"
    } else if rate > 160.0 {
        "fast speech rate rapid delivery"
    } else {
        "normal speech rate optimal pacing"
    }
}

fn pitch_variance_phrase(variance: f64) -> &'static str {
    if variance > 40.0 {
        "high pitch variance nervous emotional"
    } else if variance < 10.0 {
        "low pitch variance monotone"
    } else {
        "normal pitch variance engaged speaking"
    }
}

/// Builds the composite query text for an analysis type.
pub fn build_query(analysis_type: AnalysisType, metrics: &RetrievalMetrics) -> String {
    let mut parts: Vec<String> = vec![analysis_type.topic_phrase().to_string()];

    match analysis_type {
        AnalysisType::Communication => {
            if let Some(rate) = metrics.speech_rate {
                parts.push(speech_rate_phrase(rate).to_string());
                parts.push(format!("{} words per minute WPM", number_text(rate)));
            }
            if let Some(pause) = metrics.pause_ratio {
                let phrase = if pause > 0.25 {
                    "high pause ratio hesitation disfluency"
                } else {
                    "good fluency smooth delivery"
                };
                parts.push(phrase.to_string());
            }
            if metrics.transcript_preview.as_deref().is_some_and(|t| !t.is_empty()) {
                parts.push("transcript analysis vocabulary assessment".to_string());
            }
        }
        AnalysisType::Confidence => {
            if let Some(energy) = &metrics.energy_level {
                parts.push(format!("{} energy level projection", energy.to_lowercase()));
            }
            if let Some(variance) = metrics.pitch_variance {
                parts.push(pitch_variance_phrase(variance).to_string());
            }
            if let Some(pause) = metrics.pause_ratio {
                let phrase = if pause > 0.25 {
                    "hesitation pauses uncertainty"
                } else {
                    "confident pauses strategic"
                };
                parts.push(phrase.to_string());
            }
        }
        AnalysisType::Personality => {
            if let Some(fluency) = &metrics.fluency_level {
                parts.push(format!("{fluency} fluency expressiveness"));
            }
            if let Some(confidence) = &metrics.confidence_level {
                parts.push(format!("{confidence} confidence assertiveness"));
            }
            if let Some(emotion) = &metrics.emotion {
                parts.push(format!("{emotion} emotional state"));
            }
        }
        AnalysisType::Improvement => {
            if metrics.weak_areas.is_empty() {
                parts.push("speaking skills confidence building clarity enhancement".to_string());
            } else {
                parts.extend(metrics.weak_areas.iter().map(|area| format!("improve {area}")));
            }
        }
    }

    parts.join(" ")
}
