//! Stage prompt templates and their rendering.
//!
//! Templates are `minijinja` templates. The retrieved context block is wrapped
//! in a conditional so an empty context leaves no trace in the prompt.

use crate::state::{AnalysisState, StageKey, feature_text, truncate_chars};
use minijinja::Environment;
use serde::Serialize;
use serde_json::Value;

#[doc(hidden)]
pub use minijinja;

/// Default number of transcript characters placed in a prompt.
pub const DEFAULT_TRANSCRIPT_CHAR_LIMIT: usize = 500;

/// Placeholder for an absent value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Default context text for the report when retrieval found nothing.
pub const NO_RECOMMENDATIONS: &str = "No specific recommendations available.";

pub const COMMUNICATION_TEMPLATE: &str = r#"You are a Communication Analysis AI Agent.

ROLE: Analyze spoken communication using measurable indicators only.
{% if rag_context %}
EXPERT KNOWLEDGE:
{{ rag_context }}
{% endif %}
INPUT DATA:
Transcript: {{ transcript }}

Metrics:
- Speech rate: {{ speech_rate }} words/min
- Pause ratio: {{ pause_ratio }}

ANALYSIS GUIDELINES:
| Metric | Range | Interpretation |
|--------|-------|----------------|
| Speech rate | 120-160 WPM | Normal/optimal |
| Speech rate | <120 WPM | Slow (thoughtful or uncertain) |
| Speech rate | >160 WPM | Fast (excited or nervous) |
| Pause ratio | <0.15 | Fluent delivery |
| Pause ratio | 0.15-0.25 | Normal pauses |
| Pause ratio | >0.25 | Reduced fluency |

TASK: Evaluate communication quality based on metrics. Be objective.

OUTPUT (JSON only, no explanation):
{% raw %}{"clarity_score": <0-100>, "fluency_level": "<Poor|Average|Good|Excellent>", "speech_structure": "<Disorganized|Basic|Structured|Well-structured>", "vocabulary_level": "<Basic|Intermediate|Advanced>"}{% endraw %}"#;

pub const CONFIDENCE_TEMPLATE: &str = r#"You are a Confidence & Emotion Analysis AI Agent.

ROLE: Infer confidence from vocal delivery patterns, not content meaning.
{% if rag_context %}
EXPERT KNOWLEDGE:
{{ rag_context }}
{% endif %}
INPUT FEATURES:
- Pitch variance: {{ pitch_variance }}
- Energy level: {{ energy_level }}
- Pause ratio: {{ pause_ratio }}

ANALYSIS GUIDELINES:
| Pattern | Confidence | Emotion |
|---------|------------|---------|
| Low pitch variance + long pauses | Low | Cautious/Nervous |
| Stable energy + moderate pauses | Moderate | Calm/Engaged |
| High energy + short pauses | High | Confident/Engaged |
| High pitch variance + irregular pauses | Variable | Nervous/Excited |

TASK: Assess confidence and emotional tone conservatively. Avoid assumptions.

OUTPUT (JSON only, no explanation):
{% raw %}{"confidence_level": "<Low|Moderate|High>", "nervousness": "<Low|Medium|High>", "emotion": "<Calm|Engaged|Cautious|Nervous>"}{% endraw %}"#;

pub const PERSONALITY_TEMPLATE: &str = r#"You are a Personality Mapping AI Agent.

ROLE: Map communication patterns to personality tendencies (non-diagnostic).
{% if rag_context %}
EXPERT KNOWLEDGE:
{{ rag_context }}
{% endif %}
INPUT FROM PREVIOUS ANALYSES:
Communication: {{ communication_analysis }}
Confidence & Emotion: {{ confidence_analysis }}

MAPPING GUIDELINES:
| Communication Pattern | Personality Tendency |
|-----------------------|---------------------|
| High clarity + moderate confidence | Professional/Balanced |
| Low expressiveness + calm emotion | Introverted tendency |
| High fluency + high energy | Extroverted tendency |
| Moderate metrics overall | Balanced communicator |

IMPORTANT:
- These are behavioral observations, NOT diagnoses
- Map to communication-oriented traits only
- Use constructive, non-judgmental language

OUTPUT (JSON only, no explanation):
{% raw %}{"personality_type": "<Introvert|Balanced|Extrovert>", "assertiveness": "<Low|Moderate|High>", "expressiveness": "<Low|Moderate|High>"}{% endraw %}"#;

pub const REPORT_TEMPLATE: &str = r#"You are an AI Communication Coach generating a personalized report.

IMPROVEMENT RECOMMENDATIONS:
{{ rag_context }}

ANALYSIS RESULTS:
{{ agent_outputs }}

TASK: Create a friendly, actionable personality and communication report.

GUIDELINES:
- Synthesize analysis into clear insights
- Highlight 2-3 specific strengths
- Provide actionable improvement tips from expert knowledge
- Use bullet points for readability
- Do NOT make medical/psychological diagnoses
- Be encouraging and constructive

STRUCTURE:
1. Communication Overview
2. Confidence & Emotional Tone
3. Personality Insights
4. Key Strengths
5. Improvement Recommendations

Generate the report:"#;

/// Renders a template string using minijinja.
///
/// # Arguments
///
/// * `template` - The template string with minijinja syntax
/// * `context` - Any serializable value providing the template variables
pub fn render_prompt<T: Serialize>(template: &str, context: T) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("prompt", template)?;
    let tmpl = env.get_template("prompt")?;
    tmpl.render(context)
}

/// Creates a prompt string from a template and key-value pairs.
///
/// ```
/// use speech_insight::prompt;
///
/// let p = prompt!("Rate: {{ rate }} WPM", rate = 140).unwrap();
/// assert_eq!(p, "Rate: 140 WPM");
/// ```
#[macro_export]
macro_rules! prompt {
    ($template:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::prompt::render_prompt(
            $template,
            $crate::prompt::minijinja::context!($($key => $value),*),
        )
    };
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Failed to render prompt for '{target}': {source}")]
    RenderFailed {
        target: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Pure, deterministic prompt rendering for each stage and the report.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    transcript_char_limit: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            transcript_char_limit: DEFAULT_TRANSCRIPT_CHAR_LIMIT,
        }
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript_char_limit(mut self, limit: usize) -> Self {
        self.transcript_char_limit = limit;
        self
    }

    /// Renders the prompt for `stage`.
    ///
    /// `rag_context` may be empty, in which case the knowledge block is omitted.
    pub fn render(
        &self,
        stage: StageKey,
        state: &AnalysisState,
        rag_context: &str,
    ) -> Result<String, PromptError> {
        let features = state.audio_features();

        let rendered = match stage {
            StageKey::Communication => crate::prompt!(
                COMMUNICATION_TEMPLATE,
                rag_context = rag_context,
                transcript = truncate_chars(
                    state.transcript().unwrap_or_default(),
                    self.transcript_char_limit
                ),
                speech_rate = feature_text(features, "speech_rate"),
                pause_ratio = feature_text(features, "pause_ratio"),
            ),
            StageKey::ConfidenceEmotion => crate::prompt!(
                CONFIDENCE_TEMPLATE,
                rag_context = rag_context,
                pitch_variance = feature_text(features, "pitch_variance"),
                energy_level = feature_text(features, "energy_level"),
                pause_ratio = feature_text(features, "pause_ratio"),
            ),
            StageKey::Personality => crate::prompt!(
                PERSONALITY_TEMPLATE,
                rag_context = rag_context,
                communication_analysis =
                    prior_output_text(state.stage_output(StageKey::Communication)),
                confidence_analysis =
                    prior_output_text(state.stage_output(StageKey::ConfidenceEmotion)),
            ),
        };

        rendered.map_err(|source| PromptError::RenderFailed {
            target: stage.to_string(),
            source,
        })
    }

    /// Renders the final report prompt from the combined result.
    pub fn render_report(&self, combined: &Value, rag_context: &str) -> Result<String, PromptError> {
        let rag_context = if rag_context.trim().is_empty() {
            NO_RECOMMENDATIONS
        } else {
            rag_context
        };
        let agent_outputs =
            serde_json::to_string_pretty(combined).unwrap_or_else(|_| combined.to_string());

        crate::prompt!(
            REPORT_TEMPLATE,
            rag_context = rag_context,
            agent_outputs = agent_outputs,
        )
        .map_err(|source| PromptError::RenderFailed {
            target: "report".to_string(),
            source,
        })
    }
}

/// Earlier stage outputs appear in prompts as compact JSON, `"N/A"` when absent.
fn prior_output_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
