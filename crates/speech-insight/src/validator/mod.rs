//! Optional content-safety and redaction layer.
//!
//! Validation is selected when the pipeline is composed: [`NoopValidator`]
//! passes everything through, [`PolicyValidator`] runs the fixed policy table
//! of a [`Channel`] through a [`ValidationBackend`]. Neither ever blocks the
//! pipeline; internal faults come back as an `error` annotation next to the
//! original content.

pub mod error;
pub mod policy;
pub mod rules;

pub use error::ValidationError;
pub use policy::{Channel, Policy, PolicyAction, PolicyCheck};
pub use rules::{PolicyVerdict, RuleBasedBackend, ValidationBackend};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// What a validator did to a piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetadata {
    /// False when no real validator is configured.
    pub available: bool,
    pub channel: Channel,
    /// Labels of the policies that ran, in order.
    pub policy_applied: Vec<String>,
    pub passed: bool,
    /// Labels of the policies whose check failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flagged: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationMetadata {
    pub fn unavailable(channel: Channel) -> Self {
        Self {
            available: false,
            channel,
            policy_applied: Vec::new(),
            passed: true,
            flagged: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub content: Value,
    pub metadata: ValidationMetadata,
}

impl ValidationOutcome {
    pub fn into_content(self) -> Value {
        self.content
    }
}

/// Checks, and possibly rewrites, content flowing through a channel.
#[async_trait]
pub trait OutputValidator: Send + Sync {
    fn is_available(&self) -> bool;

    /// Validates `content`. Never fails; faults are reported in the metadata.
    async fn validate(&self, content: Value, channel: Channel) -> ValidationOutcome;
}

/// The named pass-through default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

#[async_trait]
impl OutputValidator for NoopValidator {
    fn is_available(&self) -> bool {
        false
    }

    async fn validate(&self, content: Value, channel: Channel) -> ValidationOutcome {
        ValidationOutcome {
            content,
            metadata: ValidationMetadata::unavailable(channel),
        }
    }
}

/// Runs each channel's policy table through a [`ValidationBackend`].
///
/// Non-string content is serialized to JSON for checking. When fixes leave
/// text that no longer parses, the original structured value is kept.
#[derive(Debug, Clone)]
pub struct PolicyValidator<B: ValidationBackend> {
    backend: B,
}

impl<B: ValidationBackend> PolicyValidator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl PolicyValidator<RuleBasedBackend> {
    pub fn rule_based() -> Self {
        Self::new(RuleBasedBackend::new())
    }
}

impl<B: ValidationBackend> PolicyValidator<B> {
    async fn apply_policies(
        &self,
        text: String,
        channel: Channel,
        metadata: &mut ValidationMetadata,
    ) -> Result<String, ValidationError> {
        let mut current = text;

        for policy in channel.policies() {
            let verdict = self.backend.validate(&current, policy).await?;
            metadata.policy_applied.push(policy.label());

            if !verdict.passed {
                metadata.passed = false;
                metadata.flagged.push(policy.label());
                debug!(
                    target: "speech_insight::validator",
                    channel = %channel,
                    policy = %policy.label(),
                    findings = ?verdict.findings,
                    "Policy check failed"
                );
            }

            if policy.action == PolicyAction::Fix {
                current = verdict.content;
            }
        }

        Ok(current)
    }
}

#[async_trait]
impl<B: ValidationBackend> OutputValidator for PolicyValidator<B> {
    fn is_available(&self) -> bool {
        true
    }

    async fn validate(&self, content: Value, channel: Channel) -> ValidationOutcome {
        let mut metadata = ValidationMetadata {
            available: true,
            channel,
            policy_applied: Vec::new(),
            passed: true,
            flagged: Vec::new(),
            error: None,
        };

        let text = match &content {
            Value::String(s) => s.clone(),
            other => match serde_json::to_string(other) {
                Ok(text) => text,
                Err(e) => {
                    metadata.error = Some(ValidationError::from(e).to_string());
                    return ValidationOutcome { content, metadata };
                }
            },
        };

        let validated = match self.apply_policies(text, channel, &mut metadata).await {
            Ok(validated) => validated,
            Err(e) => {
                warn!(
                    target: "speech_insight::validator",
                    channel = %channel,
                    backend = self.backend.name(),
                    error = %e,
                    "Validation failed, keeping original content"
                );
                metadata.error = Some(e.to_string());
                return ValidationOutcome { content, metadata };
            }
        };

        if !metadata.passed {
            info!(
                target: "speech_insight::validator",
                channel = %channel,
                flagged = ?metadata.flagged,
                "Validation flagged issues"
            );
        }

        let content = match content {
            Value::String(_) => Value::String(validated),
            original => match serde_json::from_str::<Value>(&validated) {
                Ok(rewritten) => rewritten,
                Err(e) => {
                    debug!(
                        target: "speech_insight::validator",
                        channel = %channel,
                        error = %e,
                        "Fixed content no longer parses, keeping original"
                    );
                    original
                }
            },
        };

        ValidationOutcome { content, metadata }
    }
}
