use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Where in the pipeline content is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    /// The raw transcript, before the first stage.
    Input,
    /// Each stage's structured output.
    StageOutput,
    /// The final user-facing report.
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PolicyCheck {
    Toxic,
    Profanity,
    Gibberish,
    Pii,
    SensitiveTopics,
}

/// What happens when a check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PolicyAction {
    /// Record pass/fail only; content is untouched.
    Flag,
    /// The backend may rewrite or redact the content.
    Fix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Policy {
    pub check: PolicyCheck,
    pub action: PolicyAction,
}

impl Policy {
    pub const fn flag(check: PolicyCheck) -> Self {
        Self {
            check,
            action: PolicyAction::Flag,
        }
    }

    pub const fn fix(check: PolicyCheck) -> Self {
        Self {
            check,
            action: PolicyAction::Fix,
        }
    }

    /// Name recorded in `policy_applied`, e.g. `pii:fix`.
    pub fn label(&self) -> String {
        format!("{}:{}", self.check, self.action)
    }
}

const INPUT_POLICIES: &[Policy] = &[
    Policy::flag(PolicyCheck::Toxic),
    Policy::flag(PolicyCheck::Profanity),
    Policy::flag(PolicyCheck::Gibberish),
];

const STAGE_OUTPUT_POLICIES: &[Policy] = &[Policy::fix(PolicyCheck::Pii)];

const REPORT_POLICIES: &[Policy] = &[
    Policy::flag(PolicyCheck::Toxic),
    Policy::fix(PolicyCheck::Profanity),
    Policy::fix(PolicyCheck::Pii),
    Policy::flag(PolicyCheck::SensitiveTopics),
];

impl Channel {
    /// The fixed, ordered policy table for this channel.
    pub fn policies(&self) -> &'static [Policy] {
        match self {
            Channel::Input => INPUT_POLICIES,
            Channel::StageOutput => STAGE_OUTPUT_POLICIES,
            Channel::Report => REPORT_POLICIES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_tables() {
        let labels = |c: Channel| c.policies().iter().map(Policy::label).collect::<Vec<_>>();
        assert_eq!(
            labels(Channel::Input),
            vec!["toxic:flag", "profanity:flag", "gibberish:flag"]
        );
        assert_eq!(labels(Channel::StageOutput), vec!["pii:fix"]);
        assert_eq!(
            labels(Channel::Report),
            vec![
                "toxic:flag",
                "profanity:fix",
                "pii:fix",
                "sensitive_topics:flag"
            ]
        );
    }
}
