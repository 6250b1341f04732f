//! Deterministic content checks backing [`PolicyValidator`](super::PolicyValidator).

use super::error::ValidationError;
use super::policy::{Policy, PolicyAction, PolicyCheck};
use async_trait::async_trait;
use regex::{Captures, Regex};

/// Result of running one policy over a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyVerdict {
    pub passed: bool,
    /// The content after any fix. Equal to the input for flag policies.
    pub content: String,
    /// Human-readable descriptions of what was found.
    pub findings: Vec<String>,
}

impl PolicyVerdict {
    pub fn pass(content: impl Into<String>) -> Self {
        Self {
            passed: true,
            content: content.into(),
            findings: Vec::new(),
        }
    }
}

/// A content-safety capability that checks text against one policy at a time.
#[async_trait]
pub trait ValidationBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn validate(&self, content: &str, policy: &Policy)
    -> Result<PolicyVerdict, ValidationError>;
}

const TOXIC_TERMS: &[&str] = &[
    "idiot", "stupid", "moron", "loser", "pathetic", "worthless", "shut up", "hate you",
    "kill you",
];

const PROFANE_TERMS: &[&str] = &[
    "damn", "hell", "crap", "shit", "fuck", "fucking", "bitch", "bastard", "asshole",
];

const SENSITIVE_TERMS: &[&str] = &[
    "politics", "political", "religion", "religious", "election", "abortion", "suicide",
    "terrorism", "drugs",
];

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}";
const PHONE_PATTERN: &str = r"\+?\d[\d\s().\-]{7,}\d";

pub const EMAIL_PLACEHOLDER: &str = "<EMAIL_ADDRESS>";
pub const PHONE_PLACEHOLDER: &str = "<PHONE_NUMBER>";

/// Keyword lists and regular expressions standing in for a hosted
/// content-safety service. Deterministic and offline.
#[derive(Debug, Clone)]
pub struct RuleBasedBackend {
    /// Fraction of implausible words above which text counts as gibberish
    pub gibberish_threshold: f64,

    /// Texts with fewer words than this are never flagged as gibberish
    pub gibberish_min_words: usize,
}

impl Default for RuleBasedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedBackend {
    pub fn new() -> Self {
        Self {
            gibberish_threshold: 0.5,
            gibberish_min_words: 3,
        }
    }

    fn term_regex(terms: &[&str]) -> Result<Regex, ValidationError> {
        let alternation = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        Ok(Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?)
    }

    fn check_terms(
        &self,
        content: &str,
        terms: &[&str],
        action: PolicyAction,
    ) -> Result<PolicyVerdict, ValidationError> {
        let regex = Self::term_regex(terms)?;
        let findings: Vec<String> = regex
            .find_iter(content)
            .map(|m| m.as_str().to_lowercase())
            .collect();

        if findings.is_empty() {
            return Ok(PolicyVerdict::pass(content));
        }

        let content = match action {
            PolicyAction::Flag => content.to_string(),
            PolicyAction::Fix => regex
                .replace_all(content, |caps: &Captures| "*".repeat(caps[0].chars().count()))
                .into_owned(),
        };

        Ok(PolicyVerdict {
            passed: false,
            content,
            findings,
        })
    }

    fn check_pii(&self, content: &str, action: PolicyAction) -> Result<PolicyVerdict, ValidationError> {
        let email = Regex::new(EMAIL_PATTERN)?;
        let phone = Regex::new(PHONE_PATTERN)?;

        let mut findings = Vec::new();
        if email.is_match(content) {
            findings.push("email address".to_string());
        }
        if phone.is_match(content) {
            findings.push("phone number".to_string());
        }

        if findings.is_empty() {
            return Ok(PolicyVerdict::pass(content));
        }

        let content = match action {
            PolicyAction::Flag => content.to_string(),
            PolicyAction::Fix => {
                let redacted = email.replace_all(content, EMAIL_PLACEHOLDER);
                phone.replace_all(&redacted, PHONE_PLACEHOLDER).into_owned()
            }
        };

        Ok(PolicyVerdict {
            passed: false,
            content,
            findings,
        })
    }

    fn check_gibberish(&self, content: &str) -> PolicyVerdict {
        let words: Vec<String> = content
            .split_whitespace()
            .map(|w| {
                w.chars()
                    .filter(|c| c.is_alphabetic())
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        if words.len() < self.gibberish_min_words {
            return PolicyVerdict::pass(content);
        }

        let implausible = words.iter().filter(|w| is_implausible_word(w)).count();
        let ratio = implausible as f64 / words.len() as f64;

        if ratio > self.gibberish_threshold {
            PolicyVerdict {
                passed: false,
                content: content.to_string(),
                findings: vec![format!("{implausible} of {} words look like gibberish", words.len())],
            }
        } else {
            PolicyVerdict::pass(content)
        }
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Long words without vowels or with six consonants in a row.
fn is_implausible_word(word: &str) -> bool {
    if !word.is_ascii() || word.chars().count() < 4 {
        return false;
    }
    if !word.chars().any(is_vowel) {
        return true;
    }

    let mut run = 0;
    for c in word.chars() {
        if is_vowel(c) {
            run = 0;
        } else {
            run += 1;
            if run >= 6 {
                return true;
            }
        }
    }
    false
}

#[async_trait]
impl ValidationBackend for RuleBasedBackend {
    fn name(&self) -> &str {
        "rule-based"
    }

    async fn validate(
        &self,
        content: &str,
        policy: &Policy,
    ) -> Result<PolicyVerdict, ValidationError> {
        match policy.check {
            PolicyCheck::Toxic => self.check_terms(content, TOXIC_TERMS, policy.action),
            PolicyCheck::Profanity => self.check_terms(content, PROFANE_TERMS, policy.action),
            PolicyCheck::SensitiveTopics => {
                self.check_terms(content, SENSITIVE_TERMS, policy.action)
            }
            PolicyCheck::Pii => self.check_pii(content, policy.action),
            // Gibberish is never rewritten.
            PolicyCheck::Gibberish => Ok(self.check_gibberish(content)),
        }
    }
}
