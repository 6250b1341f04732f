//! Configuration for pipeline execution behavior.

use crate::parser::ParsingConfig;
use crate::prompt::DEFAULT_TRANSCRIPT_CHAR_LIMIT;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const ENV_TRANSCRIPT_LIMIT: &str = "SPEECH_INSIGHT_TRANSCRIPT_LIMIT";
pub const ENV_RAW_LIMIT: &str = "SPEECH_INSIGHT_RAW_LIMIT";
pub const ENV_COMPLETION_TIMEOUT_SECS: &str = "SPEECH_INSIGHT_COMPLETION_TIMEOUT_SECS";
pub const ENV_COMPLETION_RETRIES: &str = "SPEECH_INSIGHT_COMPLETION_RETRIES";

/// Configuration for pipeline execution behavior.
///
/// # Examples
///
/// ```
/// use speech_insight::config::PipelineConfig;
/// use std::time::Duration;
///
/// let config = PipelineConfig {
///     completion_timeout: Some(Duration::from_secs(30)),
///     ..Default::default()
/// };
/// assert_eq!(config.completion_max_retries, 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Transcript characters included in stage prompts.
    ///
    /// **Default:** 500
    pub transcript_char_limit: usize,

    /// Characters of unparseable completion text kept in a `parse_failed` record.
    ///
    /// **Default:** 500
    pub raw_char_limit: usize,

    /// Upper bound on a single completion call. An expired call is a
    /// stage-local failure.
    ///
    /// **Default:** `None` (unbounded)
    pub completion_timeout: Option<Duration>,

    /// Retries after the first completion attempt, for retryable errors only.
    ///
    /// **Default:** 0
    pub completion_max_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transcript_char_limit: DEFAULT_TRANSCRIPT_CHAR_LIMIT,
            raw_char_limit: ParsingConfig::default().raw_char_limit,
            completion_timeout: None,
            completion_max_retries: 0,
        }
    }
}

impl PipelineConfig {
    /// Loads configuration from environment variables.
    ///
    /// Environment variables (all optional):
    /// - `SPEECH_INSIGHT_TRANSCRIPT_LIMIT`
    /// - `SPEECH_INSIGHT_RAW_LIMIT`
    /// - `SPEECH_INSIGHT_COMPLETION_TIMEOUT_SECS`
    /// - `SPEECH_INSIGHT_COMPLETION_RETRIES`
    ///
    /// Unset or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            transcript_char_limit: env_or(ENV_TRANSCRIPT_LIMIT, defaults.transcript_char_limit),
            raw_char_limit: env_or(ENV_RAW_LIMIT, defaults.raw_char_limit),
            completion_timeout: env_parse::<u64>(ENV_COMPLETION_TIMEOUT_SECS)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .or(defaults.completion_timeout),
            completion_max_retries: env_or(
                ENV_COMPLETION_RETRIES,
                defaults.completion_max_retries,
            ),
        }
    }

    /// Parser settings derived from this configuration.
    pub fn parsing(&self) -> ParsingConfig {
        ParsingConfig::default().with_raw_char_limit(self.raw_char_limit)
    }
}

fn env_parse<T: FromStr>(var: &str) -> Option<T> {
    let raw = env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(
                target: "speech_insight::config",
                var,
                value = %raw,
                "Ignoring unparseable configuration value"
            );
            None
        }
    }
}

fn env_or<T: FromStr>(var: &str, default: T) -> T {
    env_parse(var).unwrap_or(default)
}
