use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompletionError {
    #[error("Completion transport error: {0}")]
    Transport(String),

    #[error("Completion backend unavailable: {0}")]
    Unavailable(String),

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Completion prompt is empty")]
    EmptyPrompt,

    #[error("Completion failed: {0}")]
    Other(String),
}

impl CompletionError {
    /// Check if this error should trigger an automatic retry.
    ///
    /// Transport failures and timeouts are likely transient. Everything else
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::Transport(_) | CompletionError::Timeout(_)
        )
    }

    /// Exponential backoff starting at 100ms, capped at 2s.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(5);
        Duration::from_millis(100 * 2u64.pow(exponent)).min(Duration::from_secs(2))
    }
}
