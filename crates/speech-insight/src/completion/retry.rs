//! Bounded retry for completion calls.

use super::error::CompletionError;
use std::future::Future;
use tracing::{error, info, warn};

/// Executes a completion operation with retry logic.
///
/// Only errors marked as retryable are retried, at most `max_retries` times
/// after the first attempt. The last error is returned when retries are
/// exhausted.
///
/// # Examples
///
/// ```rust
/// use speech_insight::completion::{CompletionError, retry_completion};
///
/// # let runtime = tokio::runtime::Runtime::new().unwrap();
/// # runtime.block_on(async {
/// let result = retry_completion(2, "prompt", |p: &str| {
///     let echoed = p.to_uppercase();
///     async move { Ok::<_, CompletionError>(echoed) }
/// })
/// .await;
/// assert_eq!(result.unwrap(), "PROMPT");
/// # });
/// ```
pub async fn retry_completion<F, Fut, T>(
    max_retries: u32,
    prompt: &str,
    operation: F,
) -> Result<T, CompletionError>
where
    F: Fn(&str) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, CompletionError>> + Send,
    T: Send,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation(prompt).await {
            Ok(output) => {
                if attempts > 1 {
                    info!(
                        target: "speech_insight::completion",
                        attempt = attempts,
                        max_attempts = max_retries + 1,
                        "Completion succeeded after retry"
                    );
                }
                return Ok(output);
            }
            Err(e) if e.is_retryable() && attempts <= max_retries => {
                let delay = e.retry_delay(attempts);
                warn!(
                    target: "speech_insight::completion",
                    attempt = attempts,
                    max_attempts = max_retries + 1,
                    error = %e,
                    ?delay,
                    "Completion failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_retryable() {
                    error!(
                        target: "speech_insight::completion",
                        attempts,
                        error = %e,
                        "Completion failed, retries exhausted"
                    );
                } else {
                    error!(
                        target: "speech_insight::completion",
                        error = %e,
                        "Completion failed with non-retryable error"
                    );
                }
                return Err(e);
            }
        }
    }
}
