//! The text-completion capability consumed by every stage.
//!
//! [`Completion`] is the only seam between the pipeline and a language model.
//! [`StubCompletion`] answers deterministically; `OllamaCompletion` (feature
//! `ollama-api`) talks to a local Ollama server.

pub mod error;
#[cfg(feature = "ollama-api")]
pub mod ollama;
pub mod retry;
pub mod stub;

pub use error::CompletionError;
#[cfg(feature = "ollama-api")]
pub use ollama::OllamaCompletion;
pub use retry::retry_completion;
pub use stub::StubCompletion;

use async_trait::async_trait;

/// Turns a prompt into completion text. May fail.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    async fn invoke(&self, prompt: &str) -> Result<String, CompletionError>;
}
