//! Completion backed by the Ollama HTTP API.
//!
//! ```rust,no_run
//! use speech_insight::completion::{Completion, OllamaCompletion};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let completion = OllamaCompletion::from_env();
//! let text = completion.invoke("You are a Communication Analysis AI Agent.").await?;
//! # Ok(())
//! # }
//! ```

use super::Completion;
use super::error::CompletionError;
use async_trait::async_trait;
use ollama_rs::Ollama;
use ollama_rs::generation::completion::request::GenerationRequest;
use std::env;
use std::fmt;

const DEFAULT_MODEL: &str = "llama3";
const DEFAULT_HOST: &str = "http://localhost";
const DEFAULT_PORT: u16 = 11434;

#[derive(Clone)]
pub struct OllamaCompletion {
    client: Ollama,
    model: String,
    endpoint: String,
}

impl fmt::Debug for OllamaCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaCompletion")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Default for OllamaCompletion {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaCompletion {
    /// Defaults to `http://localhost:11434` and `llama3`.
    pub fn new() -> Self {
        Self {
            client: Ollama::new(DEFAULT_HOST.to_string(), DEFAULT_PORT),
            model: DEFAULT_MODEL.to_string(),
            endpoint: format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT),
        }
    }

    /// Reads `OLLAMA_HOST` and `OLLAMA_MODEL`, falling back to the defaults.
    pub fn from_env() -> Self {
        let endpoint = env::var("OLLAMA_HOST")
            .unwrap_or_else(|_| format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT));
        let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self::new().with_endpoint(endpoint).with_model(model)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Endpoint format: `http://host:port`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let (host, port) = parse_endpoint(&endpoint);
        self.client = Ollama::new(host, port);
        self.endpoint = endpoint;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the server answers a model listing.
    pub async fn is_healthy(&self) -> bool {
        self.client.list_local_models().await.is_ok()
    }
}

/// "http://localhost:11434" -> ("http://localhost", 11434)
fn parse_endpoint(endpoint: &str) -> (String, u16) {
    if let Some(pos) = endpoint.rfind(':')
        && let Ok(port) = endpoint[pos + 1..].parse::<u16>()
    {
        return (endpoint[..pos].to_string(), port);
    }
    (DEFAULT_HOST.to_string(), DEFAULT_PORT)
}

#[async_trait]
impl Completion for OllamaCompletion {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn invoke(&self, prompt: &str) -> Result<String, CompletionError> {
        if prompt.trim().is_empty() {
            return Err(CompletionError::EmptyPrompt);
        }

        let request = GenerationRequest::new(self.model.clone(), prompt.to_string());

        match self.client.generate(request).await {
            Ok(response) => Ok(response.response),
            Err(e) => {
                let message = e.to_string();
                let transient = message.contains("connection")
                    || message.contains("timeout")
                    || message.contains("temporarily");

                if transient {
                    Err(CompletionError::Transport(format!("Ollama API error: {message}")))
                } else {
                    Err(CompletionError::Other(format!("Ollama API error: {message}")))
                }
            }
        }
    }
}
