//! Inference backend abstractions for govern-runtime.
//!
//! This module defines the trait every text-generation backend implements
//! and includes an HTTP implementation for Ollama-compatible servers.
//!
//! ## Security
//!
//! Backends that authenticate use [`ApiToken`] from the [`secrets`] module,
//! which keeps tokens out of `Debug` output and logs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod factory;
pub mod secrets;

#[cfg(feature = "ollama")]
mod ollama;

pub use factory::{BackendFactory, BackendRegistry};
pub use secrets::{ApiToken, TokenSource};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaBackend, OllamaBackendFactory};

/// Errors from a single backend call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid backend response: {0}")]
    Parse(String),

    #[error("Model not available: {0}")]
    ModelNotFound(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),
}

impl BackendError {
    /// Whether re-issuing the same request may succeed.
    ///
    /// Transport failures, timeouts, rate limits and server errors are
    /// retryable; malformed requests and unparsable responses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Connection(_) | BackendError::Timeout(_) => true,
            BackendError::Api { status, .. } => *status == 429 || *status >= 500,
            BackendError::Parse(_)
            | BackendError::ModelNotFound(_)
            | BackendError::NotConfigured(_) => false,
        }
    }
}

/// Output format requested from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub system: Option<String>,
    pub format: ResponseFormat,

    /// Sampling temperature (0.0 for deterministic)
    pub temperature: f32,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            format: ResponseFormat::Text,
            temperature: 0.0,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.format = ResponseFormat::Json;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Token counts reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Response from a generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    /// Generated text
    pub text: String,

    /// Parsed JSON, when JSON output was requested and the text parsed
    pub structured: Option<serde_json::Value>,

    pub usage: TokenUsage,

    /// Backend-reported generation time
    pub duration: Duration,

    pub model: String,
}

impl GenerateResponse {
    /// Build a response, parsing `text` as JSON when requested.
    pub fn new(text: impl Into<String>, model: impl Into<String>, format: ResponseFormat) -> Self {
        let text = text.into();
        let structured = match format {
            ResponseFormat::Json => serde_json::from_str(&text).ok(),
            ResponseFormat::Text => None,
        };
        Self {
            text,
            structured,
            usage: TokenUsage::default(),
            duration: Duration::ZERO,
            model: model.into(),
        }
    }
}

/// Backend abstraction allows swapping inference services.
///
/// This is the only place where model calls are made. Retry, caching and
/// timeouts are layered on top by the adapter.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Whether the service answers at all.
    async fn ping(&self) -> bool;

    /// Names of the models the service currently has loaded.
    async fn list_models(&self) -> Result<Vec<String>, BackendError>;

    /// Run one generation.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, BackendError>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerateRequest::new("llama3.1", "Review this")
            .with_system("You are a reviewer")
            .json()
            .with_temperature(0.2);

        assert_eq!(request.format, ResponseFormat::Json);
        assert_eq!(request.system.as_deref(), Some("You are a reviewer"));
        assert_eq!(request.temperature, 0.2);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(BackendError::Connection("refused".into()).is_retryable());
        assert!(BackendError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(BackendError::Api { status: 503, message: String::new() }.is_retryable());
        assert!(BackendError::Api { status: 429, message: String::new() }.is_retryable());
        assert!(!BackendError::Api { status: 400, message: String::new() }.is_retryable());
        assert!(!BackendError::Parse("bad".into()).is_retryable());
    }

    #[test]
    fn test_response_parses_json() {
        let response = GenerateResponse::new(r#"{"violations": []}"#, "m", ResponseFormat::Json);
        assert!(response.structured.is_some());

        let response = GenerateResponse::new("not json", "m", ResponseFormat::Json);
        assert!(response.structured.is_none());
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }
}
