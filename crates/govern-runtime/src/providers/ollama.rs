//! Ollama-compatible HTTP backend.
//!
//! Speaks the `/api/tags` and `/api/generate` endpoints with streaming
//! disabled. An optional bearer token supports servers behind an
//! authenticating proxy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::{
    factory::BackendFactory, secrets::ApiToken, BackendError, GenerateRequest, GenerateResponse,
    InferenceBackend, ResponseFormat, TokenUsage,
};
use crate::config::BackendConfig;

/// HTTP backend for Ollama servers.
pub struct OllamaBackend {
    base_url: String,
    token: Option<ApiToken>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OllamaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaBackend")
            .field("base_url", &self.base_url)
            .field("token", &self.token)
            .finish()
    }
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            client,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut backend = Self::new(&config.base_url, config.timeout)?;
        backend.token = ApiToken::from_optional_env(config.api_token_env.as_deref())?;
        Ok(backend)
    }

    pub fn with_token(mut self, token: ApiToken) -> Self {
        self.token = Some(token);
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            // Exposed only here, at the point of use
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<OllamaError>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        // The per-call deadline is enforced by the adapter; report zero here
        BackendError::Timeout(Duration::ZERO)
    } else if e.is_decode() {
        BackendError::Parse(e.to_string())
    } else {
        BackendError::Connection(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
    /// Nanoseconds
    #[serde(default)]
    total_duration: u64,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn ping(&self) -> bool {
        match self.send(self.request(reqwest::Method::GET, "/")).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, base_url = %self.base_url, "Backend ping failed");
                false
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .send(self.request(reqwest::Method::GET, "/api/tags"))
            .await?;
        let tags: OllamaTags = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, BackendError> {
        let body = OllamaGenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            format: match request.format {
                ResponseFormat::Json => Some("json"),
                ResponseFormat::Text => None,
            },
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
            },
        };

        let response = self
            .send(self.request(reqwest::Method::POST, "/api/generate").json(&body))
            .await?;
        let body: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        let mut generated = GenerateResponse::new(body.response, body.model, request.format);
        generated.usage = TokenUsage {
            prompt_tokens: body.prompt_eval_count,
            completion_tokens: body.eval_count,
        };
        generated.duration = Duration::from_nanos(body.total_duration);
        Ok(generated)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Factory for [`OllamaBackend`].
pub struct OllamaBackendFactory;

impl BackendFactory for OllamaBackendFactory {
    fn backend_type(&self) -> &'static str {
        "ollama"
    }

    fn create(&self, config: &BackendConfig) -> Result<Arc<dyn InferenceBackend>, BackendError> {
        Ok(Arc::new(OllamaBackend::from_config(config)?))
    }

    fn description(&self) -> &'static str {
        "Ollama-compatible local inference server"
    }
}
