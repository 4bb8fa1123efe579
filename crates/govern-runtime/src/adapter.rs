//! Inference Backend Adapter.
//!
//! Wraps an [`InferenceBackend`] with the policies every semantic call
//! needs:
//! - Response caching keyed by the full request
//! - A timeout on every call
//! - Bounded retry with fixed or exponential backoff
//! - A circuit breaker that turns repeated exhaustion into unavailability

use backon::{BackoffBuilder, ConstantBuilder, ExponentialBuilder, Retryable};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{CacheKey, ResponseCache};
use crate::config::{BackoffKind, RetryConfig, RuntimeConfig};
use crate::providers::{
    BackendError, GenerateRequest, GenerateResponse, InferenceBackend, ResponseFormat,
};
use crate::resilience::CircuitBreaker;

/// Errors surfaced by the adapter after its own retry handling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("Backend timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("Backend request failed after {attempts} attempt(s): {message}")]
    Connection { attempts: u32, message: String },

    /// A non-retryable failure, surfaced on the first attempt
    #[error("Backend rejected request: {0}")]
    Request(BackendError),

    #[error("Circuit open for model '{0}'")]
    CircuitOpen(String),
}

impl AdapterError {
    /// Whether the backend itself is failing, as opposed to rejecting this
    /// particular request.
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            AdapterError::Timeout { .. }
                | AdapterError::Connection { .. }
                | AdapterError::CircuitOpen(_)
        )
    }
}

/// Resilient, caching front for one backend and model.
pub struct InferenceAdapter {
    backend: Arc<dyn InferenceBackend>,
    model: String,
    temperature: f32,
    timeout: Duration,
    retry: RetryConfig,
    cache: ResponseCache,
    circuit_breaker: CircuitBreaker,
}

impl std::fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceAdapter")
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl InferenceAdapter {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: &RuntimeConfig) -> Self {
        Self {
            backend,
            model: config.backend.model.clone(),
            temperature: config.backend.temperature,
            timeout: config.backend.timeout,
            retry: config.retry.clone(),
            cache: ResponseCache::from_config(&config.cache),
            circuit_breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Reachable, not tripped, and serving the configured model.
    pub async fn is_available(&self) -> bool {
        if self.circuit_breaker.is_open(&self.model) {
            tracing::debug!(model = %self.model, "Backend unavailable: circuit open");
            return false;
        }

        let reachable = tokio::time::timeout(self.timeout, self.backend.ping())
            .await
            .unwrap_or(false);
        if !reachable {
            tracing::debug!(backend = self.backend.name(), "Backend unavailable: unreachable");
            return false;
        }

        match self.list_models().await {
            Ok(models) => {
                let loaded = models.iter().any(|m| model_matches(m, &self.model));
                if !loaded {
                    tracing::debug!(model = %self.model, "Backend unavailable: model not loaded");
                }
                loaded
            }
            Err(e) => {
                tracing::debug!(error = %e, "Backend unavailable: model listing failed");
                false
            }
        }
    }

    /// Models the backend has loaded. Single attempt, bounded by the timeout.
    pub async fn list_models(&self) -> Result<Vec<String>, AdapterError> {
        match tokio::time::timeout(self.timeout, self.backend.list_models()).await {
            Ok(Ok(models)) => Ok(models),
            Ok(Err(e)) if e.is_retryable() => Err(exhausted(e, 1)),
            Ok(Err(e)) => Err(AdapterError::Request(e)),
            Err(_) => Err(AdapterError::Timeout { attempts: 1 }),
        }
    }

    /// Generate with the configured model, consulting the cache first.
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        format: ResponseFormat,
    ) -> Result<GenerateResponse, AdapterError> {
        let mut request = GenerateRequest::new(&self.model, prompt).with_temperature(self.temperature);
        request.system = system.map(str::to_string);
        request.format = format;

        let key = CacheKey::new(&request);
        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!(model = %self.model, "Response cache hit");
            return Ok(hit);
        }

        if self.circuit_breaker.is_open(&self.model) {
            return Err(AdapterError::CircuitOpen(self.model.clone()));
        }

        match self.generate_with_retry(&request).await {
            Ok(response) => {
                self.circuit_breaker.record_success(&self.model);
                self.cache.insert(key, response.clone()).await;
                Ok(response)
            }
            Err(e) => {
                if e.is_exhausted() {
                    self.circuit_breaker.record_failure(&self.model);
                }
                Err(e)
            }
        }
    }

    async fn generate_with_retry(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, AdapterError> {
        let retries = self.retry.max_attempts.saturating_sub(1) as usize;
        let attempts = AtomicU32::new(0);

        let result = match self.retry.backoff {
            BackoffKind::Fixed => {
                let backoff = ConstantBuilder::default()
                    .with_delay(self.retry.delay)
                    .with_max_times(retries);
                self.call_with_backoff(backoff, request, &attempts).await
            }
            BackoffKind::Exponential => {
                let backoff = ExponentialBuilder::default()
                    .with_min_delay(self.retry.delay)
                    .with_max_delay(self.retry.max_delay)
                    .with_max_times(retries);
                self.call_with_backoff(backoff, request, &attempts).await
            }
        };

        let attempts = attempts.into_inner();
        result.map_err(|e| {
            if e.is_retryable() {
                tracing::warn!(model = %self.model, attempts, error = %e, "Backend retries exhausted");
                exhausted(e, attempts)
            } else {
                AdapterError::Request(e)
            }
        })
    }

    async fn call_with_backoff<B: BackoffBuilder>(
        &self,
        backoff: B,
        request: &GenerateRequest,
        attempts: &AtomicU32,
    ) -> Result<GenerateResponse, BackendError> {
        (|| async move {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(attempt, model = %request.model, "Calling backend");
            self.call_once(request).await
        })
        .retry(backoff)
        .when(BackendError::is_retryable)
        .notify(|err: &BackendError, delay: Duration| {
            tracing::warn!(
                model = %self.model,
                error = %err,
                delay = ?delay,
                "Backend call failed, retrying"
            );
        })
        .await
    }

    async fn call_once(&self, request: &GenerateRequest) -> Result<GenerateResponse, BackendError> {
        match tokio::time::timeout(self.timeout, self.backend.generate(request)).await {
            Ok(Err(BackendError::Timeout(_))) | Err(_) => Err(BackendError::Timeout(self.timeout)),
            Ok(result) => result,
        }
    }
}

fn exhausted(error: BackendError, attempts: u32) -> AdapterError {
    match error {
        BackendError::Timeout(_) => AdapterError::Timeout { attempts },
        other => AdapterError::Connection {
            attempts,
            message: other.to_string(),
        },
    }
}

/// "llama3.1" matches a loaded "llama3.1:latest"; a tagged name must match
/// exactly.
fn model_matches(available: &str, configured: &str) -> bool {
    if available == configured {
        return true;
    }
    !configured.contains(':') && available.split(':').next() == Some(configured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use std::sync::atomic::AtomicUsize;

    fn config(max_attempts: u32) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.retry.max_attempts = max_attempts;
        config.retry.delay = Duration::from_millis(10);
        config.backend.timeout = Duration::from_secs(5);
        config.backend.model = "llama3.1".to_string();
        config
    }

    #[test]
    fn test_model_matching() {
        assert!(model_matches("llama3.1", "llama3.1"));
        assert!(model_matches("llama3.1:latest", "llama3.1"));
        assert!(!model_matches("llama3.1:latest", "llama3.1:70b"));
        assert!(!model_matches("llama3", "llama3.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_calls_backend_once() {
        let backend = Arc::new(ScriptedBackend::replying(r#"{"violations": []}"#));
        let adapter = InferenceAdapter::new(backend.clone(), &config(3));

        let first = adapter
            .generate("Review", Some("sys"), ResponseFormat::Json)
            .await
            .unwrap();
        let second = adapter
            .generate("Review", Some("sys"), ResponseFormat::Json)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);

        adapter
            .generate("Review", None, ResponseFormat::Json)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let failures = Arc::new(AtomicUsize::new(2));
        let backend = Arc::new(ScriptedBackend::with_responder(move |_| {
            if failures.fetch_sub(1, Ordering::SeqCst) > 0 {
                Err(BackendError::Connection("refused".into()))
            } else {
                Ok("ok".to_string())
            }
        }));
        let adapter = InferenceAdapter::new(backend.clone(), &config(3));

        let response = adapter.generate("p", None, ResponseFormat::Text).await.unwrap();
        assert_eq!(response.text, "ok");
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_exhaustion_reports_attempts() {
        let backend = Arc::new(ScriptedBackend::failing(BackendError::Connection(
            "refused".into(),
        )));
        let adapter = InferenceAdapter::new(backend.clone(), &config(3));

        let err = adapter.generate("p", None, ResponseFormat::Text).await.unwrap_err();
        assert!(matches!(err, AdapterError::Connection { attempts: 3, .. }), "{:?}", err);
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_exhaustion_is_distinct() {
        let backend = Arc::new(
            ScriptedBackend::replying("late").with_delay(Duration::from_secs(60)),
        );
        let adapter = InferenceAdapter::new(backend.clone(), &config(2));

        let err = adapter.generate("p", None, ResponseFormat::Text).await.unwrap_err();
        assert_eq!(err, AdapterError::Timeout { attempts: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_surfaces_immediately() {
        let backend = Arc::new(ScriptedBackend::failing(BackendError::Api {
            status: 400,
            message: "bad request".into(),
        }));
        let adapter = InferenceAdapter::new(backend.clone(), &config(3));

        let err = adapter.generate("p", None, ResponseFormat::Text).await.unwrap_err();
        assert!(matches!(err, AdapterError::Request(_)));
        assert!(!err.is_exhausted());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_backoff_also_bounded() {
        let backend = Arc::new(ScriptedBackend::failing(BackendError::Api {
            status: 503,
            message: "overloaded".into(),
        }));
        let mut config = config(4);
        config.retry.backoff = BackoffKind::Exponential;
        let adapter = InferenceAdapter::new(backend.clone(), &config);

        let err = adapter.generate("p", None, ResponseFormat::Text).await.unwrap_err();
        assert!(matches!(err, AdapterError::Connection { attempts: 4, .. }));
        assert_eq!(backend.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_opens_and_availability_drops() {
        let backend = Arc::new(ScriptedBackend::failing(BackendError::Connection(
            "refused".into(),
        )));
        let mut config = config(1);
        config.circuit_breaker.failure_threshold = 2;
        let adapter = InferenceAdapter::new(backend.clone(), &config);

        assert!(adapter.is_available().await);
        let _ = adapter.generate("a", None, ResponseFormat::Text).await;
        let _ = adapter.generate("b", None, ResponseFormat::Text).await;

        assert!(!adapter.is_available().await);
        let err = adapter.generate("c", None, ResponseFormat::Text).await.unwrap_err();
        assert_eq!(err, AdapterError::CircuitOpen("llama3.1".to_string()));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_availability_requires_model() {
        let backend = Arc::new(ScriptedBackend::replying("{}").with_models(&["mistral:latest"]));
        let adapter = InferenceAdapter::new(backend, &config(1));
        assert!(!adapter.is_available().await);

        let unreachable = Arc::new(ScriptedBackend::unreachable());
        let adapter = InferenceAdapter::new(unreachable, &config(1));
        assert!(!adapter.is_available().await);
    }
}
