//! In-memory backends for tests.
//!
//! [`ScriptedBackend`] answers from a closure instead of the network and
//! counts generate calls, so adapter and orchestration behavior can be
//! exercised without an inference server.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::providers::{BackendError, GenerateRequest, GenerateResponse, InferenceBackend};

type Responder = Box<dyn Fn(&GenerateRequest) -> Result<String, BackendError> + Send + Sync>;

/// Backend whose responses come from a closure.
pub struct ScriptedBackend {
    responder: Responder,
    reachable: bool,
    models: Vec<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Answer every request with `f(request)`.
    pub fn with_responder<F>(f: F) -> Self
    where
        F: Fn(&GenerateRequest) -> Result<String, BackendError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(f),
            reachable: true,
            models: vec!["llama3.1:latest".to_string()],
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same text.
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::with_responder(move |_| Ok(text.clone()))
    }

    /// Fail every request with the same error.
    pub fn failing(error: BackendError) -> Self {
        Self::with_responder(move |_| Err(error.clone()))
    }

    /// Fails `ping` and every call with a connection error.
    pub fn unreachable() -> Self {
        let mut backend =
            Self::failing(BackendError::Connection("connection refused".to_string()));
        backend.reachable = false;
        backend
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Sleep before answering each generate call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of generate calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn ping(&self) -> bool {
        self.reachable
    }

    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        if !self.reachable {
            return Err(BackendError::Connection("connection refused".to_string()));
        }
        Ok(self.models.clone())
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let text = (self.responder)(request)?;
        Ok(GenerateResponse::new(text, &request.model, request.format))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
