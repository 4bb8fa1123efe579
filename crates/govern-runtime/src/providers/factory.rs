//! Factory pattern for registering inference backends by name.
//!
//! Backends register a factory under a type name; the runtime creates the
//! configured backend from [`BackendConfig::kind`] without a closed enum.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = BackendRegistry::with_defaults();
//! let backend = registry.create(&config.backend)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{BackendError, InferenceBackend};
use crate::config::BackendConfig;

/// Creates backends of one type from configuration.
pub trait BackendFactory: Send + Sync {
    /// Unique identifier for this backend type (e.g., "ollama").
    fn backend_type(&self) -> &'static str;

    fn create(&self, config: &BackendConfig) -> Result<Arc<dyn InferenceBackend>, BackendError>;

    /// Validate configuration without creating a backend.
    fn validate_config(&self, config: &BackendConfig) -> Result<(), BackendError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(BackendError::NotConfigured(
                "base_url must start with http:// or https://".to_string(),
            ));
        }
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Inference backend"
    }
}

/// Registry of available backend factories.
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, Arc<dyn BackendFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any with the same type name.
    pub fn register(&mut self, factory: Arc<dyn BackendFactory>) {
        self.factories
            .insert(factory.backend_type().to_string(), factory);
    }

    /// Create the backend named by `config.kind`.
    pub fn create(&self, config: &BackendConfig) -> Result<Arc<dyn InferenceBackend>, BackendError> {
        let factory = self.factories.get(&config.kind).ok_or_else(|| {
            BackendError::NotConfigured(format!(
                "Unknown backend type: '{}'. Available: {:?}",
                config.kind,
                self.available_types()
            ))
        })?;
        factory.validate_config(config)?;
        factory.create(config)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_backend(&self, backend_type: &str) -> bool {
        self.factories.contains_key(backend_type)
    }

    /// Registry with all built-in backends registered.
    #[cfg(feature = "ollama")]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::OllamaBackendFactory));
        registry
    }

    /// Registry with all built-in backends registered.
    #[cfg(not(feature = "ollama"))]
    pub fn with_defaults() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.available_types())
            .finish()
    }
}
