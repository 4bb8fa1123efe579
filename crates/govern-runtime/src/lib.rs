//! # govern-runtime
//!
//! Semantic assessment and strategy orchestration for Govern.
//!
//! `govern-core` decides everything that can be decided without a model.
//! This crate adds the parts that need one:
//! - An inference backend abstraction with an Ollama-compatible HTTP backend
//! - An adapter that caches, retries and trips a circuit breaker
//! - The semantic engine that turns model output into violations
//! - The orchestrator that picks a strategy and merges both engines
//!
//! ## Degradation
//!
//! The semantic side is optional at run time. An unreachable backend, a
//! missing model, or an open circuit forces the FAST strategy; validation
//! still returns a rule-based result.
//!
//! ## Example
//!
//! ```rust,ignore
//! use govern_core::{Contract, RuleCatalog, SemanticCatalog, Strategy};
//! use govern_runtime::{BackendRegistry, RuntimeConfig, ValidationOrchestrator};
//! use std::sync::Arc;
//!
//! let config = RuntimeConfig::from_file("govern.yaml")?;
//! let orchestrator = ValidationOrchestrator::from_config(
//!     &config,
//!     &BackendRegistry::with_defaults(),
//!     Arc::new(RuleCatalog::builtin()?),
//!     Arc::new(SemanticCatalog::builtin()?),
//! )?;
//!
//! let contract = Contract::from_file("customers.yaml")?;
//! let result = orchestrator.validate(&contract, Strategy::Adaptive).await;
//! ```

pub mod adapter;
pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod providers;
pub mod resilience;
pub mod semantic;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use adapter::{AdapterError, InferenceAdapter};
pub use cache::{CacheKey, ResponseCache};
pub use config::{
    BackendConfig, BackoffKind, CacheConfig, ConfigError, RetryConfig, RuntimeConfig,
    SemanticConfig,
};
pub use orchestrator::{RuntimeError, ValidationOrchestrator};
pub use providers::{
    ApiToken, BackendError, BackendFactory, BackendRegistry, GenerateRequest, GenerateResponse,
    InferenceBackend, ResponseFormat, TokenSource, TokenUsage,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use semantic::{ParseError, PromptContext, SemanticEngine, SemanticFinding};

#[cfg(feature = "ollama")]
pub use providers::{OllamaBackend, OllamaBackendFactory};
