//! Runtime configuration.
//!
//! Loaded from YAML; every field has a default so an empty file is a valid
//! configuration. Durations are human-readable strings ("30s", "1h").

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::resilience::CircuitBreakerConfig;

/// Errors loading runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Serde adapter for `Duration` as a humantime string.
pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Inference backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Registered backend type (e.g., "ollama")
    pub kind: String,

    pub base_url: String,
    pub model: String,

    /// Sampling temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Per-call timeout
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    /// Environment variable holding a bearer token, if the backend needs one
    pub api_token_env: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            temperature: 0.1,
            timeout: Duration::from_secs(30),
            api_token_env: None,
        }
    }
}

/// Delay schedule between retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Retry settings for backend calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first call
    pub max_attempts: u32,

    pub backoff: BackoffKind,

    /// Fixed delay, or the first delay for exponential backoff
    #[serde(with = "duration_str")]
    pub delay: Duration,

    /// Upper bound for exponential backoff
    #[serde(with = "duration_str")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffKind::Fixed,
            delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Response cache bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,

    #[serde(with = "duration_str")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Semantic assessment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub enabled: bool,

    /// Minimum confidence (0-100) for subjective findings
    pub confidence_threshold: f64,

    /// Concurrent backend calls within one contract's batch
    pub max_concurrent_calls: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 70.0,
            max_concurrent_calls: 4,
        }
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub backend: BackendConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub semantic: SemanticConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Reject values that would make the runtime misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.semantic.max_concurrent_calls == 0 {
            return Err(ConfigError::Invalid(
                "semantic.max_concurrent_calls must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.semantic.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "semantic.confidence_threshold {} is outside 0-100",
                self.semantic.confidence_threshold
            )));
        }
        if self.backend.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "backend.timeout must be greater than zero".to_string(),
            ));
        }
        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(
                "backend.base_url must start with http:// or https://".to_string(),
            ));
        }
        Ok(())
    }
}
