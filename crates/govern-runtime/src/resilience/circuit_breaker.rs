//! Circuit breaker for inference backend calls.
//!
//! When calls for a model keep failing after retries, the circuit opens and
//! the semantic engine reports itself unavailable until the recovery
//! timeout passes.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::duration_str;

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Exhausted calls before opening the circuit
    pub failure_threshold: u32,

    /// Time before attempting recovery
    #[serde(with = "duration_str")]
    pub recovery_timeout: Duration,

    /// Successes needed to close the circuit again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Calls are refused
    Open { opened_at: Instant },

    /// Probing whether the backend recovered
    HalfOpen { successes: u32 },
}

/// Circuit breaker keyed by model name, so one broken model does not
/// disable another served by the same backend.
pub struct CircuitBreaker {
    states: RwLock<HashMap<String, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Check if calls for a model should be refused.
    pub fn is_open(&self, model: &str) -> bool {
        let states = self.states.read();
        match states.get(model) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(model);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    pub fn record_success(&self, model: &str) {
        let mut states = self.states.write();
        match states.get(model).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(model.to_string(), CircuitState::Closed { failures: 0 });
                    tracing::info!(model, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        model.to_string(),
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { failures }) if failures > 0 => {
                states.insert(model.to_string(), CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    pub fn record_failure(&self, model: &str) {
        let mut states = self.states.write();
        let failures = match states.get(model) {
            None => 0,
            Some(CircuitState::Closed { failures }) => *failures,
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    model.to_string(),
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(model, "Circuit reopened after failed recovery attempt");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures + 1 >= self.config.failure_threshold {
            states.insert(
                model.to_string(),
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(
                model,
                failures = failures + 1,
                "Circuit opened after repeated failures"
            );
        } else {
            states.insert(
                model.to_string(),
                CircuitState::Closed {
                    failures: failures + 1,
                },
            );
        }
    }

    fn transition_to_half_open(&self, model: &str) {
        let mut states = self.states.write();
        if matches!(states.get(model), Some(CircuitState::Open { .. })) {
            states.insert(model.to_string(), CircuitState::HalfOpen { successes: 0 });
            tracing::info!(model, "Circuit half-open, probing backend");
        }
    }

    pub fn state(&self, model: &str) -> CircuitState {
        self.states
            .read()
            .get(model)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Reset all circuits to closed.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
