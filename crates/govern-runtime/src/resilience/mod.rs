//! Resilience patterns for govern-runtime.
//!
//! Retry with backoff lives in the adapter; this module holds the circuit
//! breaker that turns repeated exhaustion into unavailability.

mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
