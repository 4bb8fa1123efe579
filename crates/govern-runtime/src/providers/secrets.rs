//! Secure handling of backend API tokens.
//!
//! Tokens are wrapped in [`SecretString`] as soon as they are read, never
//! appear in `Debug` or `Display` output, and are exposed only when an HTTP
//! header is built.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::BackendError;

/// Where a token was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Programmatic,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Environment => write!(f, "environment"),
            TokenSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A bearer token for an inference backend.
pub struct ApiToken {
    value: SecretString,
    source: TokenSource,
}

impl ApiToken {
    pub fn new(value: impl Into<String>, source: TokenSource) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
        }
    }

    /// Load a token from an environment variable.
    pub fn from_env(env_var: &str) -> Result<Self, BackendError> {
        match std::env::var(env_var) {
            Ok(value) if !value.trim().is_empty() => Ok(Self::new(value, TokenSource::Environment)),
            _ => Err(BackendError::NotConfigured(format!(
                "API token not set: configure the '{}' environment variable",
                env_var
            ))),
        }
    }

    /// Load a token when an environment variable is configured.
    pub fn from_optional_env(env_var: Option<&str>) -> Result<Option<Self>, BackendError> {
        env_var.map(Self::from_env).transpose()
    }

    /// Expose the token at the point of use. Never store the result.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> TokenSource {
        self.source
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiToken")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API token from {} [REDACTED]", self.source)
    }
}
