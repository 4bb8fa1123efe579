//! Response cache for backend calls.
//!
//! Identical generation requests (same prompt, system prompt, model,
//! temperature and format) are answered from memory. The cache is bounded
//! by entry count and time-to-live.

use moka::future::Cache;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::providers::{GenerateRequest, GenerateResponse, ResponseFormat};

/// Everything that determines a response. Lookups compare the full tuple,
/// so two requests only share an entry when they are identical.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    model: String,
    system: Option<String>,
    prompt: String,
    // f32 is not Eq; its bit pattern is
    temperature_bits: u32,
    format: ResponseFormat,
}

impl CacheKey {
    pub fn new(request: &GenerateRequest) -> Self {
        Self {
            model: request.model.clone(),
            system: request.system.clone(),
            prompt: request.prompt.clone(),
            temperature_bits: request.temperature.to_bits(),
            format: request.format,
        }
    }
}

/// Bounded response cache using moka.
pub struct ResponseCache {
    cache: Cache<CacheKey, GenerateResponse>,
}

impl ResponseCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.ttl)
    }

    pub async fn get(&self, key: &CacheKey) -> Option<GenerateResponse> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, response: GenerateResponse) {
        self.cache.insert(key, response).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
