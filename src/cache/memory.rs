// ABOUTME: In-memory cache backend with LRU eviction and lazy TTL expiry
// ABOUTME: Expired entries are dropped on access; eviction is handled by the LRU policy
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{CacheConfig, CacheKey, CacheProvider};

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Bounded in-memory cache.
///
/// `LruCache` gives O(1) eviction of the least-recently-used entry when the
/// store is full; expiry is checked lazily on read, so an expired entry
/// costs nothing until touched.
#[derive(Clone)]
pub struct InMemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
}

impl InMemoryCache {
    /// Fallback capacity when the configured capacity is zero.
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a cache with the given configuration.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Number of live (possibly expired) entries, for tests and monitoring.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[async_trait::async_trait]
impl CacheProvider for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut store = self.store.write().await;
        match store.get(key.as_str()) {
            Some(entry) if entry.is_expired() => {
                store.pop(key.as_str());
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    async fn set(&self, key: &CacheKey, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            data: value,
            expires_at: Instant::now() + ttl,
        };
        self.store.write().await.push(key.as_str().to_owned(), entry);
    }

    async fn invalidate(&self, key: &CacheKey) {
        self.store.write().await.pop(key.as_str());
    }

    async fn clear_all(&self) {
        self.store.write().await.clear();
    }
}
