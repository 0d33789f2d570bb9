// ABOUTME: Cache abstraction in front of the external food data client
// ABOUTME: Keys are deterministic digests of normalized query parameters; values carry a TTL
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Cache Layer
//!
//! A key-value collaborator consulted by the food data client before any
//! network I/O. Keys are SHA-256 digests over the normalized parameter set,
//! so the same logical query always maps to the same entry; writes are
//! idempotent and races on population are harmless. The backend is
//! pluggable behind [`CacheProvider`]; the crate ships an in-memory LRU
//! implementation in [`memory`].

/// In-memory cache implementation
pub mod memory;

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Cache provider trait for pluggable backend implementations.
///
/// Absence of a key is not an error; `get` simply returns `None`. Backends
/// must be safe for concurrent reads.
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync {
    /// Retrieve a cached value, honouring expiry.
    async fn get(&self, key: &CacheKey) -> Option<Value>;

    /// Store a value under `key` for `ttl`.
    async fn set(&self, key: &CacheKey, value: Value, ttl: Duration);

    /// Drop a single entry.
    async fn invalidate(&self, key: &CacheKey);

    /// Drop every entry (tests and admin tooling).
    async fn clear_all(&self);
}

/// Cache configuration.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum number of entries held by bounded backends
    pub max_entries: usize,
    /// TTL applied when callers do not specify one
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: Duration::from_secs(crate::config::DEFAULT_CACHE_TTL_SECS),
        }
    }
}

/// Deterministic cache key derived from normalized request parameters.
///
/// The digest keeps keys opaque and fixed-length regardless of query
/// content, and normalization (trim + case-fold) makes logically equal
/// queries collide on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    fn digest(input: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Key for a food search request.
    #[must_use]
    pub fn search(query: &str, page_size: u32) -> Self {
        let normalized = query.trim().to_lowercase();
        Self::digest(&format!("search:{normalized}:{page_size}"))
    }

    /// Key for a food details request.
    #[must_use]
    pub fn food_details(fdc_id: u64) -> Self {
        Self::digest(&format!("food:{fdc_id}"))
    }

    /// The underlying digest string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
