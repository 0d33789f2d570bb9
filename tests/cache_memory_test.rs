// ABOUTME: Tests for the in-memory cache backend: round trips, TTL expiry, LRU eviction
// ABOUTME: Uses short TTLs so expiry is observable without slowing the suite
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

use std::time::Duration;

use serde_json::json;

use mealguard::cache::memory::InMemoryCache;
use mealguard::cache::{CacheConfig, CacheKey, CacheProvider};

fn small_cache(max_entries: usize) -> InMemoryCache {
    InMemoryCache::new(CacheConfig {
        max_entries,
        default_ttl: Duration::from_secs(60),
    })
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let cache = small_cache(10);
    let key = CacheKey::search("cheddar cheese", 10);
    let value = json!([{ "description": "Cheddar Cheese" }]);

    cache.set(&key, value.clone(), Duration::from_secs(60)).await;
    assert_eq!(cache.get(&key).await, Some(value));
}

#[tokio::test]
async fn absent_key_is_none_not_error() {
    let cache = small_cache(10);
    assert!(cache.get(&CacheKey::food_details(42)).await.is_none());
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let cache = small_cache(10);
    let key = CacheKey::food_details(7);

    cache
        .set(&key, json!({ "fdcId": 7 }), Duration::from_millis(50))
        .await;
    assert!(cache.get(&key).await.is_some());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(cache.get(&key).await.is_none());
    // The expired entry was dropped on access.
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn capacity_is_bounded_by_lru_eviction() {
    let cache = small_cache(2);
    for fdc_id in 0..3u64 {
        cache
            .set(
                &CacheKey::food_details(fdc_id),
                json!(fdc_id),
                Duration::from_secs(60),
            )
            .await;
    }
    assert_eq!(cache.len().await, 2);
    // The oldest entry was evicted.
    assert!(cache.get(&CacheKey::food_details(0)).await.is_none());
    assert!(cache.get(&CacheKey::food_details(2)).await.is_some());
}

#[tokio::test]
async fn population_is_idempotent() {
    // Same key, same value: a racing double-write is harmless.
    let cache = small_cache(10);
    let key = CacheKey::search("banana", 5);
    let value = json!([{ "description": "Banana" }]);

    cache.set(&key, value.clone(), Duration::from_secs(60)).await;
    cache.set(&key, value.clone(), Duration::from_secs(60)).await;
    assert_eq!(cache.get(&key).await, Some(value));
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn invalidate_and_clear_remove_entries() {
    let cache = small_cache(10);
    let key_a = CacheKey::search("a", 1);
    let key_b = CacheKey::search("b", 1);

    cache.set(&key_a, json!(1), Duration::from_secs(60)).await;
    cache.set(&key_b, json!(2), Duration::from_secs(60)).await;

    cache.invalidate(&key_a).await;
    assert!(cache.get(&key_a).await.is_none());
    assert!(cache.get(&key_b).await.is_some());

    cache.clear_all().await;
    assert!(cache.is_empty().await);
}
