// ABOUTME: USDA FoodData Central client with cache-first reads and a typed error taxonomy
// ABOUTME: Validates response shape at the top level; tolerates malformed entries inside a valid list
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # External Food Client
//!
//! Two operations against the remote nutrition database: food search and
//! detail retrieval. Both consult the cache layer first when one is
//! attached; a cache hit short-circuits all network and error-handling
//! logic. Only successful responses are ever cached.
//!
//! Failure classes map to distinct [`UsdaApiError`] variants so callers can
//! branch on kind: 403 means the key is bad, 429 means the remote is
//! throttling us (distinct from the local scan limiter), 5xx is a remote
//! fault, timeouts and connection failures are transport errors, and a
//! parsed-but-malformed body is a validation error because it means the
//! integration contract broke.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::cache::{CacheKey, CacheProvider};
use crate::config::UsdaConfig;
use crate::errors::{ConfigError, UsdaApiError};

/// One lenient-parsed entry from a search response.
///
/// The raw payload is kept alongside the parsed fields so downstream code
/// can normalize the entry itself when no detail fetch is possible.
#[derive(Debug, Clone)]
pub struct FoodSummary {
    /// Remote identifier, absent on malformed entries
    pub fdc_id: Option<u64>,
    /// Food description
    pub description: String,
    /// Data-type tag (e.g. "SR Legacy", "Branded")
    pub data_type: String,
    /// Brand owner when reported
    pub brand_owner: Option<String>,
    /// The raw entry as returned by the remote
    pub raw: Value,
}

/// Seam over the remote nutrition database.
#[async_trait::async_trait]
pub trait FoodDataClient: Send + Sync {
    /// Search foods by free-text query. An empty result is a valid
    /// response, never an error.
    async fn search_foods(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Vec<FoodSummary>, UsdaApiError>;

    /// Fetch the raw detail payload for one food id.
    async fn get_food_details(&self, fdc_id: u64) -> Result<Value, UsdaApiError>;
}

/// HTTP client for USDA FoodData Central.
pub struct UsdaClient {
    config: UsdaConfig,
    http: reqwest::Client,
    cache: Option<Arc<dyn CacheProvider>>,
}

impl UsdaClient {
    /// Create a client without a cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when the API key is empty; the
    /// scan workflow maps this to its configuration-error outcome.
    pub fn new(config: UsdaConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Create a client that consults `cache` before any network I/O.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when the API key is empty.
    pub fn with_cache(
        config: UsdaConfig,
        cache: Arc<dyn CacheProvider>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Some(cache))
    }

    fn build(config: UsdaConfig, cache: Option<Arc<dyn CacheProvider>>) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar {
                key: "USDA_API_KEY",
            });
        }

        let http = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            config,
            http,
            cache,
        })
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_secs)
    }

    async fn cached(&self, key: &CacheKey) -> Option<Value> {
        match &self.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn store(&self, key: &CacheKey, value: Value) {
        if let Some(cache) = &self.cache {
            cache.set(key, value, self.cache_ttl()).await;
        }
    }

    async fn fetch_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, UsdaApiError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| UsdaApiError::Transport {
                reason: if e.is_timeout() {
                    "request timed out".to_owned()
                } else if e.is_connect() {
                    "connection failed".to_owned()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(UsdaApiError::InvalidApiKey);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(UsdaApiError::NotFound { fdc_id: None });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(UsdaApiError::RateLimited);
        }
        if !status.is_success() {
            return Err(UsdaApiError::Server {
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UsdaApiError::Validation {
                reason: format!("invalid JSON body: {e}"),
            })
    }

    fn parse_search_entries(body: &Value) -> Result<Vec<FoodSummary>, UsdaApiError> {
        let foods = body
            .get("foods")
            .ok_or_else(|| UsdaApiError::Validation {
                reason: "response missing 'foods' field".to_owned(),
            })?
            .as_array()
            .ok_or_else(|| UsdaApiError::Validation {
                reason: "'foods' field should be a list".to_owned(),
            })?;

        let mut summaries = Vec::with_capacity(foods.len());
        for entry in foods {
            // Structural violations are fatal at the top level only;
            // individual malformed entries are tolerated.
            let Some(obj) = entry.as_object() else {
                warn!("skipping malformed food entry in search results");
                continue;
            };
            summaries.push(FoodSummary {
                fdc_id: obj.get("fdcId").and_then(Value::as_u64),
                description: obj
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                data_type: obj
                    .get("dataType")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                brand_owner: obj
                    .get("brandOwner")
                    .and_then(Value::as_str)
                    .filter(|b| !b.trim().is_empty())
                    .map(str::to_owned),
                raw: entry.clone(),
            });
        }
        Ok(summaries)
    }
}

#[async_trait::async_trait]
impl FoodDataClient for UsdaClient {
    #[instrument(skip(self), fields(api_call = "search_foods"))]
    async fn search_foods(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Vec<FoodSummary>, UsdaApiError> {
        let page_size = page_size.clamp(1, 200);
        let key = CacheKey::search(query, page_size);

        if let Some(cached) = self.cached(&key).await {
            debug!(%key, "search served from cache");
            return Self::parse_search_entries(&serde_json::json!({ "foods": cached }));
        }

        let url = format!("{}/foods/search", self.config.base_url);
        let page_size_str = page_size.to_string();
        let body = self
            .fetch_json(
                &url,
                &[
                    ("query", query),
                    ("pageSize", &page_size_str),
                    ("api_key", &self.config.api_key),
                ],
            )
            .await?;

        let summaries = Self::parse_search_entries(&body)?;

        // Only validated successful responses are cached.
        if let Some(foods) = body.get("foods") {
            self.store(&key, foods.clone()).await;
        }

        Ok(summaries)
    }

    #[instrument(skip(self), fields(api_call = "get_food_details"))]
    async fn get_food_details(&self, fdc_id: u64) -> Result<Value, UsdaApiError> {
        let key = CacheKey::food_details(fdc_id);

        if let Some(cached) = self.cached(&key).await {
            debug!(%key, "details served from cache");
            return Ok(cached);
        }

        let url = format!("{}/food/{fdc_id}", self.config.base_url);
        let body = self
            .fetch_json(&url, &[("api_key", &self.config.api_key)])
            .await
            .map_err(|e| match e {
                UsdaApiError::NotFound { .. } => UsdaApiError::NotFound {
                    fdc_id: Some(fdc_id),
                },
                other => other,
            })?;

        let missing: Vec<&str> = ["description", "dataType", "fdcId"]
            .into_iter()
            .filter(|field| body.get(field).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(UsdaApiError::Validation {
                reason: format!("food details missing required fields: {}", missing.join(", ")),
            });
        }

        self.store(&key, body.clone()).await;
        Ok(body)
    }
}
