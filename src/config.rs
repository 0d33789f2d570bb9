// ABOUTME: Environment-driven configuration for the food data client, vision extractor, and scan limits
// ABOUTME: Typed structs with defaults; missing required keys surface as ConfigError
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

use std::env;

use crate::errors::ConfigError;

/// Environment variable holding the food data service API key
const USDA_API_KEY_ENV: &str = "USDA_API_KEY";

/// Environment variable overriding the food data service base URL
const USDA_BASE_URL_ENV: &str = "USDA_BASE_URL";

/// Environment variable overriding the per-request timeout in seconds
const USDA_TIMEOUT_SECS_ENV: &str = "USDA_TIMEOUT_SECS";

/// Environment variable overriding the cache TTL in seconds
const USDA_CACHE_TTL_SECS_ENV: &str = "USDA_CACHE_TTL_SECS";

/// Environment variable holding the vision service API key
const VISION_API_KEY_ENV: &str = "VISION_API_KEY";

/// Environment variable overriding the vision endpoint base URL
const VISION_BASE_URL_ENV: &str = "VISION_BASE_URL";

/// Environment variable overriding the vision model name
const VISION_MODEL_ENV: &str = "VISION_MODEL";

/// Default base URL for USDA FoodData Central
pub const DEFAULT_USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// Default request timeout: this is a user-facing interactive path
pub const DEFAULT_USDA_TIMEOUT_SECS: u64 = 3;

/// Default cache TTL: nutrition data changes rarely (30 days)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Default OpenAI-compatible vision endpoint
pub const DEFAULT_VISION_BASE_URL: &str = "https://api.openai.com/v1";

/// Default vision model
pub const DEFAULT_VISION_MODEL: &str = "gpt-4-turbo";

fn parse_env_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidVar {
            key,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration for the external nutrition database client.
#[derive(Debug, Clone)]
pub struct UsdaConfig {
    /// API key (free signup with the remote service)
    pub api_key: String,
    /// Base URL for the remote API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Cache TTL for successful responses in seconds
    pub cache_ttl_secs: u64,
}

impl UsdaConfig {
    /// Build configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when the API key is absent or
    /// empty, or [`ConfigError::InvalidVar`] for unparseable overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var(USDA_API_KEY_ENV).unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar {
                key: USDA_API_KEY_ENV,
            });
        }

        Ok(Self {
            api_key,
            base_url: env::var(USDA_BASE_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_USDA_BASE_URL.to_owned()),
            timeout_secs: parse_env_u64(USDA_TIMEOUT_SECS_ENV, DEFAULT_USDA_TIMEOUT_SECS)?,
            cache_ttl_secs: parse_env_u64(USDA_CACHE_TTL_SECS_ENV, DEFAULT_CACHE_TTL_SECS)?,
        })
    }

    /// Configuration with an explicit key and base URL, defaults elsewhere.
    #[must_use]
    pub fn with_key_and_base(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout_secs: DEFAULT_USDA_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Configuration for the vision collaborator.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// API key for the OpenAI-compatible endpoint
    pub api_key: String,
    /// Base URL of the endpoint
    pub base_url: String,
    /// Model used for ingredient extraction
    pub model: String,
}

impl VisionConfig {
    /// Build configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when the API key is absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var(VISION_API_KEY_ENV).unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar {
                key: VISION_API_KEY_ENV,
            });
        }

        Ok(Self {
            api_key,
            base_url: env::var(VISION_BASE_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_VISION_BASE_URL.to_owned()),
            model: env::var(VISION_MODEL_ENV).unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_owned()),
        })
    }
}

/// Limits applied to the scan ingestion workflow.
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    /// Maximum scans per user per window
    pub max_scans: u32,
    /// Sliding window length in minutes
    pub window_minutes: i64,
    /// Ceiling on uploaded image size in bytes
    pub max_image_bytes: usize,
    /// Days of scan-attempt history retained by the purge sweep
    pub retention_days: i64,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_scans: 5,
            window_minutes: 5,
            max_image_bytes: 5 * 1024 * 1024,
            retention_days: 7,
        }
    }
}
