// ABOUTME: Error taxonomies for the external food API, vision collaborator, and configuration
// ABOUTME: Each boundary gets its own inspectable thiserror enum so callers branch on kind
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Error Taxonomies
//!
//! Every external boundary owns a distinct error enum. Callers are expected
//! to branch on the variant, never on message text: the interactive search
//! path treats most kinds as fatal, while batch ingestion downgrades them to
//! per-item skips (see the `scan` module).

use thiserror::Error;

/// Errors surfaced by the external nutrition database client.
///
/// Each variant corresponds to one remote failure class. `NotFound` is an
/// error only for detail fetches; an empty search result is a valid
/// response, not an error.
#[derive(Debug, Error)]
pub enum UsdaApiError {
    /// Remote rejected the credentials (HTTP 403).
    #[error("invalid API key for the food data service")]
    InvalidApiKey,

    /// The requested identifier does not exist remotely (HTTP 404).
    #[error("food {fdc_id:?} not found in the remote database")]
    NotFound {
        /// Identifier that was looked up, when known
        fdc_id: Option<u64>,
    },

    /// Remote signalled throttling (HTTP 429).
    #[error("food data service rate limit exceeded, retry later")]
    RateLimited,

    /// Any remote-side failure (5xx-class or other unexpected status).
    #[error("food data service returned server error (HTTP {status})")]
    Server {
        /// HTTP status code returned by the remote
        status: u16,
    },

    /// Timeout or connection failure talking to the remote.
    #[error("transport failure talking to the food data service: {reason}")]
    Transport {
        /// Short human-readable cause (timeout, connect, ...)
        reason: String,
    },

    /// The response parsed but violates the expected shape.
    #[error("food data service response failed validation: {reason}")]
    Validation {
        /// What part of the contract was broken
        reason: String,
    },
}

impl UsdaApiError {
    /// Whether this failure indicates the integration contract broke
    /// rather than a transient or business condition.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Errors surfaced by the vision collaborator.
///
/// Malformed *content* (non-array output) is not an error: it degrades to
/// zero detections inside the extractor. Only configuration and call-level
/// failures surface here.
#[derive(Debug, Error)]
pub enum VisionError {
    /// The extractor is missing required credentials.
    #[error("vision service credentials are not configured")]
    Configuration,

    /// Timeout or connection failure talking to the vision endpoint.
    #[error("transport failure talking to the vision service: {reason}")]
    Transport {
        /// Short human-readable cause
        reason: String,
    },

    /// The vision endpoint returned a non-success status.
    #[error("vision service returned HTTP {status}")]
    Api {
        /// HTTP status code returned by the endpoint
        status: u16,
    },
}

/// Configuration errors raised while reading the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    #[error("missing required configuration: {key}")]
    MissingVar {
        /// Name of the environment variable
        key: &'static str,
    },

    /// A variable was present but could not be parsed.
    #[error("invalid value for {key}: {reason}")]
    InvalidVar {
        /// Name of the environment variable
        key: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}
