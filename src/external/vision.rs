// ABOUTME: Vision collaborator extracting ingredient names from a pantry image
// ABOUTME: Malformed model output degrades to zero detections; only call-level failures error
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Vision Collaborator
//!
//! The extractor sends the encoded image to an OpenAI-compatible
//! chat-completions endpoint and expects a JSON array of ingredient-name
//! strings back. The model is an opaque external collaborator: a response
//! that is not a list, or not valid JSON at all, is treated as zero
//! detections rather than a workflow failure, because an uninteresting
//! image is a valid outcome.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::config::VisionConfig;
use crate::errors::VisionError;

/// Request timeout for the vision endpoint; image analysis is slower than
/// the interactive food lookups but still bounded.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum completion size requested from the model.
const MAX_COMPLETION_TOKENS: u32 = 500;

const EXTRACTION_PROMPT: &str = "You are a pantry scanning assistant. \
Analyze this image of a pantry or refrigerator and list all visible food items and ingredients.\n\n\
Rules:\n\
1. Return ONLY a JSON array of ingredient names\n\
2. Include brand names if visible (e.g., \"Jif Peanut Butter\")\n\
3. Be specific (e.g., \"Chicken Breast\" not just \"Chicken\")\n\
4. Only include items you can clearly identify\n\
5. Skip condiments, spices, and tiny items\n\
6. Do not include any explanatory text, only the JSON array\n\n\
Example output format:\n\
[\"Chicken Breast\", \"Cheddar Cheese\", \"Whole Milk\", \"Banana\", \"Brown Rice\"]";

/// Seam over the external vision collaborator.
#[async_trait::async_trait]
pub trait VisionExtractor: Send + Sync {
    /// Extract ingredient names from a base64-encoded image.
    ///
    /// Returns an empty list when the image yields no usable detections.
    async fn extract_ingredients(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<Vec<String>, VisionError>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Ingredient extractor backed by an OpenAI-compatible vision model.
pub struct OpenAiVisionExtractor {
    config: VisionConfig,
    http: reqwest::Client,
}

impl OpenAiVisionExtractor {
    /// Create an extractor from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Configuration`] when the API key is empty.
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        if config.api_key.trim().is_empty() {
            return Err(VisionError::Configuration);
        }
        let http = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Ok(Self { config, http })
    }

    /// Strip ```json fences the model sometimes wraps around its output.
    fn strip_fences(content: &str) -> &str {
        let mut trimmed = content.trim();
        if let Some(rest) = trimmed.strip_prefix("```json") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix("```") {
            trimmed = rest;
        }
        if let Some(rest) = trimmed.strip_suffix("```") {
            trimmed = rest;
        }
        trimmed.trim()
    }

    /// Parse the model's reply into ingredient names, degrading to empty on
    /// anything that is not an array of strings.
    fn parse_ingredients(content: &str) -> Vec<String> {
        let cleaned = Self::strip_fences(content);
        let parsed: Value = match serde_json::from_str(cleaned) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "vision reply was not valid JSON, treating as zero detections");
                return Vec::new();
            }
        };

        let Some(items) = parsed.as_array() else {
            warn!("vision reply was not a JSON array, treating as zero detections");
            return Vec::new();
        };

        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

#[async_trait::async_trait]
impl VisionExtractor for OpenAiVisionExtractor {
    #[instrument(skip(self, image_base64))]
    async fn extract_ingredients(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<Vec<String>, VisionError> {
        let body = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": EXTRACTION_PROMPT },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{mime_type};base64,{image_base64}"),
                            "detail": "low"
                        }
                    }
                ]
            }],
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": 0.3
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VisionError::Transport {
                reason: if e.is_timeout() {
                    "request timed out".to_owned()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::Api {
                status: status.as_u16(),
            });
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(|e| VisionError::Transport {
                reason: format!("unreadable response body: {e}"),
            })?;

        let content = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or_default();

        let ingredients = Self::parse_ingredients(content);
        info!(count = ingredients.len(), "vision extraction complete");
        Ok(ingredients)
    }
}

#[cfg(test)]
mod tests {
    use super::OpenAiVisionExtractor;

    #[test]
    fn parses_plain_array() {
        let parsed = OpenAiVisionExtractor::parse_ingredients(r#"["Milk", "Eggs", " "]"#);
        assert_eq!(parsed, vec!["Milk".to_owned(), "Eggs".to_owned()]);
    }

    #[test]
    fn strips_markdown_fences() {
        let parsed =
            OpenAiVisionExtractor::parse_ingredients("```json\n[\"Chicken Breast\"]\n```");
        assert_eq!(parsed, vec!["Chicken Breast".to_owned()]);
    }

    #[test]
    fn non_array_degrades_to_empty() {
        assert!(OpenAiVisionExtractor::parse_ingredients("{\"items\": []}").is_empty());
        assert!(OpenAiVisionExtractor::parse_ingredients("no json here").is_empty());
    }
}
