// ABOUTME: Four-stage scan ingestion pipeline: rate check, media validation, extraction, validation+dedup
// ABOUTME: Each stage short-circuits with a distinct terminal outcome; quota is consumed on completion
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Scan Ingestion Workflow
//!
//! One pantry photo in, a deduplicated list of validated ingredients out.
//! The pipeline tolerates partial failure everywhere below the stage level:
//! per-item validation errors become `error`-status results, and the
//! separate commit operation treats external enrichment as strictly
//! optional. The scan attempt is recorded only after the pipeline
//! completes, so a rejected upload does not consume quota.

use std::collections::HashSet;

use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::allergens::AllergenCategory;
use crate::config::ScanLimits;
use crate::database::Database;
use crate::errors::{ConfigError, UsdaApiError, VisionError};
use crate::external::usda::FoodDataClient;
use crate::external::vision::VisionExtractor;
use crate::food_data;
use crate::models::ValidationResult;
use crate::rate_limiting::ScanRateLimiter;
use crate::validator::IngredientValidator;

/// Content types accepted for scan uploads.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];

/// An uploaded pantry image.
#[derive(Debug, Clone)]
pub struct ScanImage {
    /// Raw image bytes
    pub bytes: Bytes,
    /// Reported content type
    pub content_type: String,
}

/// Terminal outcomes that stop the pipeline before completion.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The user exhausted the sliding-window quota.
    #[error("scan limit reached; quota resets at {reset_at:?}")]
    RateLimitExceeded {
        /// When the oldest in-window attempt expires
        reset_at: Option<DateTime<Utc>>,
    },

    /// No image file accompanied the request.
    #[error("no image file provided")]
    MissingImage,

    /// The upload's content type is not on the allow-list.
    #[error("unsupported image type: {content_type}")]
    UnsupportedMediaType {
        /// Reported content type of the upload
        content_type: String,
    },

    /// The upload exceeds the size ceiling.
    #[error("image of {size} bytes exceeds the {limit}-byte ceiling")]
    ImageTooLarge {
        /// Upload size in bytes
        size: usize,
        /// Configured ceiling in bytes
        limit: usize,
    },

    /// Required service credentials are missing.
    #[error("service configuration error")]
    Configuration(#[from] ConfigError),

    /// The vision collaborator could not be called at all.
    #[error("ingredient extraction failed")]
    ExtractionFailed {
        /// Underlying vision failure
        #[source]
        source: VisionError,
    },

    /// The persistent store failed.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Successful scan outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// Validated ingredients not already in the pantry
    pub detected_ingredients: Vec<ValidationResult>,
    /// How many detections were dropped as pantry duplicates
    pub duplicates_removed: u32,
    /// Scans left in the window after this one
    pub scans_remaining: u32,
    /// Raw detection count before deduplication
    pub total_detected: u32,
}

/// A caller-confirmed item to persist into the pantry.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmedIngredient {
    /// Ingredient name (required, non-empty)
    pub name: String,
    /// Brand, defaulting to the generic sentinel
    #[serde(default)]
    pub brand: Option<String>,
    /// Calories per 100 g reference
    #[serde(default)]
    pub calories: u32,
    /// Canonical allergen names to attach
    #[serde(default)]
    pub allergens: Vec<String>,
    /// External id used for best-effort enrichment
    #[serde(default)]
    pub fdc_id: Option<u64>,
}

/// One ingredient newly added to the pantry by a commit.
#[derive(Debug, Clone, Serialize)]
pub struct AddedIngredient {
    /// Store row id
    pub id: i64,
    /// Ingredient name
    pub name: String,
    /// Brand
    pub brand: String,
    /// Calories per 100 g reference
    pub calories: u32,
    /// Whether nutrition data is attached
    pub has_nutrition_data: bool,
}

/// Outcome of a commit operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommitSummary {
    /// Count of items newly added to the pantry
    pub added_count: u32,
    /// The added items
    pub ingredients: Vec<AddedIngredient>,
}

fn dedup_key(name: &str, brand: &str) -> String {
    format!("{}|{}", name.to_lowercase(), brand.to_lowercase())
}

/// The scan pipeline and its commit operation.
pub struct ScanWorkflow<C, V> {
    db: Database,
    limiter: ScanRateLimiter,
    validator: IngredientValidator<C>,
    vision: V,
    limits: ScanLimits,
}

impl<C: FoodDataClient, V: VisionExtractor> ScanWorkflow<C, V> {
    /// Assemble the workflow from its collaborators.
    #[must_use]
    pub fn new(
        db: Database,
        validator: IngredientValidator<C>,
        vision: V,
        limits: ScanLimits,
    ) -> Self {
        Self {
            limiter: ScanRateLimiter::new(db.clone(), limits),
            db,
            validator,
            vision,
            limits,
        }
    }

    /// The workflow's rate limiter (exposed for quota display and sweeps).
    #[must_use]
    pub const fn rate_limiter(&self) -> &ScanRateLimiter {
        &self.limiter
    }

    /// Run the four-stage pipeline for one uploaded image.
    ///
    /// # Errors
    ///
    /// Returns a distinct [`ScanError`] for each terminal outcome; see the
    /// variants for the stage each belongs to.
    #[instrument(skip(self, image), fields(%user_id))]
    pub async fn process_scan(
        &self,
        user_id: Uuid,
        image: Option<ScanImage>,
        origin_ip: Option<&str>,
    ) -> Result<ScanSummary, ScanError> {
        // Stage 1: sliding-window rate check (advisory fast-reject; the
        // recording at completion is the atomic quota consumer).
        let status = self.limiter.check(user_id).await?;
        if !status.is_allowed {
            warn!(%user_id, "scan rejected by rate limit");
            return Err(ScanError::RateLimitExceeded {
                reset_at: status.reset_at,
            });
        }

        // Stage 2: media validation.
        let image = image.ok_or(ScanError::MissingImage)?;
        if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
            return Err(ScanError::UnsupportedMediaType {
                content_type: image.content_type,
            });
        }
        if image.bytes.len() > self.limits.max_image_bytes {
            return Err(ScanError::ImageTooLarge {
                size: image.bytes.len(),
                limit: self.limits.max_image_bytes,
            });
        }

        // Stage 3: extraction via the vision collaborator.
        let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let detected = self
            .vision
            .extract_ingredients(&encoded, &image.content_type)
            .await
            .map_err(|source| match source {
                VisionError::Configuration => {
                    ScanError::Configuration(ConfigError::MissingVar { key: "VISION_API_KEY" })
                }
                other => ScanError::ExtractionFailed { source: other },
            })?;

        let total_detected = u32::try_from(detected.len()).unwrap_or(u32::MAX);
        if detected.is_empty() {
            info!(%user_id, "no ingredients detected in scan");
            let scans_remaining = self.consume_quota(user_id, origin_ip).await?;
            return Ok(ScanSummary {
                detected_ingredients: Vec::new(),
                duplicates_removed: 0,
                scans_remaining,
                total_detected: 0,
            });
        }

        // Stage 4: per-item validation (failure-isolated) + dedup against
        // the user's current pantry.
        let validated = self.validator.validate_many(&detected).await;
        let (unique, duplicates_removed) = self.deduplicate(user_id, validated).await?;

        let scans_remaining = self.consume_quota(user_id, origin_ip).await?;
        info!(
            %user_id,
            total_detected,
            duplicates_removed,
            kept = unique.len(),
            "scan pipeline complete"
        );

        Ok(ScanSummary {
            detected_ingredients: unique,
            duplicates_removed,
            scans_remaining,
            total_detected,
        })
    }

    /// Drop results whose `(name, brand)` already exists in the pantry.
    async fn deduplicate(
        &self,
        user_id: Uuid,
        validated: Vec<ValidationResult>,
    ) -> Result<(Vec<ValidationResult>, u32), anyhow::Error> {
        let existing: HashSet<String> = self
            .db
            .pantry_pairs(user_id)
            .await?
            .iter()
            .map(|(name, brand)| dedup_key(name, brand))
            .collect();

        let mut unique = Vec::with_capacity(validated.len());
        let mut duplicates = 0u32;
        for result in validated {
            if existing.contains(&dedup_key(&result.name, &result.brand)) {
                duplicates += 1;
            } else {
                unique.push(result);
            }
        }
        Ok((unique, duplicates))
    }

    /// Record the completed scan; detects the rare case where concurrent
    /// completions filled the window after the advisory check.
    async fn consume_quota(
        &self,
        user_id: Uuid,
        origin_ip: Option<&str>,
    ) -> Result<u32, ScanError> {
        let recorded = self.limiter.record(user_id, origin_ip).await?;
        if !recorded {
            let status = self.limiter.check(user_id).await?;
            return Err(ScanError::RateLimitExceeded {
                reset_at: status.reset_at,
            });
        }
        let status = self.limiter.check(user_id).await?;
        Ok(status.scans_remaining)
    }

    /// Persist a caller-confirmed subset of validated items.
    ///
    /// Idempotent: existing `(name, brand)` records are reused, pantry
    /// membership is added only when absent, and enrichment never
    /// overwrites data already attached. Malformed items (non-object
    /// entries, empty names) are skipped individually; external failures
    /// during enrichment are logged and skipped per item.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store itself is unavailable.
    #[instrument(skip(self, items), fields(%user_id, count = items.len()))]
    pub async fn add_confirmed_ingredients(
        &self,
        user_id: Uuid,
        items: &[Value],
    ) -> Result<CommitSummary, anyhow::Error> {
        let mut summary = CommitSummary::default();

        for item in items {
            let confirmed: ConfirmedIngredient =
                match serde_json::from_value(item.clone()) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(error = %e, "skipping malformed confirmed ingredient");
                        continue;
                    }
                };

            match self.commit_one(user_id, confirmed).await {
                Ok(Some(added)) => {
                    summary.added_count += 1;
                    summary.ingredients.push(added);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "failed to commit ingredient, continuing batch");
                }
            }
        }

        info!(%user_id, added = summary.added_count, "pantry commit complete");
        Ok(summary)
    }

    async fn commit_one(
        &self,
        user_id: Uuid,
        confirmed: ConfirmedIngredient,
    ) -> Result<Option<AddedIngredient>, anyhow::Error> {
        let name = confirmed.name.trim().to_owned();
        if name.is_empty() {
            warn!("skipping confirmed ingredient with empty name");
            return Ok(None);
        }
        let brand = confirmed
            .brand
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(food_data::GENERIC_BRAND)
            .to_owned();

        let (mut ingredient, _created) = self
            .db
            .get_or_create_ingredient(&name, &brand, confirmed.calories)
            .await?;

        // Best-effort enrichment: strictly optional, never blocking.
        if let Some(fdc_id) = confirmed.fdc_id {
            if !ingredient.has_nutrition_data() {
                match self.enrich(ingredient.id, fdc_id).await {
                    Ok(()) => {
                        if let Some(refreshed) =
                            self.db.get_ingredient_by_id(ingredient.id).await?
                        {
                            ingredient = refreshed;
                        }
                    }
                    Err(e) => {
                        warn!(
                            ingredient = %ingredient.name,
                            fdc_id,
                            error = %e,
                            "enrichment skipped for scanned ingredient"
                        );
                    }
                }
            }
        }

        if !confirmed.allergens.is_empty() {
            let mut allergen_ids = Vec::with_capacity(confirmed.allergens.len());
            for allergen_name in &confirmed.allergens {
                let allergen = self
                    .db
                    .get_or_create_allergen(allergen_name, AllergenCategory::MajorAllergen)
                    .await?;
                allergen_ids.push(allergen.id);
            }
            self.db
                .set_ingredient_allergens(ingredient.id, &allergen_ids)
                .await?;
        }

        if self.db.add_to_pantry(user_id, ingredient.id).await? {
            Ok(Some(AddedIngredient {
                id: ingredient.id,
                name: ingredient.name.clone(),
                brand: ingredient.brand.clone(),
                calories: ingredient.calories,
                has_nutrition_data: ingredient.has_nutrition_data(),
            }))
        } else {
            Ok(None)
        }
    }

    async fn enrich(&self, ingredient_id: i64, fdc_id: u64) -> Result<(), UsdaApiError> {
        let raw = self.validator.client().get_food_details(fdc_id).await?;
        let food = food_data::normalize(&raw);
        if let Err(e) = self.db.attach_food_data(ingredient_id, &food).await {
            // A storage fault here is still non-fatal for the batch item.
            warn!(error = %e, "failed to store enrichment data");
        }
        Ok(())
    }
}
