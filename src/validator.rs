// ABOUTME: Resolves bare ingredient names into validated records via search, detail fetch, and detection
// ABOUTME: Batch validation isolates failures per item; one bad lookup never aborts the batch
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Ingredient Validator
//!
//! Orchestrates the external food client, the normalizer, and the allergen
//! detector. Search results are ranked by a fixed data-type priority: the
//! curated generic datasets are more authoritative than branded entries, so
//! "SR Legacy" wins over "Survey (FNDDS)" wins over "Branded", falling back
//! to the first result when nothing matches a priority tag.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::allergens::{detect_allergens, Allergen, AllergenCategory};
use crate::errors::UsdaApiError;
use crate::external::usda::{FoodDataClient, FoodSummary};
use crate::food_data;
use crate::models::{ValidationResult, ValidationStatus};

/// Search-result ranking, most authoritative first.
pub const DATA_TYPE_PRIORITY: [&str; 3] = ["SR Legacy", "Survey (FNDDS)", "Branded"];

/// Page size used for validation lookups.
const VALIDATION_PAGE_SIZE: u32 = 5;

/// Default page size for interactive annotated search.
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 10;

/// Allergen hint attached to an interactive search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAllergen {
    /// Catalog row id
    pub id: i64,
    /// Canonical allergen name
    pub name: String,
    /// Catalog classification
    pub category: AllergenCategory,
}

/// One interactive search result with detection hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedFood {
    /// Food description
    pub name: String,
    /// Brand owner, `"Generic"` when unbranded
    pub brand: String,
    /// Calories per 100 g reference from the flat nutrient list
    pub calories: u32,
    /// Remote identifier
    pub fdc_id: Option<u64>,
    /// Data-type tag
    pub data_type: String,
    /// Catalog entries whose names match the description
    pub suggested_allergens: Vec<SuggestedAllergen>,
}

/// Validator over any [`FoodDataClient`] with a loaded allergen catalog.
pub struct IngredientValidator<C> {
    client: C,
    catalog: Vec<Allergen>,
}

impl<C: FoodDataClient> IngredientValidator<C> {
    /// Create a validator from a client and the allergen catalog.
    #[must_use]
    pub fn new(client: C, catalog: Vec<Allergen>) -> Self {
        Self { client, catalog }
    }

    /// The wrapped client (the scan commit path reuses it for enrichment).
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// The loaded allergen catalog.
    #[must_use]
    pub fn catalog(&self) -> &[Allergen] {
        &self.catalog
    }

    /// Pick the best search match by data-type priority.
    fn select_best_match(results: &[FoodSummary]) -> Option<&FoodSummary> {
        for data_type in DATA_TYPE_PRIORITY {
            if let Some(result) = results.iter().find(|r| r.data_type == data_type) {
                debug!(data_type, "selected priority match");
                return Some(result);
            }
        }
        results.first()
    }

    /// Resolve one bare ingredient name.
    ///
    /// "Not found" is a status, not an error; `NotFound` from a detail
    /// fetch maps to the same status. Transport, auth, throttling, and
    /// validation failures propagate for the caller to handle.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`UsdaApiError`] for remote failures.
    #[instrument(skip(self))]
    pub async fn validate_one(&self, name: &str) -> Result<ValidationResult, UsdaApiError> {
        let results = self
            .client
            .search_foods(name, VALIDATION_PAGE_SIZE)
            .await?;

        let Some(best) = Self::select_best_match(&results) else {
            warn!(ingredient = name, "no match in external database");
            return Ok(ValidationResult::not_found(name));
        };

        let raw = match best.fdc_id {
            Some(fdc_id) => match self.client.get_food_details(fdc_id).await {
                Ok(details) => details,
                Err(UsdaApiError::NotFound { .. }) => {
                    return Ok(ValidationResult::not_found(name))
                }
                Err(e) => return Err(e),
            },
            // No id to fetch details with: the search entry itself is the
            // authoritative payload.
            None => best.raw.clone(),
        };

        let food = food_data::normalize(&raw);
        let resolved_name = if food.basic.name.is_empty() {
            name.to_owned()
        } else {
            food.basic.name.clone()
        };

        let detection_text = format!("{} {}", food.basic.name, food.ingredients_text);
        let allergens = detect_allergens(&detection_text, &self.catalog)
            .into_iter()
            .map(|a| a.name.clone())
            .collect();

        let data_type = if food.basic.data_type.is_empty() {
            best.data_type.clone()
        } else {
            food.basic.data_type.clone()
        };

        Ok(ValidationResult {
            name: resolved_name,
            brand: food.basic.brand,
            calories: food.basic.calories_per_100g,
            allergens,
            fdc_id: food.basic.fdc_id.or(best.fdc_id),
            data_type: Some(data_type.clone()),
            status: ValidationStatus::Success,
            notes: format!("Validated via USDA ({data_type})"),
        })
    }

    /// Validate a batch of names independently.
    ///
    /// Failures are isolated per item: an erroring lookup yields an
    /// `Error`-status result and the batch continues.
    #[instrument(skip_all, fields(count = names.len()))]
    pub async fn validate_many(&self, names: &[String]) -> Vec<ValidationResult> {
        let mut validated = Vec::with_capacity(names.len());
        for name in names {
            match self.validate_one(name).await {
                Ok(result) => validated.push(result),
                Err(e) => {
                    warn!(ingredient = %name, error = %e, "validation failed for item");
                    validated.push(ValidationResult::lookup_error(name, &e.to_string()));
                }
            }
        }
        validated
    }

    /// Interactive search: lenient per-entry formatting with allergen
    /// hints detected from each description.
    ///
    /// # Errors
    ///
    /// Remote failures propagate; this is the user-facing path and shows a
    /// single clear failure state.
    #[instrument(skip(self))]
    pub async fn search_annotated(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Vec<AnnotatedFood>, UsdaApiError> {
        let results = self.client.search_foods(query, page_size).await?;

        Ok(results
            .iter()
            .map(|entry| {
                let food = food_data::normalize(&entry.raw);
                let suggested = detect_allergens(&food.basic.name, &self.catalog)
                    .into_iter()
                    .map(|a| SuggestedAllergen {
                        id: a.id,
                        name: a.name.clone(),
                        category: a.category,
                    })
                    .collect();
                AnnotatedFood {
                    name: food.basic.name,
                    brand: food.basic.brand,
                    calories: food.basic.calories_per_100g,
                    fdc_id: food.basic.fdc_id,
                    data_type: food.basic.data_type,
                    suggested_allergens: suggested,
                }
            })
            .collect())
    }
}
