// ABOUTME: Core domain records: ingredients with lazily-attached nutrition data, validation results
// ABOUTME: ValidationResult is transient; it is folded into an ingredient record or discarded
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::food_data::{FoodPortion, NutrientBreakdown, GENERIC_BRAND};

/// A food ingredient with optional externally-sourced nutrition data.
///
/// Identity is the `(name, brand)` pair, unique in the store. Nutrition and
/// portion data are populated lazily on the first successful external
/// lookup and never overwritten once present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Row id in the store
    pub id: i64,
    /// Ingredient name (e.g. "Peanut Butter")
    pub name: String,
    /// Brand name, `"Generic"` when unbranded
    pub brand: String,
    /// Calories per 100 g reference
    pub calories: u32,
    /// External database id when sourced from it
    pub fdc_id: Option<u64>,
    /// Categorized nutrient table, absent until enriched
    pub nutrition_data: Option<NutrientBreakdown>,
    /// Serving sizes with gram weights, empty until enriched
    pub portion_data: Vec<FoodPortion>,
    /// When nutrition/portion data was last written
    pub last_updated: DateTime<Utc>,
}

impl Ingredient {
    /// Whether the nutrient table has been attached.
    #[must_use]
    pub fn has_nutrition_data(&self) -> bool {
        self.nutrition_data
            .as_ref()
            .is_some_and(|n| !n.is_empty())
    }

    /// Whether serving-size data has been attached.
    #[must_use]
    pub fn has_portion_data(&self) -> bool {
        !self.portion_data.is_empty()
    }

    /// Whether this record came from the external database.
    #[must_use]
    pub const fn is_externally_sourced(&self) -> bool {
        self.fdc_id.is_some()
    }

    /// Look up a portion by its unit label, case-insensitively.
    #[must_use]
    pub fn portion_by_unit(&self, unit: &str) -> Option<&FoodPortion> {
        self.portion_data
            .iter()
            .find(|p| p.measure_unit.eq_ignore_ascii_case(unit))
    }
}

/// Outcome class of one per-ingredient lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// A match was found and its data extracted
    Success,
    /// The external database has no match (a valid outcome, not an error)
    NotFound,
    /// The lookup failed for transport/auth/server reasons
    Error,
}

/// Result of resolving one bare ingredient name against the external
/// database. Transient: never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Resolved name (the external description when matched)
    pub name: String,
    /// Brand, `"Generic"` when unbranded
    pub brand: String,
    /// Calories per 100 g reference
    pub calories: u32,
    /// Canonical names of allergens detected in the item's text
    pub allergens: Vec<String>,
    /// External id of the matched entry
    pub fdc_id: Option<u64>,
    /// Data-type tag of the matched entry
    pub data_type: Option<String>,
    /// Outcome class
    pub status: ValidationStatus,
    /// Human-readable note about how the outcome was reached
    pub notes: String,
}

impl ValidationResult {
    /// Result for a name the external database does not know.
    #[must_use]
    pub fn not_found(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            brand: GENERIC_BRAND.to_owned(),
            calories: 0,
            allergens: Vec::new(),
            fdc_id: None,
            data_type: None,
            status: ValidationStatus::NotFound,
            notes: "Ingredient not found in the external food database".to_owned(),
        }
    }

    /// Result for a lookup that failed outright.
    #[must_use]
    pub fn lookup_error(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_owned(),
            brand: GENERIC_BRAND.to_owned(),
            calories: 0,
            allergens: Vec::new(),
            fdc_id: None,
            data_type: None,
            status: ValidationStatus::Error,
            notes: format!("Validation error: {reason}"),
        }
    }
}
