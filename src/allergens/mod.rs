// ABOUTME: Allergen catalog model and the substring-based detector over free-text descriptions
// ABOUTME: Matching is deliberately substring-based so compound words still trigger warnings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Allergen Catalog & Detector
//!
//! Detection favours recall over precision: a product name containing
//! "soymilk" must still match the "soy" alternative name, so matching is
//! case-folded substring search rather than tokenization. Over-warning is
//! the acceptable failure mode for a safety feature.

/// Seed data and the catalog seeding routine
pub mod seed;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergenCategory {
    /// One of the major regulated food allergens
    MajorAllergen,
    /// Dietary preference used for vegetarian/vegan/religious filtering
    DietaryPreference,
    /// User-added entry
    Custom,
}

impl AllergenCategory {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MajorAllergen => "major_allergen",
            Self::DietaryPreference => "dietary_preference",
            Self::Custom => "custom",
        }
    }

    /// Parse the storage representation; unknown strings map to `Custom`.
    #[must_use]
    pub fn from_str_lossy(raw: &str) -> Self {
        match raw {
            "major_allergen" => Self::MajorAllergen,
            "dietary_preference" => Self::DietaryPreference,
            _ => Self::Custom,
        }
    }
}

/// A catalog entry: canonical name plus alternative names used for matching.
///
/// `alternative_names` and `search_terms` are kept as raw JSON because they
/// live in JSON columns; a malformed value (anything but an array) simply
/// yields no alternatives instead of failing a detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allergen {
    /// Row id in the store
    pub id: i64,
    /// Canonical, unique name
    pub name: String,
    /// Classification
    pub category: AllergenCategory,
    /// JSON array of synonyms used for matching
    pub alternative_names: Value,
    /// Human-readable description
    pub description: String,
    /// JSON array of keywords for external database queries
    pub search_terms: Value,
}

impl Allergen {
    /// Iterate the alternative names, tolerating a malformed column value.
    pub fn alternative_names(&self) -> impl Iterator<Item = &str> {
        self.alternative_names
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
    }

    /// Iterate the external search terms, tolerating a malformed column value.
    pub fn search_terms(&self) -> impl Iterator<Item = &str> {
        self.search_terms
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
    }

    fn matches(&self, folded_text: &str) -> bool {
        if folded_text.contains(&self.name.to_lowercase()) {
            return true;
        }
        self.alternative_names()
            .any(|alt| folded_text.contains(&alt.to_lowercase()))
    }
}

/// Detect catalog entries present in a free-text description.
///
/// Order-preserving over `catalog`, at most one hit per entry; empty or
/// blank text yields an empty result.
#[must_use]
pub fn detect_allergens<'a>(text: &str, catalog: &'a [Allergen]) -> Vec<&'a Allergen> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let folded = text.to_lowercase();
    catalog
        .iter()
        .filter(|allergen| allergen.matches(&folded))
        .collect()
}
