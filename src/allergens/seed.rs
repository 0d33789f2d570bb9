// ABOUTME: Built-in allergen catalog (major 9 + dietary preferences) and the seeding routine
// ABOUTME: Update mode refreshes alternative names on existing entries; refresh mode re-seeds from scratch
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

use tracing::info;

use super::AllergenCategory;
use crate::database::Database;

/// One catalog entry as shipped with the crate.
#[derive(Debug, Clone, Copy)]
pub struct SeedAllergen {
    /// Canonical name
    pub name: &'static str,
    /// Classification
    pub category: AllergenCategory,
    /// Synonyms used for detection
    pub alternative_names: &'static [&'static str],
    /// Human-readable description
    pub description: &'static str,
    /// Keywords for external database queries
    pub search_terms: &'static [&'static str],
}

/// The nine major regulated food allergens.
pub const MAJOR_ALLERGENS: &[SeedAllergen] = &[
    SeedAllergen {
        name: "Milk",
        category: AllergenCategory::MajorAllergen,
        alternative_names: &[
            "dairy", "lactose", "casein", "whey", "cream", "butter", "cheese", "yogurt",
        ],
        description: "Milk and dairy products from cows, goats, and other mammals",
        search_terms: &[
            "milk", "dairy", "lactose", "casein", "whey", "cream", "butter", "cheese",
        ],
    },
    SeedAllergen {
        name: "Eggs",
        category: AllergenCategory::MajorAllergen,
        alternative_names: &[
            "egg",
            "albumin",
            "ovalbumin",
            "egg white",
            "egg yolk",
            "mayonnaise",
        ],
        description: "Eggs and egg-containing products",
        search_terms: &["egg", "albumin", "ovalbumin", "mayonnaise"],
    },
    SeedAllergen {
        name: "Fish",
        category: AllergenCategory::MajorAllergen,
        alternative_names: &[
            "seafood",
            "finned fish",
            "salmon",
            "tuna",
            "cod",
            "halibut",
            "tilapia",
        ],
        description: "Fish with fins (salmon, tuna, cod, etc.)",
        search_terms: &[
            "fish", "salmon", "tuna", "cod", "halibut", "tilapia", "anchovy",
        ],
    },
    SeedAllergen {
        name: "Shellfish",
        category: AllergenCategory::MajorAllergen,
        alternative_names: &[
            "crustacean",
            "mollusk",
            "shrimp",
            "crab",
            "lobster",
            "clam",
            "oyster",
            "mussel",
            "scallop",
        ],
        description: "Crustaceans (shrimp, crab, lobster) and mollusks (clams, oysters)",
        search_terms: &[
            "shrimp", "crab", "lobster", "clam", "oyster", "mussel", "scallop", "crayfish",
        ],
    },
    SeedAllergen {
        name: "Tree Nuts",
        category: AllergenCategory::MajorAllergen,
        alternative_names: &[
            "almond",
            "walnut",
            "cashew",
            "pecan",
            "pistachio",
            "macadamia",
            "hazelnut",
            "brazil nut",
        ],
        description: "Tree nuts including almonds, walnuts, cashews, pecans, and more",
        search_terms: &[
            "almond",
            "walnut",
            "cashew",
            "pecan",
            "pistachio",
            "macadamia",
            "hazelnut",
        ],
    },
    SeedAllergen {
        name: "Peanuts",
        category: AllergenCategory::MajorAllergen,
        alternative_names: &["peanut", "groundnut", "peanut butter", "arachis"],
        description: "Peanuts and peanut-containing products",
        search_terms: &["peanut", "groundnut", "arachis"],
    },
    SeedAllergen {
        name: "Wheat",
        category: AllergenCategory::MajorAllergen,
        alternative_names: &[
            "gluten",
            "flour",
            "wheat flour",
            "whole wheat",
            "durum",
            "semolina",
            "spelt",
        ],
        description: "Wheat and wheat-containing products (primary source of gluten)",
        search_terms: &["wheat", "flour", "gluten", "durum", "semolina", "spelt"],
    },
    SeedAllergen {
        name: "Soybeans",
        category: AllergenCategory::MajorAllergen,
        alternative_names: &[
            "soy",
            "soya",
            "tofu",
            "edamame",
            "soy sauce",
            "tempeh",
            "miso",
        ],
        description: "Soybeans and soy-containing products",
        search_terms: &["soy", "soya", "tofu", "edamame", "tempeh", "miso"],
    },
    SeedAllergen {
        name: "Sesame",
        category: AllergenCategory::MajorAllergen,
        alternative_names: &["tahini", "sesame seed", "sesame oil", "sesamol"],
        description: "Sesame seeds and sesame-containing products",
        search_terms: &["sesame", "tahini", "sesamol"],
    },
];

/// Dietary-preference entries used for vegetarian/vegan/religious filtering.
pub const DIETARY_PREFERENCES: &[SeedAllergen] = &[
    SeedAllergen {
        name: "Meat",
        category: AllergenCategory::DietaryPreference,
        alternative_names: &[
            "beef", "pork", "chicken", "lamb", "poultry", "turkey", "duck", "veal",
        ],
        description: "All meat products for vegetarian filtering",
        search_terms: &[
            "beef", "pork", "chicken", "lamb", "turkey", "duck", "veal", "meat",
        ],
    },
    SeedAllergen {
        name: "Animal Products",
        category: AllergenCategory::DietaryPreference,
        alternative_names: &["meat", "dairy", "eggs", "honey", "gelatin", "animal"],
        description: "All animal-derived products for vegan filtering",
        search_terms: &["meat", "dairy", "egg", "honey", "gelatin"],
    },
    SeedAllergen {
        name: "Pork",
        category: AllergenCategory::DietaryPreference,
        alternative_names: &["pork", "bacon", "ham", "pork chop", "sausage", "prosciutto"],
        description: "Pork products for Halal/Kosher dietary restrictions",
        search_terms: &["pork", "bacon", "ham", "sausage", "prosciutto"],
    },
];

/// Seeding behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    /// Create missing entries and refresh the data on existing ones
    Update,
    /// Delete every catalog entry first, then seed from scratch
    Refresh,
}

/// Outcome of a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Entries newly created
    pub created: u32,
    /// Entries that existed and were refreshed
    pub updated: u32,
}

/// Populate the allergen catalog.
///
/// Canonical names are the immutable identity: update mode rewrites the
/// category, alternative names, description, and search terms of existing
/// entries but never renames them.
///
/// # Errors
///
/// Returns an error when the store is unavailable.
pub async fn seed_catalog(db: &Database, mode: SeedMode) -> anyhow::Result<SeedReport> {
    if mode == SeedMode::Refresh {
        let removed = db.delete_all_allergens().await?;
        info!(removed, "cleared allergen catalog before re-seed");
    }

    let mut report = SeedReport::default();
    for entry in MAJOR_ALLERGENS.iter().chain(DIETARY_PREFERENCES) {
        if db.upsert_allergen(entry).await? {
            report.created += 1;
        } else {
            report.updated += 1;
        }
    }

    info!(
        created = report.created,
        updated = report.updated,
        "allergen catalog seeded"
    );
    Ok(report)
}
