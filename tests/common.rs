// ABOUTME: Shared helpers for integration tests: temp databases, catalog entries, mock collaborators
// ABOUTME: Mock clients stand in for the remote nutrition database and vision endpoint
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

#![allow(dead_code)]

use std::collections::HashMap;

use serde_json::Value;
use tempfile::TempDir;

use mealguard::allergens::{Allergen, AllergenCategory};
use mealguard::database::Database;
use mealguard::errors::{UsdaApiError, VisionError};
use mealguard::external::usda::{FoodDataClient, FoodSummary};
use mealguard::external::vision::VisionExtractor;

/// Open a fresh SQLite database under a temp directory.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub async fn test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let db = Database::connect(&url).await.expect("connect test db");
    (dir, db)
}

/// Build an in-memory catalog entry.
pub fn allergen(id: i64, name: &str, alternatives: &[&str]) -> Allergen {
    Allergen {
        id,
        name: name.to_owned(),
        category: AllergenCategory::MajorAllergen,
        alternative_names: serde_json::json!(alternatives),
        description: String::new(),
        search_terms: serde_json::json!([]),
    }
}

/// Failure classes a mock client can be told to produce.
#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    Key,
    RateLimit,
    Server,
    Transport,
}

impl MockFailure {
    pub fn to_error(self) -> UsdaApiError {
        match self {
            Self::Key => UsdaApiError::InvalidApiKey,
            Self::RateLimit => UsdaApiError::RateLimited,
            Self::Server => UsdaApiError::Server { status: 503 },
            Self::Transport => UsdaApiError::Transport {
                reason: "connection failed".to_owned(),
            },
        }
    }
}

/// Canned stand-in for the remote nutrition database.
#[derive(Default)]
pub struct MockFoodClient {
    /// Raw search entries keyed by lowercased query
    pub by_query: HashMap<String, Vec<Value>>,
    /// Raw detail payloads keyed by food id
    pub details: HashMap<u64, Value>,
    /// When set, every search fails with this class
    pub search_failure: Option<MockFailure>,
    /// When set, every detail fetch fails with this class
    pub details_failure: Option<MockFailure>,
}

impl MockFoodClient {
    pub fn with_search(mut self, query: &str, entries: Vec<Value>) -> Self {
        self.by_query.insert(query.to_lowercase(), entries);
        self
    }

    pub fn with_details(mut self, fdc_id: u64, payload: Value) -> Self {
        self.details.insert(fdc_id, payload);
        self
    }
}

fn summary_from_value(entry: &Value) -> FoodSummary {
    FoodSummary {
        fdc_id: entry.get("fdcId").and_then(Value::as_u64),
        description: entry
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        data_type: entry
            .get("dataType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        brand_owner: entry
            .get("brandOwner")
            .and_then(Value::as_str)
            .map(str::to_owned),
        raw: entry.clone(),
    }
}

#[async_trait::async_trait]
impl FoodDataClient for MockFoodClient {
    async fn search_foods(
        &self,
        query: &str,
        _page_size: u32,
    ) -> Result<Vec<FoodSummary>, UsdaApiError> {
        if let Some(failure) = self.search_failure {
            return Err(failure.to_error());
        }
        Ok(self
            .by_query
            .get(&query.to_lowercase())
            .map(|entries| entries.iter().map(summary_from_value).collect())
            .unwrap_or_default())
    }

    async fn get_food_details(&self, fdc_id: u64) -> Result<Value, UsdaApiError> {
        if let Some(failure) = self.details_failure {
            return Err(failure.to_error());
        }
        self.details
            .get(&fdc_id)
            .cloned()
            .ok_or(UsdaApiError::NotFound {
                fdc_id: Some(fdc_id),
            })
    }
}

/// Canned stand-in for the vision collaborator.
#[derive(Default)]
pub struct MockVision {
    /// Ingredient names returned by every extraction
    pub detections: Vec<String>,
    /// When true, every call fails with a transport error
    pub fail: bool,
}

impl MockVision {
    pub fn detecting(names: &[&str]) -> Self {
        Self {
            detections: names.iter().map(|n| (*n).to_owned()).collect(),
            fail: false,
        }
    }
}

#[async_trait::async_trait]
impl VisionExtractor for MockVision {
    async fn extract_ingredients(
        &self,
        _image_base64: &str,
        _mime_type: &str,
    ) -> Result<Vec<String>, VisionError> {
        if self.fail {
            return Err(VisionError::Transport {
                reason: "connection failed".to_owned(),
            });
        }
        Ok(self.detections.clone())
    }
}

/// A branded search entry in the remote's flat shape.
pub fn search_entry(description: &str, data_type: &str, fdc_id: u64, calories: u32) -> Value {
    serde_json::json!({
        "description": description,
        "dataType": data_type,
        "fdcId": fdc_id,
        "brandOwner": "Generic Brand",
        "foodNutrients": [
            { "nutrientId": 1008, "nutrientName": "Energy", "unitName": "kcal", "value": calories },
            { "nutrientId": 1003, "nutrientName": "Protein", "unitName": "g", "value": 25 }
        ]
    })
}

/// A detail payload in the remote's nested shape.
pub fn detail_payload(
    description: &str,
    data_type: &str,
    fdc_id: u64,
    calories: u32,
    ingredients: &str,
) -> Value {
    serde_json::json!({
        "fdcId": fdc_id,
        "description": description,
        "dataType": data_type,
        "brandOwner": "Generic Brand",
        "ingredients": ingredients,
        "foodNutrients": [
            { "nutrient": { "id": 1008, "name": "Energy", "unitName": "kcal" }, "amount": calories },
            { "nutrient": { "id": 1003, "name": "Protein", "unitName": "g" }, "amount": 25 }
        ],
        "foodPortions": [
            {
                "measureUnit": { "name": "cup, diced" },
                "gramWeight": 132,
                "portionDescription": "1 cup, diced",
                "sequenceNumber": 1
            }
        ]
    })
}
