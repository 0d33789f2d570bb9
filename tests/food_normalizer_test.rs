// ABOUTME: Tests for the food data normalizer: both nutrient shapes, categorization, portions
// ABOUTME: Exercises the malformed-payload paths entry-by-entry
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

mod common;

use common::detail_payload;
use mealguard::food_data::{normalize, GENERIC_BRAND};
use serde_json::json;

#[test]
fn normalizes_detail_payload() {
    let raw = detail_payload(
        "Cheddar Cheese",
        "Branded",
        123_456,
        403,
        "Pasteurized milk, salt, enzymes",
    );

    let food = normalize(&raw);

    assert_eq!(food.basic.name, "Cheddar Cheese");
    assert_eq!(food.basic.brand, "Generic Brand");
    assert_eq!(food.basic.fdc_id, Some(123_456));
    assert_eq!(food.basic.data_type, "Branded");
    assert_eq!(food.basic.calories_per_100g, 403);

    let protein = &food.nutrients.macronutrients["protein"];
    assert!((protein.amount - 25.0).abs() < f64::EPSILON);
    assert_eq!(protein.unit, "g");

    assert_eq!(food.portions.len(), 1);
    assert_eq!(food.portions[0].measure_unit, "cup, diced");
    assert!((food.portions[0].gram_weight - 132.0).abs() < f64::EPSILON);

    assert!(food.ingredients_text.contains("milk"));
}

#[test]
fn normalizes_flat_search_shape() {
    let raw = json!({
        "description": "Bacon",
        "dataType": "SR Legacy",
        "fdcId": 1_897_574,
        "foodNutrients": [
            { "nutrientName": "Energy", "value": 541, "unitName": "kcal" },
            { "nutrientId": 1003, "nutrientName": "Protein", "value": 37, "unitName": "g" }
        ]
    });

    let food = normalize(&raw);
    assert_eq!(food.basic.calories_per_100g, 541);
    assert_eq!(food.basic.brand, GENERIC_BRAND);
    let protein = &food.nutrients.macronutrients["protein"];
    assert!((protein.amount - 37.0).abs() < f64::EPSILON);
}

#[test]
fn categorizes_nutrients_into_fixed_buckets() {
    let raw = json!({
        "description": "Test Food",
        "dataType": "Branded",
        "fdcId": 1,
        "foodNutrients": [
            { "nutrient": { "id": 1003, "name": "Protein", "unitName": "g" }, "amount": 8 },
            { "nutrient": { "id": 1162, "name": "Vitamin C", "unitName": "mg" }, "amount": 60 },
            { "nutrient": { "id": 1087, "name": "Calcium", "unitName": "mg" }, "amount": 300 },
            { "nutrient": { "id": 9999, "name": "Caffeine", "unitName": "mg" }, "amount": 40 }
        ]
    });

    let food = normalize(&raw);
    assert!(food.nutrients.macronutrients.contains_key("protein"));
    assert!(food.nutrients.vitamins.contains_key("vitamin_c"));
    assert!(food.nutrients.minerals.contains_key("calcium"));
    // Unmapped ids land in "other" under a key derived from the name.
    assert!(food.nutrients.other.contains_key("caffeine"));
}

#[test]
fn portions_sort_by_sequence_number() {
    let raw = json!({
        "description": "Test Food",
        "dataType": "Branded",
        "fdcId": 1,
        "foodNutrients": [],
        "foodPortions": [
            {
                "measureUnit": { "name": "cup" },
                "gramWeight": 240,
                "portionDescription": "1 cup",
                "sequenceNumber": 2
            },
            {
                "measureUnit": { "name": "tablespoon" },
                "gramWeight": 15,
                "portionDescription": "1 tablespoon",
                "sequenceNumber": 1
            }
        ]
    });

    let food = normalize(&raw);
    assert_eq!(food.portions.len(), 2);
    assert_eq!(food.portions[0].measure_unit, "tablespoon");
    assert_eq!(food.portions[1].measure_unit, "cup");
}

#[test]
fn non_object_payload_yields_empty_structure() {
    let food = normalize(&json!("not an object"));
    assert_eq!(food.basic.calories_per_100g, 0);
    assert_eq!(food.basic.name, "");
    assert_eq!(food.basic.brand, GENERIC_BRAND);
    assert!(food.nutrients.is_empty());
    assert!(food.portions.is_empty());
    assert!(food.ingredients_text.is_empty());

    let food = normalize(&json!(null));
    assert_eq!(food.basic.calories_per_100g, 0);
}

#[test]
fn malformed_nutrient_entries_are_skipped_individually() {
    let raw = json!({
        "description": "Test",
        "dataType": "Branded",
        "fdcId": 1,
        "foodNutrients": [
            "not an object",
            { "nutrient": "not an object" },
            { "nutrient": { "id": 1003, "name": "Protein" }, "amount": "invalid" },
            { "nutrient": { "id": 1004, "name": "Total lipid (fat)", "unitName": "g" }, "amount": 33 }
        ]
    });

    let food = normalize(&raw);
    // Only the well-formed entry survives.
    assert_eq!(food.nutrients.macronutrients.len(), 1);
    assert!(food.nutrients.macronutrients.contains_key("total_fat"));
}

#[test]
fn nutrients_field_of_wrong_type_defaults_calories_to_zero() {
    let raw = json!({
        "description": "Test",
        "dataType": "Branded",
        "fdcId": 1,
        "foodNutrients": "not a list"
    });
    assert_eq!(normalize(&raw).basic.calories_per_100g, 0);
}

#[test]
fn non_numeric_calorie_value_defaults_to_zero() {
    let raw = json!({
        "description": "Test",
        "fdcId": 1,
        "foodNutrients": [
            { "nutrient": { "id": 1008 }, "amount": "not a number" }
        ]
    });
    assert_eq!(normalize(&raw).basic.calories_per_100g, 0);
}

#[test]
fn portions_with_non_numeric_gram_weight_are_dropped() {
    let raw = json!({
        "description": "Test",
        "dataType": "Branded",
        "fdcId": 1,
        "foodNutrients": [],
        "foodPortions": [
            "not an object",
            { "measureUnit": { "name": "cup" }, "gramWeight": "invalid", "amount": 1 }
        ]
    });
    assert!(normalize(&raw).portions.is_empty());
}

#[test]
fn empty_brand_falls_back_to_generic() {
    let raw = json!({
        "description": "Plain Oats",
        "dataType": "SR Legacy",
        "fdcId": 7,
        "brandOwner": "   ",
        "foodNutrients": []
    });
    assert_eq!(normalize(&raw).basic.brand, GENERIC_BRAND);
}
