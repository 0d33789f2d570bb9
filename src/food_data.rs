// ABOUTME: Pure normalizer turning raw food payloads into basic, nutrient, and portion views
// ABOUTME: Tolerates malformed payloads entry-by-entry and never panics on bad input
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Food Data Normalizer
//!
//! The remote database returns nutrient entries in two shapes: detail
//! payloads nest them under a `nutrient` object with an `amount`, search
//! payloads flatten them to `nutrientId`/`nutrientName`/`value`. A single
//! parser with two explicit decode paths handles both. Everything here is
//! total: a payload that is not even a JSON object yields an all-empty
//! structure rather than an error, and malformed entries inside a valid
//! payload are skipped one at a time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical nutrient id for Energy (kcal) in the remote database.
pub const ENERGY_NUTRIENT_ID: u32 = 1008;

/// Sentinel brand applied when the remote reports none.
pub const GENERIC_BRAND: &str = "Generic";

/// Identity and calorie summary of one food item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicFoodInfo {
    /// Food description from the remote, empty when absent
    pub name: String,
    /// Brand owner, `"Generic"` when absent or empty
    pub brand: String,
    /// Remote identifier when present
    pub fdc_id: Option<u64>,
    /// Remote data-type tag (e.g. "SR Legacy", "Branded")
    pub data_type: String,
    /// Calories per 100 g reference; 0 when absent or malformed
    pub calories_per_100g: u32,
}

/// A single nutrient reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientAmount {
    /// Display label (e.g. "Protein")
    pub name: String,
    /// Amount per 100 g reference
    pub amount: f64,
    /// Unit label (e.g. "g", "mg", "kcal")
    pub unit: String,
    /// Remote nutrient id when known
    pub nutrient_id: Option<u32>,
}

/// Nutrients bucketed into the four fixed categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientBreakdown {
    /// Protein, fats, carbohydrates, energy, fiber, sugars
    pub macronutrients: BTreeMap<String, NutrientAmount>,
    /// Vitamins A through K and the B group
    pub vitamins: BTreeMap<String, NutrientAmount>,
    /// Calcium, iron, and the other tracked minerals
    pub minerals: BTreeMap<String, NutrientAmount>,
    /// Everything with no slot in the table above
    pub other: BTreeMap<String, NutrientAmount>,
}

impl NutrientBreakdown {
    /// Whether no nutrient was extracted at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macronutrients.is_empty()
            && self.vitamins.is_empty()
            && self.minerals.is_empty()
            && self.other.is_empty()
    }
}

/// One serving-size option with its gram weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodPortion {
    /// Unit label (e.g. "cup", "slice")
    pub measure_unit: String,
    /// Weight of one portion in grams
    pub gram_weight: f64,
    /// Free-text description (e.g. "1 cup, diced")
    pub description: String,
    /// Ordering hint from the remote payload
    pub sequence_number: i64,
}

/// The three structured views plus the free-text ingredient list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFood {
    /// Identity and calories
    pub basic: BasicFoodInfo,
    /// Categorized nutrient table
    pub nutrients: NutrientBreakdown,
    /// Serving sizes sorted by sequence number
    pub portions: Vec<FoodPortion>,
    /// Raw ingredient statement (branded foods), empty otherwise
    pub ingredients_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NutrientCategory {
    Macronutrient,
    Vitamin,
    Mineral,
    Other,
}

/// Static id → (key, category) table for the nutrients we slot explicitly.
const NUTRIENT_SLOTS: &[(u32, &str, NutrientCategory)] = &[
    (1003, "protein", NutrientCategory::Macronutrient),
    (1004, "total_fat", NutrientCategory::Macronutrient),
    (1005, "carbohydrates", NutrientCategory::Macronutrient),
    (1008, "energy", NutrientCategory::Macronutrient),
    (1079, "fiber", NutrientCategory::Macronutrient),
    (2000, "sugars", NutrientCategory::Macronutrient),
    (1258, "saturated_fat", NutrientCategory::Macronutrient),
    (1253, "cholesterol", NutrientCategory::Macronutrient),
    (1106, "vitamin_a", NutrientCategory::Vitamin),
    (1162, "vitamin_c", NutrientCategory::Vitamin),
    (1114, "vitamin_d", NutrientCategory::Vitamin),
    (1109, "vitamin_e", NutrientCategory::Vitamin),
    (1185, "vitamin_k", NutrientCategory::Vitamin),
    (1165, "thiamin", NutrientCategory::Vitamin),
    (1166, "riboflavin", NutrientCategory::Vitamin),
    (1167, "niacin", NutrientCategory::Vitamin),
    (1175, "vitamin_b6", NutrientCategory::Vitamin),
    (1177, "folate", NutrientCategory::Vitamin),
    (1178, "vitamin_b12", NutrientCategory::Vitamin),
    (1087, "calcium", NutrientCategory::Mineral),
    (1089, "iron", NutrientCategory::Mineral),
    (1090, "magnesium", NutrientCategory::Mineral),
    (1091, "phosphorus", NutrientCategory::Mineral),
    (1092, "potassium", NutrientCategory::Mineral),
    (1093, "sodium", NutrientCategory::Mineral),
    (1095, "zinc", NutrientCategory::Mineral),
    (1098, "copper", NutrientCategory::Mineral),
    (1103, "selenium", NutrientCategory::Mineral),
];

fn nutrient_slot(id: u32) -> Option<(&'static str, NutrientCategory)> {
    NUTRIENT_SLOTS
        .iter()
        .find(|(slot_id, _, _)| *slot_id == id)
        .map(|(_, key, category)| (*key, *category))
}

/// Derive a stable snake_case key from a nutrient display name.
fn slug_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            key.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            key.push('_');
            last_was_sep = true;
        }
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

/// One nutrient entry decoded from either remote shape.
#[derive(Debug, Clone, PartialEq)]
struct ParsedNutrient {
    id: Option<u32>,
    name: String,
    unit: String,
    amount: Option<f64>,
}

fn value_as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|v| u32::try_from(v).ok())
}

/// Decode a nutrient entry, trying the nested detail shape first and the
/// flat search shape second. Anything else is rejected.
fn parse_nutrient_entry(entry: &Value) -> Option<ParsedNutrient> {
    let obj = entry.as_object()?;

    // Detail shape: { "nutrient": { "id", "name", "unitName" }, "amount" }
    if let Some(nested) = obj.get("nutrient") {
        let nested = nested.as_object()?;
        return Some(ParsedNutrient {
            id: nested.get("id").and_then(value_as_u32),
            name: nested
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            unit: nested
                .get("unitName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            amount: obj.get("amount").and_then(Value::as_f64),
        });
    }

    // Search shape: { "nutrientId", "nutrientName", "unitName", "value" }
    if obj.contains_key("nutrientName") || obj.contains_key("nutrientId") {
        return Some(ParsedNutrient {
            id: obj.get("nutrientId").and_then(value_as_u32),
            name: obj
                .get("nutrientName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            unit: obj
                .get("unitName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            amount: obj.get("value").and_then(Value::as_f64),
        });
    }

    None
}

fn nutrient_entries(raw: &Value) -> impl Iterator<Item = ParsedNutrient> + '_ {
    raw.get("foodNutrients")
        .and_then(Value::as_array)
        .map(|entries| entries.as_slice())
        .unwrap_or_default()
        .iter()
        .filter_map(parse_nutrient_entry)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn amount_to_calories(amount: f64) -> u32 {
    let truncated = amount.trunc();
    if truncated >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        truncated as u32
    }
}

fn extract_calories(raw: &Value) -> u32 {
    nutrient_entries(raw)
        .find(|n| n.id == Some(ENERGY_NUTRIENT_ID) || n.name == "Energy")
        .and_then(|n| n.amount)
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
        .map_or(0, amount_to_calories)
}

fn parse_basic(raw: &Value) -> BasicFoodInfo {
    let brand = raw
        .get("brandOwner")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(GENERIC_BRAND);

    BasicFoodInfo {
        name: raw
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        brand: brand.to_owned(),
        fdc_id: raw.get("fdcId").and_then(Value::as_u64),
        data_type: raw
            .get("dataType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        calories_per_100g: extract_calories(raw),
    }
}

fn parse_nutrients(raw: &Value) -> NutrientBreakdown {
    let mut breakdown = NutrientBreakdown::default();

    for parsed in nutrient_entries(raw) {
        // Entries without a usable amount are skipped, not fatal.
        let Some(amount) = parsed.amount.filter(|a| a.is_finite()) else {
            continue;
        };

        let (key, category) = match parsed.id.and_then(nutrient_slot) {
            Some((key, category)) => (key.to_owned(), category),
            None => {
                let key = slug_key(&parsed.name);
                if key.is_empty() {
                    continue;
                }
                (key, NutrientCategory::Other)
            }
        };

        let bucket = match category {
            NutrientCategory::Macronutrient => &mut breakdown.macronutrients,
            NutrientCategory::Vitamin => &mut breakdown.vitamins,
            NutrientCategory::Mineral => &mut breakdown.minerals,
            NutrientCategory::Other => &mut breakdown.other,
        };
        bucket.insert(
            key,
            NutrientAmount {
                name: parsed.name,
                amount,
                unit: parsed.unit,
                nutrient_id: parsed.id,
            },
        );
    }

    breakdown
}

fn parse_portions(raw: &Value) -> Vec<FoodPortion> {
    let Some(entries) = raw.get("foodPortions").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut portions: Vec<FoodPortion> = entries
        .iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            // A portion without a numeric gram weight is useless downstream.
            let gram_weight = obj.get("gramWeight").and_then(Value::as_f64)?;
            Some(FoodPortion {
                measure_unit: obj
                    .get("measureUnit")
                    .and_then(|m| m.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                gram_weight,
                description: obj
                    .get("portionDescription")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                sequence_number: obj
                    .get("sequenceNumber")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
            })
        })
        .collect();

    portions.sort_by_key(|p| p.sequence_number);
    portions
}

/// Normalize one raw food payload into the structured views.
///
/// Total over arbitrary JSON: malformed nutrient or portion entries are
/// skipped individually, and a payload that is not an object yields the
/// default (all-zero, all-empty) structure.
#[must_use]
pub fn normalize(raw: &Value) -> NormalizedFood {
    if !raw.is_object() {
        return NormalizedFood {
            basic: BasicFoodInfo {
                brand: GENERIC_BRAND.to_owned(),
                ..BasicFoodInfo::default()
            },
            ..NormalizedFood::default()
        };
    }

    NormalizedFood {
        basic: parse_basic(raw),
        nutrients: parse_nutrients(raw),
        portions: parse_portions(raw),
        ingredients_text: raw
            .get("ingredients")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
    }
}

/// Calories for a specific portion weight, rounded to one decimal.
///
/// Zero or non-finite inputs yield 0.
#[must_use]
pub fn portion_calories(calories_per_100g: f64, gram_weight: f64) -> f64 {
    if !calories_per_100g.is_finite()
        || !gram_weight.is_finite()
        || calories_per_100g <= 0.0
        || gram_weight <= 0.0
    {
        return 0.0;
    }
    ((calories_per_100g * gram_weight) / 100.0 * 10.0).round() / 10.0
}

/// Any nutrient amount scaled to a portion weight, rounded to two decimals.
#[must_use]
pub fn nutrient_for_portion(amount_per_100g: f64, gram_weight: f64) -> f64 {
    if !amount_per_100g.is_finite()
        || !gram_weight.is_finite()
        || amount_per_100g <= 0.0
        || gram_weight <= 0.0
    {
        return 0.0;
    }
    ((amount_per_100g * gram_weight) / 100.0 * 100.0).round() / 100.0
}
