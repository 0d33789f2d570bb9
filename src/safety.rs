// ABOUTME: Set-membership safety computations over already-materialized allergen relationships
// ABOUTME: An empty user allergen set means "no constraint", not "unknown"
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Safety Filter
//!
//! Pure set logic: an item is safe for a user when its allergen set does
//! not intersect the user's. Inputs are allergen-id sets materialized from
//! the store; detection is never re-run here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::Ingredient;

/// A recipe reduced to the union of its ingredients' allergen ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeAllergens {
    /// Recipe identifier in the surrounding application
    pub recipe_id: i64,
    /// Recipe title for display
    pub title: String,
    /// Union of allergen ids over the recipe's ingredients
    pub allergen_ids: HashSet<i64>,
}

/// Whether an item with `item_allergens` is safe for a user avoiding
/// `user_allergens`.
#[must_use]
pub fn is_safe_for_user(item_allergens: &HashSet<i64>, user_allergens: &HashSet<i64>) -> bool {
    item_allergens.is_disjoint(user_allergens)
}

/// Keep only the recipes safe for the user.
///
/// An empty `user_allergens` set declares no constraint: every recipe is
/// safe.
#[must_use]
pub fn filter_safe_recipes(
    recipes: Vec<RecipeAllergens>,
    user_allergens: &HashSet<i64>,
) -> Vec<RecipeAllergens> {
    if user_allergens.is_empty() {
        return recipes;
    }
    recipes
        .into_iter()
        .filter(|recipe| is_safe_for_user(&recipe.allergen_ids, user_allergens))
        .collect()
}

/// Split pantry ingredients into safe and conflicting sets for a user.
///
/// Each element pairs an ingredient with its materialized allergen ids.
#[must_use]
pub fn partition_pantry(
    items: Vec<(Ingredient, HashSet<i64>)>,
    user_allergens: &HashSet<i64>,
) -> (Vec<Ingredient>, Vec<Ingredient>) {
    let mut safe = Vec::new();
    let mut unsafe_items = Vec::new();
    for (ingredient, allergen_ids) in items {
        if is_safe_for_user(&allergen_ids, user_allergens) {
            safe.push(ingredient);
        } else {
            unsafe_items.push(ingredient);
        }
    }
    (safe, unsafe_items)
}
