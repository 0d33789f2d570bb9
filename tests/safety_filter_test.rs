// ABOUTME: Tests for the safety filter: recipe filtering and pantry partitioning by allergen sets
// ABOUTME: Includes the store-backed materialization feeding the pure set logic
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

mod common;

use std::collections::HashSet;

use common::test_db;
use mealguard::allergens::AllergenCategory;
use mealguard::safety::{filter_safe_recipes, is_safe_for_user, partition_pantry, RecipeAllergens};
use uuid::Uuid;

fn recipe(id: i64, title: &str, allergen_ids: &[i64]) -> RecipeAllergens {
    RecipeAllergens {
        recipe_id: id,
        title: title.to_owned(),
        allergen_ids: allergen_ids.iter().copied().collect(),
    }
}

#[test]
fn disjoint_sets_are_safe() {
    let item: HashSet<i64> = [1, 2].into_iter().collect();
    let user: HashSet<i64> = [3].into_iter().collect();
    assert!(is_safe_for_user(&item, &user));
    assert!(!is_safe_for_user(&item, &[2].into_iter().collect()));
}

#[test]
fn empty_user_set_means_no_constraint() {
    let recipes = vec![
        recipe(1, "Peanut Satay", &[1]),
        recipe(2, "Milk Toast", &[2]),
    ];
    let filtered = filter_safe_recipes(recipes.clone(), &HashSet::new());
    assert_eq!(filtered, recipes);
}

#[test]
fn recipes_carrying_a_user_allergen_are_excluded() {
    let peanuts = 1i64;
    let milk = 2i64;
    let recipes = vec![
        recipe(1, "Peanut Satay", &[peanuts]),
        recipe(2, "Fruit Salad", &[]),
        recipe(3, "Milk Toast", &[milk]),
    ];

    let user: HashSet<i64> = [peanuts].into_iter().collect();
    let filtered = filter_safe_recipes(recipes, &user);

    let titles: Vec<&str> = filtered.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Fruit Salad", "Milk Toast"]);
}

#[test]
fn one_shared_allergen_is_enough_to_exclude() {
    let recipes = vec![recipe(1, "Everything Omelette", &[1, 2, 3])];
    let user: HashSet<i64> = [3, 9].into_iter().collect();
    assert!(filter_safe_recipes(recipes, &user).is_empty());
}

#[tokio::test]
async fn pantry_partition_uses_materialized_relationships() {
    let (_dir, db) = test_db().await;
    let user = Uuid::new_v4();

    let milk = db
        .get_or_create_allergen("Milk", AllergenCategory::MajorAllergen)
        .await
        .expect("allergen");

    let (cheese, _) = db
        .get_or_create_ingredient("Cheddar Cheese", "Generic", 403)
        .await
        .expect("ingredient");
    db.set_ingredient_allergens(cheese.id, &[milk.id])
        .await
        .expect("attach");
    let (rice, _) = db
        .get_or_create_ingredient("Brown Rice", "Generic", 111)
        .await
        .expect("ingredient");

    db.add_to_pantry(user, cheese.id).await.expect("pantry");
    db.add_to_pantry(user, rice.id).await.expect("pantry");
    db.set_profile_allergens(user, &[milk.id]).await.expect("profile");

    let user_allergens = db.profile_allergen_ids(user).await.expect("profile ids");
    let mut items = Vec::new();
    for ingredient in db.pantry_ingredients(user).await.expect("pantry list") {
        let ids = db
            .allergen_ids_for_ingredient(ingredient.id)
            .await
            .expect("ids");
        items.push((ingredient, ids));
    }

    let (safe, conflicting) = partition_pantry(items, &user_allergens);
    assert_eq!(safe.len(), 1);
    assert_eq!(safe[0].name, "Brown Rice");
    assert_eq!(conflicting.len(), 1);
    assert_eq!(conflicting[0].name, "Cheddar Cheese");
}

#[tokio::test]
async fn recipe_allergen_union_feeds_the_filter() {
    let (_dir, db) = test_db().await;

    let milk = db
        .get_or_create_allergen("Milk", AllergenCategory::MajorAllergen)
        .await
        .expect("allergen");
    let wheat = db
        .get_or_create_allergen("Wheat", AllergenCategory::MajorAllergen)
        .await
        .expect("allergen");

    let (cheese, _) = db
        .get_or_create_ingredient("Cheddar Cheese", "Generic", 403)
        .await
        .expect("ingredient");
    let (bread, _) = db
        .get_or_create_ingredient("Sourdough", "Generic", 240)
        .await
        .expect("ingredient");
    db.set_ingredient_allergens(cheese.id, &[milk.id])
        .await
        .expect("attach");
    db.set_ingredient_allergens(bread.id, &[wheat.id])
        .await
        .expect("attach");

    // A grilled-cheese recipe unions both ingredients' allergens.
    let union = db
        .allergen_ids_for_ingredients(&[cheese.id, bread.id])
        .await
        .expect("union");
    assert_eq!(union.len(), 2);

    let grilled_cheese = RecipeAllergens {
        recipe_id: 1,
        title: "Grilled Cheese".to_owned(),
        allergen_ids: union,
    };

    let user: HashSet<i64> = [wheat.id].into_iter().collect();
    assert!(filter_safe_recipes(vec![grilled_cheese.clone()], &user).is_empty());

    let unrelated: HashSet<i64> = [milk.id + wheat.id + 100].into_iter().collect();
    assert_eq!(
        filter_safe_recipes(vec![grilled_cheese], &unrelated).len(),
        1
    );
}
