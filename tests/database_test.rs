// ABOUTME: Tests for the store: constraint-backed get-or-create, idempotent enrichment, seeding
// ABOUTME: Runs against temp SQLite files; each test gets a fresh database
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

mod common;

use common::{detail_payload, test_db};
use mealguard::allergens::seed::{seed_catalog, SeedMode, DIETARY_PREFERENCES, MAJOR_ALLERGENS};
use mealguard::allergens::AllergenCategory;
use mealguard::food_data::normalize;
use uuid::Uuid;

#[tokio::test]
async fn get_or_create_allergen_is_idempotent() {
    let (_dir, db) = test_db().await;

    let first = db
        .get_or_create_allergen("Milk", AllergenCategory::MajorAllergen)
        .await
        .expect("create");
    let second = db
        .get_or_create_allergen("Milk", AllergenCategory::Custom)
        .await
        .expect("fetch");

    // Same row; the original category is kept.
    assert_eq!(first.id, second.id);
    assert_eq!(second.category, AllergenCategory::MajorAllergen);
}

#[tokio::test]
async fn seeding_creates_then_updates() {
    let (_dir, db) = test_db().await;
    let expected = MAJOR_ALLERGENS.len() + DIETARY_PREFERENCES.len();

    let first = seed_catalog(&db, SeedMode::Update).await.expect("seed");
    assert_eq!(first.created as usize, expected);
    assert_eq!(first.updated, 0);

    let second = seed_catalog(&db, SeedMode::Update).await.expect("re-seed");
    assert_eq!(second.created, 0);
    assert_eq!(second.updated as usize, expected);

    let catalog = db.list_allergens().await.expect("list");
    assert_eq!(catalog.len(), expected);

    // Alternative names came through the JSON column intact.
    let milk = db
        .get_allergen_by_name("Milk")
        .await
        .expect("lookup")
        .expect("seeded");
    let alternatives: Vec<&str> = milk.alternative_names().collect();
    assert!(alternatives.contains(&"lactose"));
}

#[tokio::test]
async fn refresh_seeding_replaces_custom_entries() {
    let (_dir, db) = test_db().await;
    db.get_or_create_allergen("House Special", AllergenCategory::Custom)
        .await
        .expect("custom entry");

    seed_catalog(&db, SeedMode::Refresh).await.expect("refresh");

    assert!(db
        .get_allergen_by_name("House Special")
        .await
        .expect("lookup")
        .is_none());
    assert_eq!(
        db.list_allergens().await.expect("list").len(),
        MAJOR_ALLERGENS.len() + DIETARY_PREFERENCES.len()
    );
}

#[tokio::test]
async fn ingredient_identity_is_name_and_brand() {
    let (_dir, db) = test_db().await;

    let (generic, created_generic) = db
        .get_or_create_ingredient("Peanut Butter", "Generic", 588)
        .await
        .expect("create");
    let (branded, created_branded) = db
        .get_or_create_ingredient("Peanut Butter", "Jif", 590)
        .await
        .expect("create");
    let (again, created_again) = db
        .get_or_create_ingredient("Peanut Butter", "Generic", 588)
        .await
        .expect("fetch");

    assert!(created_generic);
    assert!(created_branded);
    assert!(!created_again);
    assert_ne!(generic.id, branded.id);
    assert_eq!(generic.id, again.id);
}

#[tokio::test]
async fn stale_calories_are_refreshed_on_get_or_create() {
    let (_dir, db) = test_db().await;

    db.get_or_create_ingredient("Banana", "Generic", 89)
        .await
        .expect("create");
    let (updated, created) = db
        .get_or_create_ingredient("Banana", "Generic", 95)
        .await
        .expect("refresh");

    assert!(!created);
    assert_eq!(updated.calories, 95);
}

#[tokio::test]
async fn enrichment_is_idempotent_and_never_overwrites() {
    let (_dir, db) = test_db().await;
    let (ingredient, _) = db
        .get_or_create_ingredient("Cheddar Cheese", "Generic", 100)
        .await
        .expect("create");

    let first = normalize(&detail_payload(
        "Cheddar Cheese",
        "Branded",
        123_456,
        403,
        "milk, salt",
    ));
    assert!(db
        .attach_food_data(ingredient.id, &first)
        .await
        .expect("attach"));

    let enriched = db
        .get_ingredient_by_id(ingredient.id)
        .await
        .expect("fetch")
        .expect("present");
    assert_eq!(enriched.calories, 403);
    assert_eq!(enriched.fdc_id, Some(123_456));
    assert!(enriched.has_nutrition_data());
    assert!(enriched.has_portion_data());
    assert!(enriched.portion_by_unit("CUP, DICED").is_some());

    // A second lookup must not clobber what is already attached.
    let second = normalize(&detail_payload(
        "Cheddar Cheese",
        "Branded",
        999_999,
        500,
        "different",
    ));
    assert!(!db
        .attach_food_data(ingredient.id, &second)
        .await
        .expect("no-op attach"));

    let unchanged = db
        .get_ingredient_by_id(ingredient.id)
        .await
        .expect("fetch")
        .expect("present");
    assert_eq!(unchanged.fdc_id, Some(123_456));
    assert_eq!(unchanged.calories, 403);
}

#[tokio::test]
async fn pantry_membership_is_unique_per_user() {
    let (_dir, db) = test_db().await;
    let user = Uuid::new_v4();
    let (ingredient, _) = db
        .get_or_create_ingredient("Brown Rice", "Generic", 111)
        .await
        .expect("create");

    assert!(db.add_to_pantry(user, ingredient.id).await.expect("add"));
    assert!(!db.add_to_pantry(user, ingredient.id).await.expect("re-add"));

    let pairs = db.pantry_pairs(user).await.expect("pairs");
    assert_eq!(pairs, vec![("Brown Rice".to_owned(), "Generic".to_owned())]);

    // Another user's pantry is unaffected.
    assert!(db
        .pantry_pairs(Uuid::new_v4())
        .await
        .expect("pairs")
        .is_empty());
}

#[tokio::test]
async fn profile_allergens_round_trip() {
    let (_dir, db) = test_db().await;
    let user = Uuid::new_v4();

    let milk = db
        .get_or_create_allergen("Milk", AllergenCategory::MajorAllergen)
        .await
        .expect("allergen");
    let wheat = db
        .get_or_create_allergen("Wheat", AllergenCategory::MajorAllergen)
        .await
        .expect("allergen");

    db.set_profile_allergens(user, &[milk.id, wheat.id])
        .await
        .expect("set");
    let ids = db.profile_allergen_ids(user).await.expect("get");
    assert_eq!(ids.len(), 2);

    // Replacing the set drops the old entries.
    db.set_profile_allergens(user, &[wheat.id]).await.expect("replace");
    let ids = db.profile_allergen_ids(user).await.expect("get");
    assert!(ids.contains(&wheat.id));
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn malformed_json_columns_degrade_gracefully() {
    let (_dir, db) = test_db().await;
    db.get_or_create_allergen("Broken", AllergenCategory::Custom)
        .await
        .expect("create");

    // Corrupt the JSON column behind the model's back.
    sqlx::query("UPDATE allergens SET alternative_names = 'not json' WHERE name = 'Broken'")
        .execute(db.pool())
        .await
        .expect("corrupt");

    let broken = db
        .get_allergen_by_name("Broken")
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(broken.alternative_names().count(), 0);
}
