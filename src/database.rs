// ABOUTME: SQLite store for the allergen catalog, ingredients, pantries, profiles, and the scan log
// ABOUTME: Inline migrations at connect time; get-or-create backed by uniqueness constraints
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Persistence Layer
//!
//! The only touchpoints with the surrounding application: ingredient
//! records, pantry memberships, profile allergen sets, and the append-only
//! scan-attempt log used for rate accounting. All get-or-create operations
//! lean on UNIQUE constraints so concurrent callers cannot create
//! duplicates, and the scan recording is a single compare-and-increment
//! statement.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::allergens::seed::SeedAllergen;
use crate::allergens::{Allergen, AllergenCategory};
use crate::food_data::NormalizedFood;
use crate::models::Ingredient;

/// Store handle; cheap to clone, shares one connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `database_url` and run
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool cannot be created or migrations fail.
    pub async fn connect(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Access the underlying pool (tests and composition).
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS allergens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL DEFAULT 'custom',
                alternative_names TEXT NOT NULL DEFAULT '[]',
                description TEXT NOT NULL DEFAULT '',
                search_terms TEXT NOT NULL DEFAULT '[]'
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                brand TEXT NOT NULL DEFAULT 'Generic',
                calories INTEGER NOT NULL DEFAULT 0,
                fdc_id INTEGER,
                nutrition_data TEXT,
                portion_data TEXT,
                last_updated TEXT NOT NULL,
                UNIQUE (name, brand)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_ingredients_fdc_id ON ingredients(fdc_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredient_allergens (
                ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                allergen_id INTEGER NOT NULL REFERENCES allergens(id) ON DELETE CASCADE,
                UNIQUE (ingredient_id, allergen_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS pantry_items (
                user_id TEXT NOT NULL,
                ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                UNIQUE (user_id, ingredient_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS profile_allergens (
                user_id TEXT NOT NULL,
                allergen_id INTEGER NOT NULL REFERENCES allergens(id) ON DELETE CASCADE,
                UNIQUE (user_id, allergen_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS scan_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                origin_ip TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_scan_attempts_user_time \
             ON scan_attempts(user_id, recorded_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Allergen catalog
    // ------------------------------------------------------------------

    /// All catalog entries ordered by name.
    pub async fn list_allergens(&self) -> Result<Vec<Allergen>> {
        let rows = sqlx::query(
            "SELECT id, name, category, alternative_names, description, search_terms \
             FROM allergens ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_allergen).collect())
    }

    /// Look up one entry by its canonical name.
    pub async fn get_allergen_by_name(&self, name: &str) -> Result<Option<Allergen>> {
        let row = sqlx::query(
            "SELECT id, name, category, alternative_names, description, search_terms \
             FROM allergens WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_allergen))
    }

    /// Fetch or create a catalog entry by name.
    ///
    /// The UNIQUE constraint on `name` makes this race-free: concurrent
    /// callers both land on the same row.
    pub async fn get_or_create_allergen(
        &self,
        name: &str,
        category: AllergenCategory,
    ) -> Result<Allergen> {
        sqlx::query(
            "INSERT INTO allergens (name, category) VALUES (?1, ?2) \
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(name)
        .bind(category.as_str())
        .execute(&self.pool)
        .await?;

        self.get_allergen_by_name(name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("allergen '{name}' missing after get-or-create"))
    }

    /// Create or refresh one seeded catalog entry. Returns `true` when the
    /// entry was newly created.
    pub async fn upsert_allergen(&self, entry: &SeedAllergen) -> Result<bool> {
        let existed = self.get_allergen_by_name(entry.name).await?.is_some();

        sqlx::query(
            r"
            INSERT INTO allergens (name, category, alternative_names, description, search_terms)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(name) DO UPDATE SET
                category = excluded.category,
                alternative_names = excluded.alternative_names,
                description = excluded.description,
                search_terms = excluded.search_terms
            ",
        )
        .bind(entry.name)
        .bind(entry.category.as_str())
        .bind(serde_json::to_string(entry.alternative_names)?)
        .bind(entry.description)
        .bind(serde_json::to_string(entry.search_terms)?)
        .execute(&self.pool)
        .await?;

        Ok(!existed)
    }

    /// Remove every catalog entry (refresh seeding).
    pub async fn delete_all_allergens(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM allergens")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ------------------------------------------------------------------
    // Ingredients
    // ------------------------------------------------------------------

    /// Look up an ingredient by its `(name, brand)` identity.
    pub async fn get_ingredient(&self, name: &str, brand: &str) -> Result<Option<Ingredient>> {
        let row = sqlx::query(
            "SELECT id, name, brand, calories, fdc_id, nutrition_data, portion_data, last_updated \
             FROM ingredients WHERE name = ?1 AND brand = ?2",
        )
        .bind(name)
        .bind(brand)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_ingredient))
    }

    /// Look up an ingredient by row id.
    pub async fn get_ingredient_by_id(&self, id: i64) -> Result<Option<Ingredient>> {
        let row = sqlx::query(
            "SELECT id, name, brand, calories, fdc_id, nutrition_data, portion_data, last_updated \
             FROM ingredients WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_ingredient))
    }

    /// Fetch or create an ingredient by `(name, brand)`. Returns the record
    /// and whether it was newly created. An existing record with a stale
    /// calorie value is brought up to date.
    pub async fn get_or_create_ingredient(
        &self,
        name: &str,
        brand: &str,
        calories: u32,
    ) -> Result<(Ingredient, bool)> {
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO ingredients (name, brand, calories, last_updated) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(name)
        .bind(brand)
        .bind(i64::from(calories))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        let mut ingredient = self
            .get_ingredient(name, brand)
            .await?
            .ok_or_else(|| anyhow::anyhow!("ingredient '{name}' missing after get-or-create"))?;

        if !inserted && ingredient.calories != calories && calories > 0 {
            sqlx::query("UPDATE ingredients SET calories = ?1 WHERE id = ?2")
                .bind(i64::from(calories))
                .bind(ingredient.id)
                .execute(&self.pool)
                .await?;
            ingredient.calories = calories;
        }

        Ok((ingredient, inserted))
    }

    /// Attach externally-sourced nutrition and portion data to an
    /// ingredient that does not have any yet.
    ///
    /// Idempotent enrichment: the statement is a no-op when nutrition data
    /// is already present, so repeated lookups never overwrite earlier
    /// data. Returns whether the row was updated.
    pub async fn attach_food_data(&self, ingredient_id: i64, food: &NormalizedFood) -> Result<bool> {
        let fdc_id = food.basic.fdc_id.and_then(|id| i64::try_from(id).ok());
        let result = sqlx::query(
            r"
            UPDATE ingredients SET
                fdc_id = ?1,
                nutrition_data = ?2,
                portion_data = ?3,
                calories = CASE WHEN ?4 > 0 THEN ?4 ELSE calories END,
                last_updated = ?5
            WHERE id = ?6 AND nutrition_data IS NULL
            ",
        )
        .bind(fdc_id)
        .bind(serde_json::to_string(&food.nutrients)?)
        .bind(serde_json::to_string(&food.portions)?)
        .bind(i64::from(food.basic.calories_per_100g))
        .bind(Utc::now())
        .bind(ingredient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the allergen set attached to an ingredient.
    pub async fn set_ingredient_allergens(
        &self,
        ingredient_id: i64,
        allergen_ids: &[i64],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM ingredient_allergens WHERE ingredient_id = ?1")
            .bind(ingredient_id)
            .execute(&mut *tx)
            .await?;
        for allergen_id in allergen_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO ingredient_allergens (ingredient_id, allergen_id) \
                 VALUES (?1, ?2)",
            )
            .bind(ingredient_id)
            .bind(*allergen_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Canonical allergen names attached to one ingredient.
    pub async fn allergen_names_for_ingredient(&self, ingredient_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT a.name FROM allergens a \
             JOIN ingredient_allergens ia ON ia.allergen_id = a.id \
             WHERE ia.ingredient_id = ?1 ORDER BY a.name",
        )
        .bind(ingredient_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| r.get::<String, _>("name")).collect())
    }

    /// Union of allergen ids over a set of ingredients. Feeds the safety
    /// filter with already-materialized relationships.
    pub async fn allergen_ids_for_ingredients(
        &self,
        ingredient_ids: &[i64],
    ) -> Result<HashSet<i64>> {
        if ingredient_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let placeholders = vec!["?"; ingredient_ids.len()].join(", ");
        let sql = format!(
            "SELECT DISTINCT allergen_id FROM ingredient_allergens \
             WHERE ingredient_id IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql);
        for id in ingredient_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|r| r.get::<i64, _>("allergen_id"))
            .collect())
    }

    /// Allergen ids attached to one ingredient.
    pub async fn allergen_ids_for_ingredient(&self, ingredient_id: i64) -> Result<HashSet<i64>> {
        self.allergen_ids_for_ingredients(&[ingredient_id]).await
    }

    // ------------------------------------------------------------------
    // Pantry
    // ------------------------------------------------------------------

    /// `(name, brand)` pairs currently in a user's pantry (dedup source).
    pub async fn pantry_pairs(&self, user_id: Uuid) -> Result<Vec<(String, String)>> {
        let rows = sqlx::query(
            "SELECT i.name, i.brand FROM ingredients i \
             JOIN pantry_items p ON p.ingredient_id = i.id \
             WHERE p.user_id = ?1",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| (r.get::<String, _>("name"), r.get::<String, _>("brand")))
            .collect())
    }

    /// Add an ingredient to a user's pantry. Returns `false` when it was
    /// already there.
    pub async fn add_to_pantry(&self, user_id: Uuid, ingredient_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO pantry_items (user_id, ingredient_id) VALUES (?1, ?2)",
        )
        .bind(user_id.to_string())
        .bind(ingredient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Full ingredient records in a user's pantry, ordered by name.
    pub async fn pantry_ingredients(&self, user_id: Uuid) -> Result<Vec<Ingredient>> {
        let rows = sqlx::query(
            "SELECT i.id, i.name, i.brand, i.calories, i.fdc_id, i.nutrition_data, \
                    i.portion_data, i.last_updated \
             FROM ingredients i \
             JOIN pantry_items p ON p.ingredient_id = i.id \
             WHERE p.user_id = ?1 ORDER BY i.name, i.brand",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_ingredient).collect())
    }

    // ------------------------------------------------------------------
    // Profile allergen preferences
    // ------------------------------------------------------------------

    /// The allergen ids a user wants to avoid.
    pub async fn profile_allergen_ids(&self, user_id: Uuid) -> Result<HashSet<i64>> {
        let rows = sqlx::query("SELECT allergen_id FROM profile_allergens WHERE user_id = ?1")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| r.get::<i64, _>("allergen_id"))
            .collect())
    }

    /// Replace a user's allergen preference set.
    pub async fn set_profile_allergens(&self, user_id: Uuid, allergen_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM profile_allergens WHERE user_id = ?1")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;
        for allergen_id in allergen_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO profile_allergens (user_id, allergen_id) VALUES (?1, ?2)",
            )
            .bind(user_id.to_string())
            .bind(*allergen_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scan-attempt log (rate-limit accounting)
    // ------------------------------------------------------------------

    /// Attempts recorded for a user since `window_start`.
    pub async fn count_recent_scans(
        &self,
        user_id: Uuid,
        window_start: DateTime<Utc>,
    ) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM scan_attempts \
             WHERE user_id = ?1 AND recorded_at >= ?2",
        )
        .bind(user_id.to_string())
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n"))
    }

    /// Timestamp of the oldest in-window attempt, if any.
    pub async fn oldest_recent_scan(
        &self,
        user_id: Uuid,
        window_start: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT recorded_at FROM scan_attempts \
             WHERE user_id = ?1 AND recorded_at >= ?2 \
             ORDER BY recorded_at ASC LIMIT 1",
        )
        .bind(user_id.to_string())
        .bind(window_start)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get::<DateTime<Utc>, _>("recorded_at")))
    }

    /// Record one scan attempt if and only if the user's in-window count is
    /// still below `max_scans`.
    ///
    /// The conditional insert is a single statement, so concurrent callers
    /// cannot both pass the check and jointly exceed the window. Returns
    /// whether the attempt was recorded.
    pub async fn try_record_scan(
        &self,
        user_id: Uuid,
        origin_ip: Option<&str>,
        recorded_at: DateTime<Utc>,
        window_start: DateTime<Utc>,
        max_scans: u32,
    ) -> Result<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO scan_attempts (user_id, recorded_at, origin_ip)
            SELECT ?1, ?2, ?3
            WHERE (SELECT COUNT(*) FROM scan_attempts
                   WHERE user_id = ?1 AND recorded_at >= ?4) < ?5
            ",
        )
        .bind(user_id.to_string())
        .bind(recorded_at)
        .bind(origin_ip)
        .bind(window_start)
        .bind(i64::from(max_scans))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Retention sweep: drop attempts older than `cutoff`. Returns the
    /// number of rows removed.
    pub async fn purge_scan_attempts(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM scan_attempts WHERE recorded_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn parse_json_column(raw: Option<String>) -> Value {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(Value::Array(Vec::new()))
}

fn row_to_allergen(row: &SqliteRow) -> Allergen {
    Allergen {
        id: row.get("id"),
        name: row.get("name"),
        category: AllergenCategory::from_str_lossy(&row.get::<String, _>("category")),
        alternative_names: parse_json_column(row.get("alternative_names")),
        description: row.get("description"),
        search_terms: parse_json_column(row.get("search_terms")),
    }
}

fn row_to_ingredient(row: &SqliteRow) -> Ingredient {
    let calories: i64 = row.get("calories");
    Ingredient {
        id: row.get("id"),
        name: row.get("name"),
        brand: row.get("brand"),
        calories: u32::try_from(calories).unwrap_or(0),
        fdc_id: row
            .get::<Option<i64>, _>("fdc_id")
            .and_then(|id| u64::try_from(id).ok()),
        nutrition_data: row
            .get::<Option<String>, _>("nutrition_data")
            .and_then(|s| serde_json::from_str(&s).ok()),
        portion_data: row
            .get::<Option<String>, _>("portion_data")
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        last_updated: row.get("last_updated"),
    }
}
