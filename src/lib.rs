// ABOUTME: Library root for the food-data integration and allergen-safety pipeline
// ABOUTME: Wires the external clients, normalizer, detector, validator, scan workflow, and store
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Mealguard
//!
//! The food-data integration and allergen-safety core of a meal-planning
//! application. The surrounding CRUD layer (HTML, auth, admin) lives
//! elsewhere; this crate owns the parts where correctness and failure
//! isolation matter:
//!
//! - [`external::usda`]: client for the remote nutrition database with a
//!   typed error taxonomy and cache-first reads
//! - [`cache`]: the key-value layer in front of that client
//! - [`food_data`]: normalization of heterogeneous remote payloads
//! - [`allergens`]: the allergen catalog and free-text detector
//! - [`validator`]: per-ingredient resolution with batch failure isolation
//! - [`scan`]: the rate-limited image-scan ingestion pipeline
//! - [`safety`]: recipe/ingredient safety as set membership
//! - [`database`]: the SQLite touchpoints shared with the application
//!
//! ```rust,no_run
//! use mealguard::config::{ScanLimits, UsdaConfig};
//! use mealguard::database::Database;
//! use mealguard::external::UsdaClient;
//! use mealguard::validator::IngredientValidator;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let db = Database::connect("sqlite:data/mealguard.db").await?;
//! let client = UsdaClient::new(UsdaConfig::from_env()?)?;
//! let validator = IngredientValidator::new(client, db.list_allergens().await?);
//! let result = validator.validate_one("cheddar cheese").await?;
//! println!("{} -> {:?}", result.name, result.status);
//! # Ok(())
//! # }
//! ```

/// Allergen catalog, detector, and seed data
pub mod allergens;
/// Cache layer consulted by the external food client
pub mod cache;
/// Environment-driven configuration
pub mod config;
/// SQLite persistence touchpoints
pub mod database;
/// Error taxonomies for the external boundaries
pub mod errors;
/// Clients for the nutrition database and vision collaborator
pub mod external;
/// Normalization of raw food payloads
pub mod food_data;
/// Core domain records
pub mod models;
/// Sliding-window scan rate limiting
pub mod rate_limiting;
/// Safety filtering over materialized allergen relationships
pub mod safety;
/// The scan ingestion workflow and pantry commit
pub mod scan;
/// Per-ingredient validation against the external database
pub mod validator;
