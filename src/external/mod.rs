// ABOUTME: Boundary clients for the remote nutrition database and the vision collaborator
// ABOUTME: Both are trait seams so the pipeline can run against test doubles
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

/// Client for the USDA FoodData Central nutrition database
pub mod usda;
/// Ingredient extraction from pantry images via an OpenAI-compatible endpoint
pub mod vision;

pub use usda::{FoodDataClient, FoodSummary, UsdaClient};
pub use vision::{OpenAiVisionExtractor, VisionExtractor};
