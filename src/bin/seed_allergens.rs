// ABOUTME: Seeds the allergen catalog with the major allergens and dietary preferences
// ABOUTME: Update mode refreshes existing entries; --mode=refresh clears and re-seeds
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

use mealguard::allergens::seed::{seed_catalog, SeedMode};
use mealguard::database::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "mealguard=info".to_owned()),
        )
        .init();

    let mode = match std::env::args().nth(1).as_deref() {
        Some("--mode=refresh") => SeedMode::Refresh,
        Some("--mode=update") | None => SeedMode::Update,
        Some(other) => {
            eprintln!("unknown argument: {other}");
            eprintln!("usage: seed-allergens [--mode=update|--mode=refresh]");
            std::process::exit(2);
        }
    };

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/mealguard.db".to_owned());
    let db = Database::connect(&database_url).await?;

    let report = seed_catalog(&db, mode).await?;
    println!(
        "Seeding complete: {} created, {} updated, {} total",
        report.created,
        report.updated,
        db.list_allergens().await?.len()
    );

    Ok(())
}
