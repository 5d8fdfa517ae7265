//! Test utilities for database testing.
//!
//! This module provides utilities for setting up SQLite databases (in-memory
//! or file-backed) with migrations applied, plus small fixture helpers.

use activities::config::AppConfig;
use activities::db::init_pool;
use activities::repositories::{ActivityRepository, NewActivity};
use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tempfile::TempDir;

/// Sets up an in-memory SQLite database with all migrations applied.
#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Sets up a file-backed SQLite database inside `dir` through the service's
/// own pool initialization, so several connections can run concurrently.
#[allow(dead_code)]
pub async fn setup_file_db(dir: &TempDir) -> Result<DatabaseConnection> {
    let config = test_config(dir);
    let db = init_pool(&config).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Configuration pointing at a fresh SQLite file inside `dir`.
#[allow(dead_code)]
pub fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        database_url: format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("activities.db").display()
        ),
        db_acquire_timeout_ms: 30_000,
        static_dir: dir.path().to_path_buf(),
        ..Default::default()
    }
}

/// Builds a fixture activity with the given capacity.
#[allow(dead_code)]
pub fn new_activity(name: &str, max_participants: i32) -> NewActivity {
    NewActivity {
        name: name.to_string(),
        description: Some(format!("{} description", name)),
        schedule: Some("Mondays, 3:30 PM - 4:30 PM".to_string()),
        max_participants,
    }
}

/// Inserts fixture activities directly through the repository.
#[allow(dead_code)]
pub async fn insert_activities(db: &DatabaseConnection, activities: &[NewActivity]) -> Result<()> {
    ActivityRepository::new(db).create_many(activities).await?;
    Ok(())
}
