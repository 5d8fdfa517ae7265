//! Activity seeding functionality
//!
//! Populates the activities table with the school's fixed initial catalog.
//! Seeding only happens when the table is empty, so restarts never duplicate
//! or overwrite activities.

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, TransactionTrait};

use crate::error::StoreError;
use crate::models::Activity;
use crate::repositories::NewActivity;
use crate::repositories::activity::insert_activities;

/// The initial catalog: (name, description, schedule, max participants)
const INITIAL_CATALOG: &[(&str, &str, &str, i32)] = &[
    (
        "Chess Club",
        "Learn strategies and compete in chess tournaments",
        "Fridays, 3:30 PM - 5:00 PM",
        12,
    ),
    (
        "Programming Class",
        "Learn programming fundamentals and build software projects",
        "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
        20,
    ),
    (
        "Gym Class",
        "Physical education and sports activities",
        "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
        30,
    ),
    (
        "Soccer Team",
        "Join the school soccer team and compete in matches",
        "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
        22,
    ),
    (
        "Basketball Team",
        "Practice and play basketball with the school team",
        "Wednesdays and Fridays, 3:30 PM - 5:00 PM",
        15,
    ),
    (
        "Art Club",
        "Explore your creativity through painting and drawing",
        "Thursdays, 3:30 PM - 5:00 PM",
        15,
    ),
    (
        "Drama Club",
        "Act, direct, and produce plays and performances",
        "Mondays and Wednesdays, 4:00 PM - 5:30 PM",
        20,
    ),
    (
        "Math Club",
        "Solve challenging problems and participate in math competitions",
        "Tuesdays, 3:30 PM - 4:30 PM",
        10,
    ),
    (
        "Debate Team",
        "Develop public speaking and argumentation skills",
        "Fridays, 4:00 PM - 5:30 PM",
        12,
    ),
];

/// Returns the fixed initial activity catalog
pub fn initial_activities() -> Vec<NewActivity> {
    INITIAL_CATALOG
        .iter()
        .map(|(name, description, schedule, max_participants)| NewActivity {
            name: name.to_string(),
            description: Some(description.to_string()),
            schedule: Some(schedule.to_string()),
            max_participants: *max_participants,
        })
        .collect()
}

/// Seeds `activities` into the store if it holds no activity yet.
///
/// The emptiness check and the inserts share one transaction. Returns the
/// number of activities inserted (zero when the store was already populated).
pub async fn seed_activities_if_empty(
    db: &DatabaseConnection,
    activities: &[NewActivity],
) -> Result<usize, StoreError> {
    let txn = db.begin().await?;

    let existing = Activity::find().count(&txn).await?;
    if existing > 0 {
        log::info!(
            "Activity catalog already holds {} activities, skipping seed",
            existing
        );
        return Ok(0);
    }

    let inserted = match insert_activities(&txn, activities).await {
        Ok(inserted) => inserted,
        Err(e) => {
            log::error!("Failed to seed activity catalog: {}", e);
            return Err(e.into());
        }
    };

    txn.commit().await?;

    log::info!("Seeded {} activities", inserted);
    Ok(inserted)
}
