//! Activity entity model
//!
//! This module contains the SeaORM entity model for the activities table,
//! the catalog of extracurricular offerings students can sign up for.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Activity entity representing one extracurricular offering
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    /// Surrogate identifier (primary key)
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Globally unique display name, used as the lookup key by the API
    #[sea_orm(unique)]
    pub name: String,

    pub description: Option<String>,

    /// Free-form meeting schedule, e.g. "Fridays, 3:30 PM - 5:00 PM"
    pub schedule: Option<String>,

    /// Upper bound on the number of signups
    pub max_participants: i32,

    pub created_at: DateTimeWithTimeZone,
}

// Signups reference activities by key; there is no back-reference here.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
