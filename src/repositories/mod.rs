//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for the activity catalog and its signups.

pub mod activity;

pub use activity::{ActivityRepository, ActivityWithParticipants, NewActivity};
