//! Database seeding functionality
//!
//! This module provides functionality to seed the database with the initial
//! activity catalog when the application starts against an empty store.

pub mod activity;

pub use activity::{initial_activities, seed_activities_if_empty};
