//! # Mergington Activities API Library
//!
//! This library provides the core functionality for the extracurricular
//! activities signup board: the activity/signup store, HTTP handlers, and
//! server configuration.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub use migration;
