//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Activities API.

pub mod activities;

use crate::db;
use crate::error::{ApiError, ErrorType};
use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::{extract::State, response::Json, response::Redirect};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Location of the signup board's single-page frontend
pub const INDEX_PATH: &str = "/static/index.html";

/// Health probe response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[serde(flatten)]
    pub info: ServiceInfo,
}

/// Root handler redirecting to the static frontend
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 307, description = "Redirect to the static index page")
    ),
    tag = "root"
)]
pub async fn root() -> Redirect {
    Redirect::temporary(INDEX_PATH)
}

/// Liveness/readiness probe that also checks the database
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are healthy", body = HealthResponse),
        (status = 503, description = "Database unavailable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    if let Err(err) = db::health_check(&state.db).await {
        tracing::warn!(error = %err, "Health check failed");
        return Err(ErrorType::ServiceUnavailable.into());
    }

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        info: ServiceInfo::default(),
    }))
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ErrorType::NotFound.into()
}
