//! # Activities API Handlers
//!
//! This module contains handlers for listing activities and for signing
//! students up for, or unregistering them from, an activity.

use crate::error::{ApiError, validation_error};
use crate::repositories::{ActivityRepository, ActivityWithParticipants};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    response::Json,
};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::{IntoParams, ToSchema};

/// Query parameters identifying the participant
#[derive(Debug, Deserialize, IntoParams)]
pub struct EmailQuery {
    /// Participant email address; leading and trailing whitespace is trimmed,
    /// so `" a@x.com "` and `"a@x.com"` name the same participant
    #[param(example = "michael@mergington.edu")]
    pub email: String,
}

/// Public view of one activity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ActivityDetails {
    #[schema(example = "Learn strategies and compete in chess tournaments")]
    pub description: Option<String>,
    #[schema(example = "Fridays, 3:30 PM - 5:00 PM")]
    pub schedule: Option<String>,
    #[schema(example = 12)]
    pub max_participants: i32,
    /// Emails of signed-up participants, in signup order
    pub participants: Vec<String>,
}

impl From<ActivityWithParticipants> for (String, ActivityDetails) {
    fn from(entry: ActivityWithParticipants) -> Self {
        let ActivityWithParticipants {
            activity,
            participants,
        } = entry;
        (
            activity.name,
            ActivityDetails {
                description: activity.description,
                schedule: activity.schedule,
                max_participants: activity.max_participants,
                participants,
            },
        )
    }
}

/// Activity name -> details, serialized as a JSON object in catalog order
#[derive(Debug)]
pub struct ActivityCatalog(Vec<(String, ActivityDetails)>);

impl Serialize for ActivityCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, details)| (name, details)))
    }
}

/// Outcome message for signup/unregister
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Signed up michael@mergington.edu for Chess Club")]
    pub message: String,
}

/// List all activities with their participants
#[utoipa::path(
    get,
    path = "/activities",
    responses(
        (status = 200, description = "Activity catalog keyed by name", body = std::collections::HashMap<String, ActivityDetails>),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn list_activities(
    State(state): State<AppState>,
) -> Result<Json<ActivityCatalog>, ApiError> {
    let repo = ActivityRepository::new(&state.db);
    let entries = repo.list_activities().await?;

    Ok(Json(ActivityCatalog(
        entries.into_iter().map(Into::into).collect(),
    )))
}

/// Sign a student up for an activity
#[utoipa::path(
    post,
    path = "/activities/{activity_name}/signup",
    params(
        ("activity_name" = String, Path, description = "Name of the activity"),
        EmailQuery
    ),
    responses(
        (status = 200, description = "Student signed up", body = MessageResponse),
        (status = 400, description = "Already signed up, activity full, or invalid email", body = ApiError),
        (status = 404, description = "Activity not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn signup_for_activity(
    State(state): State<AppState>,
    Path(activity_name): Path<String>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = participant_email(query)?;

    let repo = ActivityRepository::new(&state.db);
    repo.signup(&activity_name, &email).await?;

    Ok(Json(MessageResponse {
        message: format!("Signed up {} for {}", email, activity_name),
    }))
}

/// Unregister a student from an activity
#[utoipa::path(
    delete,
    path = "/activities/{activity_name}/unregister",
    params(
        ("activity_name" = String, Path, description = "Name of the activity"),
        EmailQuery
    ),
    responses(
        (status = 200, description = "Student unregistered", body = MessageResponse),
        (status = 400, description = "Student not signed up, or invalid email", body = ApiError),
        (status = 404, description = "Activity not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn unregister_from_activity(
    State(state): State<AppState>,
    Path(activity_name): Path<String>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = participant_email(query)?;

    let repo = ActivityRepository::new(&state.db);
    repo.unregister(&activity_name, &email).await?;

    Ok(Json(MessageResponse {
        message: format!("Unregistered {} from {}", email, activity_name),
    }))
}

fn participant_email(query: Result<Query<EmailQuery>, QueryRejection>) -> Result<String, ApiError> {
    let Query(EmailQuery { email }) = query?;
    let email = email.trim();
    if email.is_empty() {
        return Err(validation_error("email must not be empty"));
    }
    Ok(email.to_string())
}
