//! # Server Configuration
//!
//! This module contains the router, startup initialization, and serve loop
//! for the Activities API.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers::{self, activities};
use crate::{db, seeds, telemetry};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/activities", get(activities::list_activities))
        .route(
            "/activities/{activity_name}/signup",
            post(activities::signup_for_activity),
        )
        .route(
            "/activities/{activity_name}/unregister",
            delete(activities::unregister_from_activity),
        )
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
}

/// Builds application state around an existing connection (used by tests)
pub fn create_test_app_state(config: AppConfig, db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(config),
        db,
    }
}

/// Prepares the store before serving: applies migrations, then seeds the
/// initial catalog when enabled and the store is empty.
pub async fn initialize(config: &AppConfig, db: &DatabaseConnection) -> Result<()> {
    db::run_migrations(db).await?;

    if config.seed_on_startup {
        let inserted = seeds::seed_activities_if_empty(db, &seeds::initial_activities())
            .await
            .context("Failed to seed initial activities")?;
        tracing::info!(inserted, "Activity catalog ready");
    } else {
        tracing::info!("Seeding disabled");
    }

    Ok(())
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> Result<()> {
    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid server address: {}", config.api_bind_addr))?;
    let profile = config.profile.clone();

    let state = AppState {
        config: Arc::new(config),
        db,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::activities::list_activities,
        crate::handlers::activities::signup_for_activity,
        crate::handlers::activities::unregister_from_activity,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::handlers::activities::ActivityDetails,
            crate::handlers::activities::MessageResponse,
            crate::error::ApiError,
        )
    ),
    info(
        title = "Mergington High School API",
        description = "API for viewing and signing up for extracurricular activities",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
