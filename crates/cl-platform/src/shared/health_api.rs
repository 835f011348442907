//! Health Check Endpoints
//!
//! - /health - Process is up
//! - /ready - Datastore answers a ping

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::movie_list::repository::MovieListRepository;

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// Process is running
    Up,
    /// Dependencies are reachable
    Ready,
    /// A dependency is unreachable
    Down,
}

/// Health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Health service state
#[derive(Clone)]
pub struct HealthState {
    pub repo: Arc<dyn MovieListRepository>,
    pub version: Option<String>,
}

impl HealthState {
    pub fn new(repo: Arc<dyn MovieListRepository>, version: impl Into<String>) -> Self {
        Self {
            repo,
            version: Some(version.into()),
        }
    }
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Up,
        version: state.version.clone(),
    })
}

/// Readiness probe
///
/// Returns 503 while the datastore cannot be reached.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Datastore unreachable", body = HealthResponse)
    )
)]
pub async fn get_readiness(State(state): State<HealthState>) -> Response {
    let (status_code, status) = match state.repo.ping().await {
        Ok(()) => (StatusCode::OK, HealthStatus::Ready),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Down)
        }
    };

    (status_code, Json(HealthResponse { status, version: None })).into_response()
}

/// Create the health router
pub fn health_router(state: HealthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_health))
        .routes(routes!(get_readiness))
        .with_state(state)
}
