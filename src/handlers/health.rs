//! Health check handler

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// Public health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    /// Status indicator (always "ok")
    pub status: String,
    /// `connected` or `unreachable`
    pub database: String,
}

/// GET /api/health
///
/// Reports that the process is up and whether the database answers.
/// Does not require authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            "unreachable"
        }
    };

    Json(HealthCheckResponse {
        status: "ok".to_string(),
        database: database.to_string(),
    })
}
