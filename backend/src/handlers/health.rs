//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// Health check that also pings the database
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let database = match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "up",
        Err(e) => {
            tracing::warn!("Health check database ping failed: {}", e);
            "down"
        }
    };

    Ok(Json(HealthResponse {
        status: "ok",
        database,
    }))
}
