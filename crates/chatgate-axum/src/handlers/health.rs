//! `GET /health` handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `"ok"` when the engine answers its health check, `"degraded"` otherwise.
    pub status: &'static str,
    pub engine: bool,
}

/// Report adapter liveness and engine reachability.
///
/// Always answers 200 while the adapter is up, so it doubles as a liveness
/// probe; readiness is in the `engine` field.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = match state.chat.engine().health().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Engine health check failed: {e}");
            false
        }
    };

    Json(HealthResponse {
        status: if engine { "ok" } else { "degraded" },
        engine,
    })
}
