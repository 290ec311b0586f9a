//! Liveness endpoint

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::AppState;

/// GET /health - Service is up and the ledger lock is reachable
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state
        .read(|token| {
            HealthResponse::ok(
                token.policy().version,
                token.launch().launched,
                token.is_distributing(),
            )
        })
        .await;
    Json(health)
}
