//! `GET /health`: liveness only. Neither the database nor the timezone
//! registry is consulted, so a registry outage never fails the check.

use axum::{routing::get, Json, Router};
use serde::Serialize;

// ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Generic over the state so the gateway can merge it into any router.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
