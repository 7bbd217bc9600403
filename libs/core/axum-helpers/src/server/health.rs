use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Source of truth for whether the process is taking new work.
///
/// Implemented by the application's lifecycle coordinator.
pub trait Readiness: Clone + Send + Sync + 'static {
    /// Current lifecycle state name, e.g. `"running"`.
    fn state(&self) -> String;

    /// Whether new requests should be accepted.
    fn is_accepting(&self) -> bool;
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `"ok"` while accepting, `"unavailable"` otherwise
    pub status: String,
    pub state: String,
}

async fn health_handler<R: Readiness>(State(readiness): State<R>) -> impl IntoResponse {
    let state = readiness.state();
    if readiness.is_accepting() {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                state,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
                state,
            }),
        )
    }
}

/// `GET /health`, answering 200 while `readiness` accepts work and 503 after.
pub fn health_router<R: Readiness>(readiness: R) -> Router {
    Router::new()
        .route("/health", get(health_handler::<R>))
        .with_state(readiness)
}
