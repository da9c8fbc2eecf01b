//! HTTP gateway (Axum): request validation, the `/recommend` route, and
//! the advisory `/health` surface.
//!
//! This module is primarily used by the `screenrank` server binary.

pub mod error;
pub mod handler;
pub mod state;
pub mod validate;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{RecommendResponse, recommend_handler};
pub use state::HandlerState;
pub use validate::ValidationError;

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/recommend", post(recommend_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness body: advisory only, identifies the active embedding model.
#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: &'static str,
    pub mode: &'static str,
}

#[tracing::instrument(skip(state))]
pub async fn health_handler(State(state): State<HandlerState>) -> Json<HealthResponse> {
    let mode = if state.embedder().is_stub() {
        "stub"
    } else {
        "real"
    };

    Json(HealthResponse {
        status: "healthy",
        model: state.embedder().model_name(),
        mode,
    })
}
