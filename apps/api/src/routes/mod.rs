pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::scoring::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/score", post(handlers::handle_score_batch))
        .route("/api/v1/taxonomy", get(handlers::handle_get_taxonomy))
        .route("/puanla-toplu/", post(handlers::handle_score_batch_legacy))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
