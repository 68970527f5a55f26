//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Game lifecycle
        .route("/api/game/create", post(create_game_handler))
        .route("/api/game/join", post(join_game_handler))
        .route("/api/game/submit", post(submit_investment_handler))
        // Polling endpoint for the UI
        .route("/api/game/status", get(game_status_handler))
        // Attach shared state
        .with_state(state)
}
