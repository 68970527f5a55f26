//! Request Handlers
//!
//! Thin wrappers around the game registry: extract and check required
//! fields, delegate to the core, serialize the updated game back out.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::registry::GameRegistry;
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;

/// Shared application state
pub struct AppState {
    pub registry: Arc<GameRegistry>,
}

/// Health check handler
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
    })
}

/// Create a new game lobby
/// POST /api/game/create
pub async fn create_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, ApiError> {
    let max_players = match request.max_players {
        Some(n @ 2..=4) => n as usize,
        _ => {
            return Err(ApiError::bad_request(
                request_id.0,
                "Number of players must be between 2 and 4",
            ))
        }
    };

    let game = state.registry.create_game(max_players);
    info!(code = %game.code, max_players, "Created game");

    Ok(Json(CreateGameResponse {
        game_id: game.code,
        max_players: game.max_players,
    }))
}

/// Join an existing lobby by code
/// POST /api/game/join
pub async fn join_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, ApiError> {
    let (game_id, player_name) = match (request.game_id, request.player_name) {
        (Some(g), Some(p)) => (g, p),
        _ => {
            return Err(ApiError::bad_request(
                request_id.0,
                "Game code and player name are required",
            ))
        }
    };

    let (game, player_id) = state
        .registry
        .join_game(&game_id, &player_name)
        .map_err(|e| ApiError::game(request_id.0, e))?;
    info!(code = %game.code, status = ?game.status, "Player joined");

    Ok(Json(JoinGameResponse {
        game_id: game.code.clone(),
        player_id,
        status: game.status,
        players: game.players.iter().map(PlayerView::from).collect(),
        max_players: game.max_players,
    }))
}

/// Poll current game state
/// GET /api/game/status?gameId={code}
pub async fn game_status_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<GameStateResponse>, ApiError> {
    let game_id = query
        .game_id
        .ok_or_else(|| ApiError::bad_request(request_id.0.clone(), "Game code is required"))?;

    let game = state
        .registry
        .get(&game_id)
        .ok_or_else(|| ApiError::not_found(request_id.0, "Game not found"))?;

    Ok(Json(GameStateResponse::from_game(&game)))
}

/// Submit a player's investment split
/// POST /api/game/submit
pub async fn submit_investment_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitInvestmentRequest>,
) -> Result<Json<GameStateResponse>, ApiError> {
    let (game_id, player_id, asset_a, asset_b) = match (
        request.game_id,
        request.player_id,
        request.asset_a,
        request.asset_b,
    ) {
        (Some(g), Some(p), Some(a), Some(b)) => (g, p, a, b),
        _ => {
            return Err(ApiError::bad_request(
                request_id.0,
                "All fields are required",
            ))
        }
    };

    let game = state
        .registry
        .submit_investment(&game_id, &player_id, asset_a, asset_b)
        .map_err(|e| ApiError::game(request_id.0, e))?;
    info!(code = %game.code, status = ?game.status, "Investment submitted");

    Ok(Json(GameStateResponse::from_game(&game)))
}
