//! API Request and Response Models
//!
//! The wire format uses camelCase keys, matching the polling UI. Request
//! fields are `Option`s so missing-field errors surface with the game's own
//! messages instead of a generic deserialization failure.

use serde::{Deserialize, Serialize};

use crate::game::{Game, GameStatus, PayoutResult, Player};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// POST /api/game/create request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub max_players: Option<u64>,
}

/// POST /api/game/create response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub game_id: String,
    pub max_players: usize,
}

/// POST /api/game/join request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    pub game_id: Option<String>,
    pub player_name: Option<String>,
}

/// POST /api/game/join response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameResponse {
    pub game_id: String,
    pub player_id: String,
    pub status: GameStatus,
    pub players: Vec<PlayerView>,
    pub max_players: usize,
}

/// GET /api/game/status query parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub game_id: Option<String>,
}

/// POST /api/game/submit request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInvestmentRequest {
    pub game_id: Option<String>,
    pub player_id: Option<String>,
    /// Raw JSON number; integrality is a game rule, not a type constraint.
    pub asset_a: Option<f64>,
    pub asset_b: Option<f64>,
}

/// Shared game-state payload for status and submit responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateResponse {
    pub game_id: String,
    pub status: GameStatus,
    pub max_players: usize,
    pub players: Vec<PlayerView>,
    pub results: Option<Vec<PayoutResult>>,
}

impl GameStateResponse {
    pub fn from_game(game: &Game) -> Self {
        Self {
            game_id: game.code.clone(),
            status: game.status,
            max_players: game.max_players,
            players: game.players.iter().map(PlayerView::from).collect(),
            results: game.results.clone(),
        }
    }
}

/// Public view of a player: name and submission flag only. Ids and raw
/// amounts never leave the server before the round finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub submitted: bool,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            submitted: player.submitted,
        }
    }
}
