//! Error types for the commonpool game server.
//!
//! Every core failure is an expected, user-facing condition: a lookup miss,
//! a lifecycle precondition, or input validation. Nothing here is fatal.

use thiserror::Error;

/// Rule violations produced by the registry and the round state machine.
///
/// The display strings are the exact messages surfaced to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Game not found")]
    GameNotFound,

    #[error("Game has already started")]
    AlreadyStarted,

    #[error("Game is full")]
    GameFull,

    #[error("Player name is required")]
    NameRequired,

    #[error("Name must be 20 characters or less")]
    NameTooLong,

    #[error("A player with that name already exists")]
    DuplicateName,

    #[error("Game is not in playing state")]
    NotPlaying,

    #[error("Player not found")]
    PlayerNotFound,

    #[error("Already submitted")]
    AlreadySubmitted,

    #[error("Investments must be whole numbers")]
    NotWholeNumbers,

    #[error("Investments cannot be negative")]
    NegativeAmount,

    #[error("Total investment must equal $100")]
    InvalidTotal,
}

impl GameError {
    /// Whether this failure refers to a missing game or player, as opposed
    /// to a validation or lifecycle problem with an existing one.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GameError::GameNotFound | GameError::PlayerNotFound)
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}
