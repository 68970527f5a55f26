//! Commonpool - Multiplayer Pooled-Investment Game Server
//!
//! Players join a lobby by short code and split a $100 budget between a
//! riskless personal asset and a pooled asset. Once everyone submits, the
//! pool grows by 50% and is divided equally. All state lives in memory for
//! the process lifetime; abandoned games are swept by age.

pub mod api;
pub mod config;
pub mod errors;
pub mod game;
pub mod registry;

pub use config::CommonpoolConfig;
pub use errors::GameError;
pub use game::{Game, GameStatus, PayoutResult, Player};
pub use registry::{GameRegistry, RegistrySettings};
