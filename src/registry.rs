//! Process-wide registry of game sessions.
//!
//! Owns the code -> game mapping, lobby code generation, and age-based
//! eviction. Join and submit go through the registry so each mutation runs
//! under the map entry's write guard, keeping the state transitions atomic
//! per game even across OS threads.

use chrono::{DateTime, Duration, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::errors::GameError;
use crate::game::Game;

/// Lobby code alphabet: unambiguous characters only (no I, O, 0, 1).
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Lobby code length. 32^5 values makes collisions rare; the generation
/// loop retries on the few that occur.
pub const CODE_LENGTH: usize = 5;

/// Eviction policy, injected at construction so tests can drive sweeps
/// deterministically instead of waiting on wall-clock timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Games older than this are removed by the sweep, regardless of status.
    pub max_age_secs: u64,
    /// How often the background sweeper runs.
    pub sweep_interval_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            max_age_secs: 3600,
            sweep_interval_secs: 1800,
        }
    }
}

/// Concurrent, in-memory store of all live games.
pub struct GameRegistry {
    games: DashMap<String, Game>,
    rng: Mutex<StdRng>,
    settings: RegistrySettings,
}

impl GameRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Construct with a caller-provided RNG for deterministic code
    /// generation in tests.
    pub fn with_rng(settings: RegistrySettings, rng: StdRng) -> Self {
        Self {
            games: DashMap::new(),
            rng: Mutex::new(rng),
            settings,
        }
    }

    /// Create a new waiting game under a freshly generated unique code.
    ///
    /// Capacity is constrained to 2..=4 by the HTTP layer; the registry
    /// does not re-validate it. Uniqueness check and insert happen through
    /// the entry API, so a code can never be claimed twice.
    pub fn create_game(&self, max_players: usize) -> Game {
        loop {
            let code = self.generate_code();
            match self.games.entry(code.clone()) {
                Entry::Occupied(_) => {
                    debug!(code = %code, "Lobby code collision, retrying");
                }
                Entry::Vacant(slot) => {
                    let game = Game::new(code, max_players);
                    slot.insert(game.clone());
                    return game;
                }
            }
        }
    }

    /// Case-insensitive lookup, returning a snapshot of the game.
    pub fn get(&self, code: &str) -> Option<Game> {
        self.games.get(&code.to_uppercase()).map(|g| g.clone())
    }

    /// Admit a player to a waiting game. Returns a snapshot of the updated
    /// game and the new player's id.
    pub fn join_game(&self, code: &str, name: &str) -> Result<(Game, String), GameError> {
        let mut entry = self
            .games
            .get_mut(&code.to_uppercase())
            .ok_or(GameError::GameNotFound)?;
        let player_id = entry.join(name)?;
        Ok((entry.clone(), player_id))
    }

    /// Record a player's investment split. Returns a snapshot of the
    /// updated game, with results attached if this submission finished it.
    pub fn submit_investment(
        &self,
        code: &str,
        player_id: &str,
        asset_a: f64,
        asset_b: f64,
    ) -> Result<Game, GameError> {
        let mut entry = self
            .games
            .get_mut(&code.to_uppercase())
            .ok_or(GameError::GameNotFound)?;
        entry.submit(player_id, asset_a, asset_b)?;
        Ok(entry.clone())
    }

    /// Remove every game whose age at `now` has reached `max_age`,
    /// regardless of status. Abandonment is only ever implicit: a game
    /// mid-round is evicted like any other, and later lookups simply
    /// report not found.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::seconds(self.settings.max_age_secs as i64);
        let before = self.games.len();
        self.games.retain(|_, game| game.created_at > cutoff);
        let evicted = before - self.games.len();
        if evicted > 0 {
            info!(evicted, remaining = self.games.len(), "Evicted expired games");
        }
        evicted
    }

    /// Number of live games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Spawn the periodic eviction sweep. The caller owns the handle and
    /// aborts it on shutdown.
    pub fn spawn_sweeper(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = self;
        let period = std::time::Duration::from_secs(registry.settings.sweep_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; skip it so the sweep
            // runs one full interval after startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.evict_expired(Utc::now());
            }
        })
    }

    fn generate_code(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameStatus;

    fn registry() -> GameRegistry {
        GameRegistry::new(RegistrySettings::default())
    }

    #[test]
    fn test_created_codes_are_distinct() {
        let registry = registry();
        let mut codes = std::collections::HashSet::new();
        for _ in 0..200 {
            let game = registry.create_game(2);
            assert_eq!(game.code.len(), CODE_LENGTH);
            assert!(game
                .code
                .bytes()
                .all(|b| CODE_ALPHABET.contains(&b)));
            assert!(codes.insert(game.code));
        }
        assert_eq!(registry.len(), 200);
    }

    #[test]
    fn test_code_collision_retries() {
        // Two registries seeded identically draw the same first code. By
        // pre-creating a game in one and replaying its map into the other,
        // the second create must retry past the collision.
        let settings = RegistrySettings::default();
        let probe = GameRegistry::with_rng(settings.clone(), StdRng::seed_from_u64(7));
        let first_code = probe.create_game(2).code;

        let registry = GameRegistry::with_rng(settings, StdRng::seed_from_u64(7));
        registry
            .games
            .insert(first_code.clone(), Game::new(first_code.clone(), 2));
        let game = registry.create_game(2);
        assert_ne!(game.code, first_code);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = registry();
        let game = registry.create_game(3);
        let found = registry.get(&game.code.to_lowercase()).unwrap();
        assert_eq!(found.code, game.code);
        assert!(registry.get("ZZZZZ").is_none());
    }

    #[test]
    fn test_join_and_submit_through_registry() {
        let registry = registry();
        let game = registry.create_game(2);

        let (_, alice) = registry.join_game(&game.code, "alice").unwrap();
        let (updated, bob) = registry.join_game(&game.code.to_lowercase(), "bob").unwrap();
        assert_eq!(updated.status, GameStatus::Playing);

        assert_eq!(
            registry.join_game("NOPES", "carol").unwrap_err(),
            GameError::GameNotFound
        );

        registry
            .submit_investment(&game.code, &alice, 50.0, 50.0)
            .unwrap();
        let finished = registry
            .submit_investment(&game.code, &bob, 70.0, 30.0)
            .unwrap();
        assert_eq!(finished.status, GameStatus::Finished);
        assert_eq!(finished.results.unwrap().len(), 2);
    }

    #[test]
    fn test_eviction_is_age_based_and_unconditional() {
        let registry = GameRegistry::new(RegistrySettings {
            max_age_secs: 3600,
            sweep_interval_secs: 1800,
        });
        let fresh = registry.create_game(2);
        let stale = registry.create_game(2);
        // Backdate one game past the cutoff; it is mid-lobby but still goes.
        registry
            .games
            .get_mut(&stale.code)
            .unwrap()
            .created_at = Utc::now() - Duration::seconds(3601);

        let evicted = registry.evict_expired(Utc::now());
        assert_eq!(evicted, 1);
        assert!(registry.get(&stale.code).is_none());
        assert!(registry.get(&fresh.code).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_evicts() {
        let registry = Arc::new(GameRegistry::new(RegistrySettings {
            max_age_secs: 3600,
            sweep_interval_secs: 1,
        }));
        let game = registry.create_game(2);
        registry
            .games
            .get_mut(&game.code)
            .unwrap()
            .created_at = Utc::now() - Duration::seconds(7200);

        let handle = Arc::clone(&registry).spawn_sweeper();
        // Paused time auto-advances past the first real sweep tick.
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        assert!(registry.is_empty());
        handle.abort();
    }

    #[test]
    fn test_eviction_boundary() {
        let registry = registry();
        let game = registry.create_game(2);
        let created = registry.get(&game.code).unwrap().created_at;

        // Just under max_age: survives.
        assert_eq!(
            registry.evict_expired(created + Duration::seconds(3599)),
            0
        );
        // Exactly max_age: evicted.
        assert_eq!(
            registry.evict_expired(created + Duration::seconds(3600)),
            1
        );
        assert!(registry.is_empty());
    }
}
