//! Game session types and the round state machine.
//!
//! A game moves strictly forward through `Waiting -> Playing -> Finished`.
//! The capacity-th join flips it to `Playing` and the last submission flips
//! it to `Finished`, each within the same operation as the triggering
//! mutation, so no intermediate state is ever observable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::GameError;

/// Maximum display name length in characters.
pub const MAX_NAME_LEN: usize = 20;

/// Every player allocates exactly this budget between the two assets.
pub const TOTAL_BUDGET: u32 = 100;

/// The pooled asset grows by 50% before being split equally.
const POOL_GROWTH: f64 = 1.5;

/// Lifecycle status of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

/// One joined identity within a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Opaque id, unique within the game only.
    pub id: String,
    pub name: String,
    /// Riskless allocation; set on submission.
    pub asset_a: Option<u32>,
    /// Pooled allocation; set on submission.
    pub asset_b: Option<u32>,
    pub submitted: bool,
}

/// Per-player payout line, computed once when the game finishes and never
/// recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutResult {
    pub player_name: String,
    pub asset_a: u32,
    pub asset_b: u32,
    pub asset_b_payout: f64,
    pub total_payout: f64,
}

/// One independent play-through, keyed by a short lobby code.
#[derive(Debug, Clone)]
pub struct Game {
    pub code: String,
    /// Join order; serialized views preserve this order verbatim.
    pub players: Vec<Player>,
    pub max_players: usize,
    pub status: GameStatus,
    /// Some if and only if `status == Finished`.
    pub results: Option<Vec<PayoutResult>>,
    pub created_at: DateTime<Utc>,
}

impl Game {
    /// Create an empty game in the `Waiting` state.
    ///
    /// Capacity is validated by the HTTP layer; the core trusts it to be in
    /// the 2..=4 range.
    pub fn new(code: String, max_players: usize) -> Self {
        Self {
            code,
            players: Vec::with_capacity(max_players),
            max_players,
            status: GameStatus::Waiting,
            results: None,
            created_at: Utc::now(),
        }
    }

    /// Admit a player, returning the new player's id.
    ///
    /// Preconditions are checked in order: the game must be waiting, below
    /// capacity, the trimmed name non-empty, at most 20 characters, and not
    /// a case-insensitive duplicate. The join that reaches capacity flips
    /// the status to `Playing`.
    pub fn join(&mut self, name: &str) -> Result<String, GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() >= self.max_players {
            return Err(GameError::GameFull);
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::NameRequired);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(GameError::NameTooLong);
        }
        let lowered = name.to_lowercase();
        if self.players.iter().any(|p| p.name.to_lowercase() == lowered) {
            return Err(GameError::DuplicateName);
        }

        let player_id = Uuid::new_v4().simple().to_string();
        self.players.push(Player {
            id: player_id.clone(),
            name: name.to_string(),
            asset_a: None,
            asset_b: None,
            submitted: false,
        });

        if self.players.len() == self.max_players {
            self.status = GameStatus::Playing;
        }

        Ok(player_id)
    }

    /// Record a player's investment split.
    ///
    /// Amounts arrive as raw JSON numbers, so integrality is validated here
    /// rather than at the type level. Validation happens before any write;
    /// a rejected submission leaves the player untouched. The submission
    /// that completes the round computes and attaches results in the same
    /// operation.
    pub fn submit(&mut self, player_id: &str, asset_a: f64, asset_b: f64) -> Result<(), GameError> {
        if self.status != GameStatus::Playing {
            return Err(GameError::NotPlaying);
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        if self.players[idx].submitted {
            return Err(GameError::AlreadySubmitted);
        }

        // NaN and infinity fail the fract check as well.
        if asset_a.fract() != 0.0 || asset_b.fract() != 0.0 {
            return Err(GameError::NotWholeNumbers);
        }
        if asset_a < 0.0 || asset_b < 0.0 {
            return Err(GameError::NegativeAmount);
        }
        if asset_a + asset_b != f64::from(TOTAL_BUDGET) {
            return Err(GameError::InvalidTotal);
        }

        let player = &mut self.players[idx];
        player.asset_a = Some(asset_a as u32);
        player.asset_b = Some(asset_b as u32);
        player.submitted = true;

        if self.players.iter().all(|p| p.submitted) {
            self.status = GameStatus::Finished;
            self.results = Some(self.calculate_results());
        }

        Ok(())
    }

    /// Compute payouts for a fully submitted game.
    ///
    /// The pooled asset is summed, grown by 50%, and split equally. The
    /// shared payout is rounded once and reused for every player, so it is
    /// identical across the game by construction.
    fn calculate_results(&self) -> Vec<PayoutResult> {
        let pool: u32 = self.players.iter().filter_map(|p| p.asset_b).sum();
        let grown = f64::from(pool) * POOL_GROWTH;
        let share = grown / self.players.len() as f64;

        self.players
            .iter()
            .map(|p| {
                let asset_a = p.asset_a.unwrap_or(0);
                PayoutResult {
                    player_name: p.name.clone(),
                    asset_a,
                    asset_b: p.asset_b.unwrap_or(0),
                    asset_b_payout: round2(share),
                    total_payout: round2(f64::from(asset_a) + share),
                }
            })
            .collect()
    }
}

/// Round half away from zero to two decimal places. Inputs are always
/// non-negative here, so this matches round-half-up on the decimal
/// representation.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_game(max_players: usize) -> (Game, Vec<String>) {
        let mut game = Game::new("TESTS".to_string(), max_players);
        let ids = (0..max_players)
            .map(|i| game.join(&format!("player{}", i)).unwrap())
            .collect();
        (game, ids)
    }

    #[test]
    fn test_new_game_is_waiting_and_empty() {
        let game = Game::new("ABCDE".to_string(), 3);
        assert_eq!(game.status, GameStatus::Waiting);
        assert!(game.players.is_empty());
        assert!(game.results.is_none());
    }

    #[test]
    fn test_join_preserves_order_and_trims() {
        let mut game = Game::new("ABCDE".to_string(), 4);
        game.join("  alice  ").unwrap();
        game.join("bob").unwrap();
        assert_eq!(game.players[0].name, "alice");
        assert_eq!(game.players[1].name, "bob");
        assert_eq!(game.status, GameStatus::Waiting);
    }

    #[test]
    fn test_capacity_join_flips_to_playing() {
        let mut game = Game::new("ABCDE".to_string(), 4);
        for i in 0..3 {
            game.join(&format!("p{}", i)).unwrap();
            assert_eq!(game.status, GameStatus::Waiting);
        }
        game.join("p3").unwrap();
        assert_eq!(game.status, GameStatus::Playing);
    }

    #[test]
    fn test_join_after_start_rejected() {
        let (mut game, _) = full_game(2);
        assert_eq!(game.join("late"), Err(GameError::AlreadyStarted));
        assert_eq!(game.players.len(), 2);
    }

    #[test]
    fn test_join_name_validation() {
        let mut game = Game::new("ABCDE".to_string(), 4);
        assert_eq!(game.join("   "), Err(GameError::NameRequired));
        assert_eq!(
            game.join("this name is way over twenty characters"),
            Err(GameError::NameTooLong)
        );
        game.join("Alice").unwrap();
        assert_eq!(game.join("alice"), Err(GameError::DuplicateName));
        assert_eq!(game.join("ALICE  "), Err(GameError::DuplicateName));
        // Failed joins must not mutate.
        assert_eq!(game.players.len(), 1);
    }

    #[test]
    fn test_player_ids_are_unique() {
        let (game, ids) = full_game(4);
        assert_eq!(game.players.len(), 4);
        for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_submit_requires_playing_state() {
        let mut game = Game::new("ABCDE".to_string(), 3);
        let id = game.join("alice").unwrap();
        assert_eq!(game.submit(&id, 50.0, 50.0), Err(GameError::NotPlaying));
    }

    #[test]
    fn test_submit_validation_matrix() {
        let (mut game, ids) = full_game(2);
        let id = &ids[0];

        assert_eq!(
            game.submit("nonexistent", 50.0, 50.0),
            Err(GameError::PlayerNotFound)
        );
        assert_eq!(
            game.submit(id, 50.5, 49.5),
            Err(GameError::NotWholeNumbers)
        );
        assert_eq!(
            game.submit(id, -10.0, 110.0),
            Err(GameError::NegativeAmount)
        );
        assert_eq!(game.submit(id, 40.0, 50.0), Err(GameError::InvalidTotal));
        assert_eq!(
            game.submit(id, f64::NAN, 50.0),
            Err(GameError::NotWholeNumbers)
        );

        // All rejections left the player untouched.
        assert!(!game.players[0].submitted);
        assert!(game.players[0].asset_a.is_none());

        game.submit(id, 60.0, 40.0).unwrap();
        assert!(game.players[0].submitted);
        assert_eq!(game.submit(id, 60.0, 40.0), Err(GameError::AlreadySubmitted));
    }

    #[test]
    fn test_boundary_allocations_accepted() {
        let (mut game, ids) = full_game(2);
        game.submit(&ids[0], 0.0, 100.0).unwrap();
        game.submit(&ids[1], 100.0, 0.0).unwrap();
        assert_eq!(game.status, GameStatus::Finished);
    }

    #[test]
    fn test_last_submission_finishes_and_attaches_results() {
        let (mut game, ids) = full_game(2);
        game.submit(&ids[0], 50.0, 50.0).unwrap();
        assert_eq!(game.status, GameStatus::Playing);
        assert!(game.results.is_none());

        game.submit(&ids[1], 70.0, 30.0).unwrap();
        assert_eq!(game.status, GameStatus::Finished);
        let results = game.results.as_ref().unwrap();
        assert_eq!(results.len(), 2);

        // Pool = 80, grown = 120, share = 60 per player.
        assert_eq!(results[0].player_name, "player0");
        assert_eq!(results[0].asset_b_payout, 60.0);
        assert_eq!(results[0].total_payout, 110.0);
        assert_eq!(results[1].asset_b_payout, 60.0);
        assert_eq!(results[1].total_payout, 130.0);

        // No resubmission after completion.
        assert_eq!(game.submit(&ids[0], 50.0, 50.0), Err(GameError::NotPlaying));
    }

    #[test]
    fn test_payout_law_within_rounding_tolerance() {
        let allocations: [&[u32]; 4] = [
            &[0, 100],
            &[33, 67, 1],
            &[10, 20, 30, 40],
            &[99, 1, 50],
        ];
        for assets_b in allocations {
            let n = assets_b.len();
            let (mut game, ids) = full_game(n);
            for (id, b) in ids.iter().zip(assets_b) {
                game.submit(id, f64::from(TOTAL_BUDGET - b), f64::from(*b))
                    .unwrap();
            }
            let results = game.results.as_ref().unwrap();

            let payout_sum: f64 = results.iter().map(|r| r.asset_b_payout).sum();
            let pool: u32 = assets_b.iter().sum();
            let expected = f64::from(pool) * 1.5;
            assert!(
                (payout_sum - expected).abs() <= n as f64 * 0.005,
                "sum {} vs expected {}",
                payout_sum,
                expected
            );

            let first = results[0].asset_b_payout;
            assert!(results.iter().all(|r| r.asset_b_payout == first));
        }
    }

    #[test]
    fn test_shared_payout_rounded_once() {
        // Pool = 100, grown = 150, share = 50 each across 3 players: the
        // displayed per-player payout is exactly 50.00 here, but with an
        // uneven pool the single rounding shows through.
        let (mut game, ids) = full_game(3);
        game.submit(&ids[0], 99.0, 1.0).unwrap();
        game.submit(&ids[1], 99.0, 1.0).unwrap();
        game.submit(&ids[2], 100.0, 0.0).unwrap();
        // Pool = 2, grown = 3, share = 1.0 -> rounds to 1.0 for everyone.
        let results = game.results.as_ref().unwrap();
        assert!(results.iter().all(|r| r.asset_b_payout == 1.0));
        assert_eq!(results[2].total_payout, 101.0);
    }

    #[test]
    fn test_round2_half_up() {
        // 0.125 is exact in binary, so the half-up behavior is observable.
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(60.0), 60.0);
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
    }
}
