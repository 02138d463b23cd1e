//! The bot opponent: uniform random choice over the legal moves.

use crate::board::MoveSpec;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

/// Picks a legal move uniformly at random. No evaluation, no search.
#[derive(Debug, Clone)]
pub struct RandomBot {
    rng: StdRng,
}

impl RandomBot {
    /// Creates a bot seeded from the operating system.
    #[instrument]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a bot with a fixed seed, for reproducible games.
    #[instrument]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Chooses one of `moves`, or `None` if there are none.
    #[instrument(skip(self, moves), fields(candidates = moves.len()))]
    pub fn choose(&mut self, moves: &[MoveSpec]) -> Option<MoveSpec> {
        if moves.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..moves.len());
        let chosen = moves[index];
        debug!(index, mv = %chosen, "Bot chose move");
        Some(chosen)
    }
}

impl Default for RandomBot {
    fn default() -> Self {
        Self::from_entropy()
    }
}
