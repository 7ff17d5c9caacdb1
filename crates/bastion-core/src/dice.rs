//! Deterministic dice.
//!
//! Every roll is derived from the configured seed and the number of rolls
//! made so far, so a game replayed from the same checkpoint rolls the same
//! numbers. The roll counter is part of the persisted phase state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A seeded dice roller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    seed: u64,
    rolls: u64,
}

impl Dice {
    /// Create a roller with no rolls made.
    pub const fn new(seed: u64) -> Self {
        Self { seed, rolls: 0 }
    }

    /// The number of dice rolled so far.
    pub const fn rolls(&self) -> u64 {
        self.rolls
    }

    /// Roll one die with `sides` sides, returning a value in `1..=sides`.
    pub fn roll(&mut self, sides: u32) -> u32 {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.rolls));
        self.rolls = self.rolls.saturating_add(1);
        rng.random_range(1..=sides.max(1))
    }

    /// Roll `count` dice.
    pub fn roll_many(&mut self, count: usize, sides: u32) -> Vec<u32> {
        (0..count).map(|_| self.roll(sides)).collect()
    }
}
