//! Injected sources of randomness and time. Engine operations never reach
//! for ambient globals, so a fixed source makes every dice roll and card
//! draw deterministic under test.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

/// Replaceable source of dice rolls and card picks.
pub trait RandomSource: Send {
    /// Two independent uniform dice in 1..=6.
    fn roll_dice(&mut self) -> (u8, u8);

    /// Uniform index in 0..n. `n` must be non-zero.
    fn pick(&mut self, n: usize) -> usize;
}

/// Production source backed by a xorshift generator.
pub struct XorshiftSource {
    rng: XorShiftRng,
}

impl XorshiftSource {
    pub fn from_entropy() -> Self {
        XorshiftSource {
            rng: XorShiftRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        XorshiftSource {
            rng: XorShiftRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for XorshiftSource {
    fn roll_dice(&mut self) -> (u8, u8) {
        (self.rng.gen_range(1..=6), self.rng.gen_range(1..=6))
    }

    fn pick(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }
}

/// Scripted source for deterministic tests: plays back queued rolls and
/// picks in order.
#[derive(Default)]
pub struct FixedSource {
    rolls: VecDeque<(u8, u8)>,
    picks: VecDeque<usize>,
}

impl FixedSource {
    pub fn with_rolls(rolls: &[(u8, u8)]) -> Self {
        FixedSource {
            rolls: rolls.iter().copied().collect(),
            picks: VecDeque::new(),
        }
    }

    pub fn with_picks(picks: &[usize]) -> Self {
        FixedSource {
            rolls: VecDeque::new(),
            picks: picks.iter().copied().collect(),
        }
    }

    pub fn queue_roll(&mut self, roll: (u8, u8)) {
        self.rolls.push_back(roll);
    }
}

impl RandomSource for FixedSource {
    fn roll_dice(&mut self) -> (u8, u8) {
        self.rolls.pop_front().unwrap_or((1, 2))
    }

    fn pick(&mut self, n: usize) -> usize {
        self.picks.pop_front().unwrap_or(0).min(n.saturating_sub(1))
    }
}

/// Replaceable source of "now" for history timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant, for tests.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
