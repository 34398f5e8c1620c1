//! Seeded random choice.
//!
//! All selection during a pass flows through one [`Chooser`] so that a
//! seed fully determines the rendered text. Named iteration counters
//! live here too, since sequence ids must be as reproducible as the
//! random draws.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic source of random draws and named counters.
pub struct Chooser {
    rng: ChaCha8Rng,
    seed: u64,
    iterators: HashMap<String, u64>,
    no_repeat: HashMap<String, u32>,
}

impl Chooser {
    /// Creates a chooser seeded for reproducible output.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            iterators: HashMap::new(),
            no_repeat: HashMap::new(),
        }
    }

    /// Creates a chooser seeded from OS entropy, recording the seed so
    /// the pass can still be replayed.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed this chooser's stream was built from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Restarts the random stream from a new seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = seed;
    }

    /// Returns a random number in `1..=highest`.
    pub fn number(&mut self, highest: u32) -> u32 {
        if highest <= 1 {
            return 1;
        }
        self.rng.gen_range(1..=highest)
    }

    /// Returns true with `odds` percent probability.
    pub fn percent(&mut self, odds: u8) -> bool {
        self.number(100) <= u32::from(odds)
    }

    /// Picks one item uniformly at random.
    pub fn one_of<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.number(u32::try_from(items.len()).unwrap_or(u32::MAX)) - 1;
        items.get(index as usize)
    }

    /// Picks one item using a throwaway entropy-seeded stream, leaving
    /// the deterministic stream untouched.
    pub fn one_of_pure<'a, T>(items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(rand::random());
        items.get(rng.gen_range(0..items.len()))
    }

    /// Increments and returns the named counter (first call returns 1).
    pub fn iter(&mut self, key: &str) -> u64 {
        let counter = self.iterators.entry(key.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Resets the named counter to zero.
    pub fn reset_iter(&mut self, key: &str) {
        if let Some(counter) = self.iterators.get_mut(key) {
            *counter = 0;
        }
    }

    /// Like [`number`](Self::number), but never returns the same value
    /// twice in a row for a given key.
    pub fn number_no_repeat(&mut self, key: &str, highest: u32) -> u32 {
        if highest <= 1 {
            return 1;
        }
        let num = match self.no_repeat.get(key) {
            None => self.number(highest),
            Some(&last) => {
                let mut num = self.number(highest - 1);
                if num >= last {
                    num += 1;
                }
                num
            }
        };
        self.no_repeat.insert(key.to_string(), num);
        num
    }
}
