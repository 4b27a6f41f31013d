//! Random sources for probabilistic combat rolls.
//!
//! All rolls go through [`RandomSource`] so that resolution is reproducible:
//! production fields use a seeded generator, tests script the draws.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Uniform `[0, 1)` draws shared by all combat rolls of a field.
pub trait RandomSource: Send + Sync {
    /// Returns the next draw in `[0, 1)`.
    fn next_f64(&self) -> f64;
}

/// Seeded generator backed by `fastrand`.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<fastrand::Rng>,
}

impl SeededRandom {
    /// Creates a generator with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    /// Creates a generator seeded from the thread-local generator.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(fastrand::u64(..))
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng.lock().f64()
    }
}

/// Always returns the same draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0
    }
}

/// Replays a script of draws, cycling when exhausted.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

impl SequenceRandom {
    /// Creates a scripted source. An empty script always yields 0.0.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.values[index % self.values.len()]
    }
}
