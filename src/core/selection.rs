//! Selection policies for randomized placement and staffing decisions.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks one index out of `len` candidates.
///
/// Used for the routine bed category and for physician/resident rosters.
/// Implementations must return a value in `0..len` whenever `len > 0`.
pub trait SelectionPolicy: Send + Sync {
    /// Choose an index in `0..len`.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform random selection backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelection;

impl SelectionPolicy for RandomSelection {
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        rand::rng().random_range(0..len)
    }
}

/// Reproducible uniform selection from a seeded generator.
#[derive(Debug)]
pub struct SeededSelection {
    rng: Mutex<StdRng>,
}

impl SeededSelection {
    /// Create a selection policy seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl SelectionPolicy for SeededSelection {
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.lock().random_range(0..len)
    }
}

/// Always picks the first candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstSelection;

impl SelectionPolicy for FirstSelection {
    fn pick(&self, _len: usize) -> usize {
        0
    }
}

/// Cycles through candidates in order.
#[derive(Debug, Default)]
pub struct RoundRobinSelection {
    next: AtomicUsize,
}

impl SelectionPolicy for RoundRobinSelection {
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.next.fetch_add(1, Ordering::Relaxed) % len
    }
}
