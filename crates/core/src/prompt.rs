//! Practice phrase selection.

use crate::phrase::Phrase;
use rand::Rng;

/// Hands out the next phrase to practice from a topic's pool.
///
/// Selection is uniform over the pool, except that the phrase returned by the
/// previous call is never repeated back-to-back when the pool has more than
/// one entry. The random source is injected so tests can seed it.
#[derive(Debug)]
pub struct PromptProvider<R: Rng> {
    pool: Vec<Phrase>,
    rng: R,
    last: Option<usize>,
}

impl<R: Rng> PromptProvider<R> {
    pub fn new(pool: Vec<Phrase>, rng: R) -> Self {
        Self {
            pool,
            rng,
            last: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// Returns the next phrase, or `None` for an empty pool.
    pub fn next(&mut self) -> Option<Phrase> {
        if self.pool.is_empty() {
            return None;
        }
        let index = if self.pool.len() == 1 {
            0
        } else {
            loop {
                let candidate = self.rng.random_range(0..self.pool.len());
                if self.last != Some(candidate) {
                    break candidate;
                }
            }
        };
        self.last = Some(index);
        Some(self.pool[index].clone())
    }
}
