//! Response scoring.
//!
//! The scorer is a stateless collaborator behind a narrow trait: a production
//! implementation would plug a real pronunciation/fluency evaluator in behind
//! the same signature. The rolling session score lives in the controller, not
//! here.

use crate::phrase::Phrase;
use anyhow::{Result, anyhow};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Mutex;

/// Evaluates a user response against the phrase being practiced.
///
/// Implementations must resolve with a score in `[0, 100]` or reject with an
/// error; the controller maps rejection to a zero score rather than aborting
/// the session.
#[cfg_attr(test, mockall::automock)]
pub trait ResponseScorer: Send + Sync {
    fn score(&self, phrase: &Phrase, response: &str) -> Result<u8>;
}

/// Placeholder scorer drawing uniformly from `[70, 100]`.
pub struct PlaceholderScorer {
    rng: Mutex<StdRng>,
}

impl PlaceholderScorer {
    pub fn new() -> Self {
        Self::seeded(rand::random())
    }

    /// Seeded constructor for deterministic tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for PlaceholderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseScorer for PlaceholderScorer {
    fn score(&self, _phrase: &Phrase, _response: &str) -> Result<u8> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("scorer random source poisoned"))?;
        Ok(rng.random_range(70..=100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase() -> Phrase {
        Phrase::new("Nice to meet you!", "¡Mucho gusto en conocerte!")
    }

    #[test]
    fn placeholder_scores_stay_in_range() {
        let scorer = PlaceholderScorer::seeded(3);
        for _ in 0..500 {
            let score = scorer.score(&phrase(), "nice to meet you").unwrap();
            assert!((70..=100).contains(&score), "score {score} out of range");
        }
    }

    #[test]
    fn seeded_scorer_is_deterministic() {
        let a = PlaceholderScorer::seeded(11);
        let b = PlaceholderScorer::seeded(11);
        for _ in 0..20 {
            assert_eq!(
                a.score(&phrase(), "x").unwrap(),
                b.score(&phrase(), "x").unwrap()
            );
        }
    }
}
