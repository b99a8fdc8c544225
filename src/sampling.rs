//! Random decision sources for the agent cycle.
//!
//! The agent never calls a global generator: it asks a [`DecisionSource`],
//! so production can sample from entropy while tests pin every outcome.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Bernoulli, Distribution};

/// Yes/no decisions with a given probability of yes.
pub trait DecisionSource: Send {
    fn decide(&mut self, probability: f64) -> bool;
}

/// Bernoulli draws from a seedable generator.
pub struct SampledDecisions {
    rng: StdRng,
}

impl SampledDecisions {
    /// Same seed, same sequence of decisions.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }
}

impl DecisionSource for SampledDecisions {
    fn decide(&mut self, probability: f64) -> bool {
        // Clamp to valid Bernoulli parameters; NaN counts as "never"
        let p = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        match Bernoulli::new(p) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => false,
        }
    }
}

/// Replays a fixed list of outcomes, then answers `fallback` forever.
/// Probabilities are ignored.
#[derive(Debug, Clone)]
pub struct ScriptedDecisions {
    outcomes: VecDeque<bool>,
    fallback: bool,
    draws: usize,
}

impl ScriptedDecisions {
    pub fn always(outcome: bool) -> Self {
        Self::sequence(Vec::new(), outcome)
    }

    pub fn sequence(outcomes: Vec<bool>, fallback: bool) -> Self {
        Self {
            outcomes: outcomes.into(),
            fallback,
            draws: 0,
        }
    }

    /// How many decisions have been asked for.
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl DecisionSource for ScriptedDecisions {
    fn decide(&mut self, _probability: f64) -> bool {
        self.draws += 1;
        self.outcomes.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sources_repeat() {
        let mut a = SampledDecisions::seeded(42);
        let mut b = SampledDecisions::seeded(42);
        let xs: Vec<bool> = (0..64).map(|_| a.decide(0.5)).collect();
        let ys: Vec<bool> = (0..64).map(|_| b.decide(0.5)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_sampled_rate_tracks_probability() {
        let mut source = SampledDecisions::seeded(7);
        let hits = (0..2000).filter(|_| source.decide(0.5)).count();
        assert!(hits > 850 && hits < 1150, "expected ~1000 hits, got {}", hits);
    }

    #[test]
    fn test_sampled_edge_probabilities() {
        let mut source = SampledDecisions::seeded(1);
        assert!((0..50).all(|_| source.decide(1.0)));
        assert!((0..50).all(|_| !source.decide(0.0)));
        assert!((0..50).all(|_| !source.decide(-3.0)));
        assert!((0..50).all(|_| source.decide(7.5)));
        assert!(!source.decide(f64::NAN));
    }

    #[test]
    fn test_scripted_sequence_then_fallback() {
        let mut source = ScriptedDecisions::sequence(vec![true, false], true);
        assert!(source.decide(0.0));
        assert!(!source.decide(1.0));
        assert!(source.decide(0.0));
        assert_eq!(source.draws(), 3);

        let mut never = ScriptedDecisions::always(false);
        assert!(!never.decide(1.0));
    }
}
