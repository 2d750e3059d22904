//! Injectable randomness for reconnect jitter

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Supplies uniformly distributed draws for the backoff scheduler
pub trait JitterSource {
    /// A draw from `[low, high)`
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Jitter backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RandJitter {
    rng: StdRng,
}

impl RandJitter {
    /// Seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sequence for simulations
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandJitter {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl JitterSource for RandJitter {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..high)
    }
}

/// Largest fraction a script can yield; keeps draws below `high`
const MAX_FRACTION: f64 = 1.0 - f64::EPSILON;

/// Replays fixed unit fractions, scaled into the requested range.
///
/// Each queued value `f` in `[0, 1)` yields `low + f * (high - low)`. Once the
/// script runs dry every draw returns `low`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedJitter {
    fractions: VecDeque<f64>,
}

impl ScriptedJitter {
    pub fn new<I: IntoIterator<Item = f64>>(fractions: I) -> Self {
        Self {
            fractions: fractions.into_iter().collect(),
        }
    }

    /// Always draw the lower bound
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fraction: f64) {
        self.fractions.push_back(fraction);
    }

    pub fn remaining(&self) -> usize {
        self.fractions.len()
    }
}

impl JitterSource for ScriptedJitter {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        let fraction = self
            .fractions
            .pop_front()
            .unwrap_or(0.0)
            .clamp(0.0, MAX_FRACTION);
        low + fraction * (high - low)
    }
}

impl<J: JitterSource + ?Sized> JitterSource for Box<J> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (**self).uniform(low, high)
    }
}
