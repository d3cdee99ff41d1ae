//! Frequency Gate
//!
//! A single Bernoulli trial against a configured probability. Every
//! spawn / no-spawn decision of the track generator goes through one.

use serde::{Serialize, Deserialize};

use super::rng::DeterministicRng;

/// Bernoulli trial with a fixed success probability in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyGate {
    probability: f32,
}

impl FrequencyGate {
    /// Never succeeds.
    pub const NEVER: Self = Self { probability: 0.0 };

    /// Always succeeds.
    pub const ALWAYS: Self = Self { probability: 1.0 };

    /// Coin flip.
    pub const EVEN: Self = Self { probability: 0.5 };

    /// Create a gate. The probability is clamped into [0, 1].
    pub fn new(probability: f32) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { probability }
    }

    /// Success probability.
    #[inline]
    pub fn probability(&self) -> f32 {
        self.probability
    }

    /// Run one trial.
    ///
    /// Always consumes exactly one draw so that decision sequences stay
    /// aligned regardless of the configured probability.
    #[inline]
    pub fn trial(&self, rng: &mut DeterministicRng) -> bool {
        rng.next_f32() < self.probability
    }
}

impl Default for FrequencyGate {
    fn default() -> Self {
        Self::NEVER
    }
}

impl From<f32> for FrequencyGate {
    fn from(probability: f32) -> Self {
        Self::new(probability)
    }
}
