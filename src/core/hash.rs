//! State Hashing for Verification
//!
//! Provides deterministic hashing of track and session state for:
//! - Replay validation (same seed, same inputs, same digest)
//! - Regression checks on generation changes

use glam::Vec3;
use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Wraps SHA-256 with helpers for the simulation's value types.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for session state.
    pub fn for_session_state() -> Self {
        Self::new(b"LANE_RUNNER_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f32 by bit pattern.
    #[inline]
    pub fn update_f32(&mut self, value: f32) {
        self.hasher.update(value.to_bits().to_le_bytes());
    }

    /// Update with a Vec3.
    #[inline]
    pub fn update_vec3(&mut self, value: Vec3) {
        self.update_f32(value.x);
        self.update_f32(value.y);
        self.update_f32(value.z);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for a session.
///
/// The closure adds the state-specific data after the frame and seed.
pub fn compute_state_hash<F>(frame: u64, run_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_session_state();

    // Always hash frame and seed first
    hasher.update_u64(frame);
    hasher.update_u64(run_seed);

    add_state(&mut hasher);

    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_determinism() {
        let h1 = compute_state_hash(10, 42, |h| h.update_vec3(Vec3::new(1.0, 2.0, 3.0)));
        let h2 = compute_state_hash(10, 42, |h| h.update_vec3(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_sensitivity() {
        let h1 = compute_state_hash(10, 42, |h| h.update_f32(0.5));
        let h2 = compute_state_hash(10, 42, |h| h.update_f32(0.25));
        let h3 = compute_state_hash(11, 42, |h| h.update_f32(0.5));
        assert_ne!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_update_order_matters() {
        let mut a = StateHasher::for_session_state();
        a.update_bool(true);
        a.update_u32(3);

        let mut b = StateHasher::for_session_state();
        b.update_u32(3);
        b.update_bool(true);

        assert_ne!(a.finalize(), b.finalize());
    }
}
