//! Core primitives.
//!
//! Deterministic randomness, the frequency gate, hashing, and the
//! single-threaded plumbing (observers, cooperative scheduler) that the
//! game modules are built on.

pub mod rng;
pub mod gate;
pub mod hash;
pub mod observer;
pub mod scheduler;

// Re-export core types
pub use rng::DeterministicRng;
pub use gate::FrequencyGate;
pub use hash::{compute_state_hash, StateHash, StateHasher};
pub use observer::{Observers, SubscriptionId};
pub use scheduler::{Scheduler, TaskId};
