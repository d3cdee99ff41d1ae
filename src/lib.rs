//! # Lane Runner Core
//!
//! Runtime core of an endless lane-runner: the player slides forward on
//! their own and steers to dodge rocks and collect gifts until a crash
//! ends the run.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     LANE RUNNER CORE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Xorshift128+ PRNG, run seed derivation    │
//! │  ├── gate.rs     - Bernoulli frequency gate                  │
//! │  ├── hash.rs     - State hashing for replay checks           │
//! │  ├── observer.rs - Subscribe / unsubscribe broadcast         │
//! │  └── scheduler.rs- Cooperative timed tasks                   │
//! │                                                              │
//! │  game/           - Session logic                             │
//! │  ├── state.rs    - Game state machine, grace window          │
//! │  ├── pool.rs     - Fixed decoration arenas                   │
//! │  ├── track.rs    - Segment placement and recycling           │
//! │  ├── player.rs   - Motion, edges, trigger reactions          │
//! │  ├── collision.rs- Overlap tests, pre-crash probe            │
//! │  ├── environment.rs - Per-character profiles                 │
//! │  ├── services.rs - Viewport / audio / analytics / prefs      │
//! │  └── session.rs  - The session context                       │
//! │                                                              │
//! │  config.rs       - JSON configuration and validation         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! All randomness comes from one seeded Xorshift128+ per run, pools and
//! segment lists are fixed arenas visited in index order, and timed tasks
//! run in (due time, id) order. Given the same seed and the same per-frame
//! input, a session reaches the same [`StateHash`](crate::core::StateHash).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod config;
pub mod game;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::core::gate::FrequencyGate;
pub use config::{ConfigError, GameConfig};
pub use game::session::GameSession;
pub use game::state::GameState;
pub use game::services::Services;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation frame rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Duration of one frame at [`TICK_RATE`]
pub const FRAME_DT: f32 = 1.0 / TICK_RATE as f32;
