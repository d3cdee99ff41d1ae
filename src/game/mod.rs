//! Game Logic Module
//!
//! Everything that runs inside a session. Deterministic given the run seed
//! and the per-frame input.
//!
//! ## Module Structure
//!
//! - `state`: Game state machine and grace window
//! - `pool`: Fixed decoration arenas (trees, rocks, pickups, birds)
//! - `track`: Wall / land segments, placement and recycling
//! - `player`: Player motion, edge checks and trigger reactions
//! - `collision`: Trigger overlap tests and the pre-crash probe
//! - `environment`: Per-character environment profiles
//! - `score`: Score, high score and coins
//! - `services`: Collaborator interfaces and headless implementations
//! - `camera`: Headless follow camera
//! - `events`: Gameplay events
//! - `session`: The session context tying it all together

pub mod state;
pub mod pool;
pub mod track;
pub mod player;
pub mod collision;
pub mod environment;
pub mod score;
pub mod services;
pub mod camera;
pub mod events;
pub mod session;

// Re-export key types
pub use state::{GameState, StateChange, StateMachine};
pub use pool::{DecorationHandle, DecorationKind, PoolSet};
pub use track::{Side, Track, WallId};
pub use player::{PlayerController, PlayerSignal};
pub use environment::{CharacterId, EnvironmentCatalog, EnvironmentProfile};
pub use events::{DeathCause, GameEvent, GameEventData};
pub use services::{Services, Viewport};
pub use camera::FollowCamera;
pub use session::GameSession;
