//! Game Events
//!
//! Signals broadcast to event subscribers, stamped with the frame they
//! happened on.

use glam::Vec3;
use serde::{Serialize, Deserialize};

use crate::game::pool::DecorationHandle;

/// Why the player died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Hit a wall or a rock
    Collision,
    /// Drifted past the edge of the screen
    EdgeOverrun,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Prepare -> Playing
    RunStarted {
        run_seed: u64,
    },

    /// Player died (once per run)
    PlayerDied {
        cause: DeathCause,
    },

    /// Player is steering toward the edge of the screen
    HeadingTowardEdge,

    /// A wall or rock is right ahead
    PreCrash,

    /// Score went up
    ScoreIncrement {
        score: u32,
    },

    /// Coin count went up
    CoinIncrement {
        coins: u32,
    },

    /// A pickup was collected
    PickupCollected {
        pickup: DecorationHandle,
    },

    /// Impulse applied to the player on a crash
    CollisionImpulse {
        impulse: Vec3,
    },

    /// Camera shake requested
    CameraShake,

    /// A bird took off
    BirdLaunched {
        bird: DecorationHandle,
    },

    /// A wall pair moved to the far end of the track
    WallsRecycled {
        index: u32,
        deviation: f32,
    },

    /// Run ended
    RunEnded {
        score: u32,
        high_score: u32,
        new_high_score: bool,
    },
}

/// A game event with its frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Frame when the event occurred
    pub frame: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(frame: u64, data: GameEventData) -> Self {
        Self { frame, data }
    }

    /// Create run ended event.
    pub fn run_ended(frame: u64, score: u32, high_score: u32, new_high_score: bool) -> Self {
        Self::new(
            frame,
            GameEventData::RunEnded {
                score,
                high_score,
                new_high_score,
            },
        )
    }

    /// Whether this is a death.
    pub fn is_death(&self) -> bool {
        matches!(self.data, GameEventData::PlayerDied { .. })
    }
}
