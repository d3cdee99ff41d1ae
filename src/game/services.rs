//! External Collaborators
//!
//! Narrow interfaces to everything outside the core: projection, audio,
//! analytics and preference storage. The session owns one boxed handle of
//! each. Headless implementations that log through `tracing` are provided
//! for the simulation binary.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use serde::{Serialize, Deserialize};
use tracing::info;

/// Camera / projection service.
pub trait Viewport {
    /// Project a world position to normalized viewport coordinates.
    /// (0, 0) is bottom-left, (1, 1) is top-right.
    fn world_to_viewport(&self, world: Vec3) -> Vec2;

    /// Inverse projection; `viewport.z` is the distance from the camera.
    fn viewport_to_world(&self, viewport: Vec3) -> Vec3;

    /// Move with the run. Called every frame while a run is active.
    fn follow(&mut self, _dt: f32, _forward_speed: f32) {}

    /// Start a camera shake.
    fn shake(&mut self) {}

    /// Return to the start of the track for a new run.
    fn reset(&mut self) {}
}

/// One-shot sound effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sound {
    /// Player hit something
    Crash,
    /// Pickup collected
    Coin,
    /// End-of-run sting
    GameOver,
    /// Bird flying by
    BirdChirp,
}

/// Music tracks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Music {
    /// Menu loop
    Menu,
    /// Stock in-game loop
    InGame,
    /// Environment-specific in-game loop
    Custom(String),
}

/// Audio service.
pub trait AudioService {
    /// Play a sound effect. `interrupt` cuts off whatever is playing.
    fn play_sound(&mut self, sound: Sound, interrupt: bool);

    /// Start a music track, replacing the current one.
    fn play_music(&mut self, music: Music);

    /// Stop the music.
    fn stop_music(&mut self);
}

/// Analytics / attribution service. Fire and forget.
pub trait Analytics {
    /// Final score of a run.
    fn report_score(&mut self, score: u32);

    /// A new high score was set this run.
    fn report_high_score(&mut self);
}

/// Key-value preference store.
pub trait PreferenceStore {
    /// Read an integer.
    fn get_int(&self, key: &str) -> Option<i64>;

    /// Write an integer.
    fn set_int(&mut self, key: &str, value: i64);
}

/// Handles to every collaborator.
pub struct Services {
    /// Projection
    pub viewport: Box<dyn Viewport>,
    /// Audio
    pub audio: Box<dyn AudioService>,
    /// Analytics
    pub analytics: Box<dyn Analytics>,
    /// Preferences
    pub preferences: Box<dyn PreferenceStore>,
}

impl Services {
    /// Headless services around a given viewport.
    pub fn headless(viewport: Box<dyn Viewport>) -> Self {
        Self {
            viewport,
            audio: Box::new(TracingAudio),
            analytics: Box::new(TracingAnalytics),
            preferences: Box::new(MemoryPreferences::default()),
        }
    }
}

/// Audio that only logs.
#[derive(Debug, Default)]
pub struct TracingAudio;

impl AudioService for TracingAudio {
    fn play_sound(&mut self, sound: Sound, interrupt: bool) {
        info!("sound {:?}{}", sound, if interrupt { " (interrupt)" } else { "" });
    }

    fn play_music(&mut self, music: Music) {
        info!("music {:?}", music);
    }

    fn stop_music(&mut self) {
        info!("music stopped");
    }
}

/// Analytics that only logs.
#[derive(Debug, Default)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn report_score(&mut self, score: u32) {
        info!("analytics: score {}", score);
    }

    fn report_high_score(&mut self) {
        info!("analytics: new high score");
    }
}

/// In-memory preference store.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: BTreeMap<String, i64>,
}

impl PreferenceStore for MemoryPreferences {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_preferences() {
        let mut prefs = MemoryPreferences::default();
        assert_eq!(prefs.get_int("HIGH_SCORE"), None);
        prefs.set_int("HIGH_SCORE", 12);
        assert_eq!(prefs.get_int("HIGH_SCORE"), Some(12));
    }
}
