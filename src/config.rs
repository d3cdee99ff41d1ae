//! Configuration
//!
//! Every tunable of a session: difficulty, track geometry, player motion,
//! timers and the headless camera. All structs deserialize from JSON with
//! per-field defaults, so a config file only needs the values it changes.

use std::path::Path;

use glam::Vec3;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the file
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// JSON was malformed or had wrong types
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A probability was outside [0, 1]
    #[error("{name} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f32 },

    /// A min/max pair was inverted
    #[error("{name}: min {min} is greater than max {max}")]
    InvertedRange { name: &'static str, min: f32, max: f32 },

    /// A length or interval that must be strictly positive was not
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    /// The track needs at least one recyclable wall pair
    #[error("wall_count must be at least 1")]
    ZeroWallCount,

    /// Dense tree filling needs at least one tree per wall
    #[error("trees_per_wall must be at least 1")]
    ZeroTreesPerWall,
}

/// Generation probabilities, all in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Difficulty {
    /// Chance that a wall pair deviates laterally
    pub path_difficulty: f32,
    /// Chance that an obstacle-lane slot gets a rock
    pub obstacle_frequency: f32,
    /// Chance that a gift-lane slot gets a pickup
    pub gift_frequency: f32,
    /// Chance that a wall recycle launches a bird
    pub bird_frequency: f32,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            path_difficulty: 0.3,
            obstacle_frequency: 0.2,
            gift_frequency: 0.35,
            bird_frequency: 0.15,
        }
    }
}

/// Offsets of the anchor points carried by every wall segment.
///
/// Offsets are given for the left wall; the right wall mirrors them on X.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentLayout {
    /// Where dense tree filling starts, relative to the wall
    pub tree_anchor: Vec3,
    /// Reference barrier for item slots, relative to the wall
    pub barrier_anchor: Vec3,
    /// Length of the barrier; slots cover the first half
    pub barrier_length: f32,
    /// Half extents of the wall's collision box
    pub wall_half_extents: Vec3,
    /// Collision radius of rocks
    pub rock_radius: f32,
    /// Collision radius of pickups
    pub pickup_radius: f32,
}

impl Default for SegmentLayout {
    fn default() -> Self {
        Self {
            tree_anchor: Vec3::new(-1.0, 0.0, 9.0),
            barrier_anchor: Vec3::new(0.5, 0.0, -4.0),
            barrier_length: 12.0,
            wall_half_extents: Vec3::new(0.5, 1.0, 11.0),
            rock_radius: 0.6,
            pickup_radius: 0.5,
        }
    }
}

/// Track generation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Recyclable wall pairs in addition to the seed pair
    pub wall_count: u32,
    /// Minimum lateral deviation of a deviating pair
    pub min_wall_distance: f32,
    /// Maximum lateral deviation of a deviating pair
    pub max_wall_distance: f32,
    /// Slowest bird flight speed
    pub min_bird_speed: f32,
    /// Fastest bird flight speed
    pub max_bird_speed: f32,
    /// Spawn probabilities
    pub difficulty: Difficulty,
    /// Longitudinal distance between consecutive walls
    pub wall_stride: f32,
    /// Longitudinal distance between consecutive land tiles
    pub land_stride: f32,
    /// Seed left wall position
    pub first_left_wall: Vec3,
    /// Seed right wall position
    pub first_right_wall: Vec3,
    /// Seed land position
    pub first_land: Vec3,
    /// Anchor offsets on each wall
    pub layout: SegmentLayout,
    /// Viewport y past which a segment is recycled
    pub recycle_threshold: f32,
    /// Viewport y past which the landmark is hidden
    pub landmark_threshold: f32,
    /// Distance between item slots along the barrier
    pub item_slot_step: f32,
    /// Lower bound of the item jitter
    pub min_item_distance: f32,
    /// Upper jitter bound is (|left.x| + |right.x|) / this
    pub item_distance_divisor: f32,
    /// Pickup pool entries per wall pair
    pub pickups_per_segment: u32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            wall_count: 10,
            min_wall_distance: 2.0,
            max_wall_distance: 3.0,
            min_bird_speed: 3.0,
            max_bird_speed: 6.0,
            difficulty: Difficulty::default(),
            wall_stride: 22.0,
            land_stride: 44.0,
            first_left_wall: Vec3::new(-8.0, 0.0, 0.0),
            first_right_wall: Vec3::new(8.0, 0.0, 0.0),
            first_land: Vec3::ZERO,
            layout: SegmentLayout::default(),
            recycle_threshold: 2.0,
            landmark_threshold: 1.5,
            item_slot_step: 2.0,
            min_item_distance: 3.0,
            item_distance_divisor: 5.0,
            pickups_per_segment: 10,
        }
    }
}

/// Player motion and collision settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Cap for both the forward and the steer speed
    pub max_speed: f32,
    /// Cap for the steer acceleration
    pub max_speed_factor: f32,
    /// Ramp rate of forward speed and steer acceleration
    pub increase_speed_factor: f32,
    /// Collision force at the start of a run
    pub initial_collision_force: f32,
    /// Collision force cap
    pub max_collision_force: f32,
    /// Ramp rate of the collision force
    pub increase_collision_force_factor: f32,
    /// Direction of the crash impulse (normalized on use)
    pub collision_direction: Vec3,
    /// Spawn position
    pub start_position: Vec3,
    /// Trigger radius of the player
    pub radius: f32,
    /// Viewport x at or below which steering left is "heading to an edge"
    pub edge_warning_min: f32,
    /// Viewport x at or above which drifting right is "heading to an edge"
    pub edge_warning_max: f32,
    /// Viewport x below which the player dies
    pub edge_death_min: f32,
    /// Viewport x above which the player dies
    pub edge_death_max: f32,
    /// Probe distance for the pre-crash check
    pub pre_crash_lookahead: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_speed: 6.0,
            max_speed_factor: 8.0,
            increase_speed_factor: 1.5,
            initial_collision_force: 200.0,
            max_collision_force: 600.0,
            increase_collision_force_factor: 20.0,
            collision_direction: Vec3::new(1.0, 0.5, -1.0),
            start_position: Vec3::ZERO,
            radius: 0.5,
            edge_warning_min: 0.05,
            edge_warning_max: 0.95,
            edge_death_min: -0.15,
            edge_death_max: 1.15,
            pre_crash_lookahead: 1.5,
        }
    }
}

/// Durations of the timed tasks, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pre-game-over window length
    pub grace_window: f32,
    /// Recycle polling interval
    pub recycle_interval: f32,
    /// Delay between game over and stopping the music
    pub music_stop_delay: f32,
    /// Delay between the game-over sting and the menu music
    pub menu_music_delay: f32,
    /// Bird chirp delay lower bound
    pub chirp_delay_min: f32,
    /// Bird chirp delay upper bound
    pub chirp_delay_max: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            grace_window: 0.5,
            recycle_interval: 0.5,
            music_stop_delay: 1.0,
            menu_music_delay: 2.0,
            chirp_delay_min: 1.0,
            chirp_delay_max: 3.0,
        }
    }
}

/// Headless camera settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// World units spanned by viewport x in [0, 1]
    pub view_width: f32,
    /// World units spanned by viewport y in [0, 1]
    pub view_depth: f32,
    /// Initial camera focus
    pub start_position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            view_width: 20.0,
            view_depth: 30.0,
            start_position: Vec3::ZERO,
        }
    }
}

/// Complete session configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Base seed; run seeds are derived from it
    pub seed: u64,
    /// Track generation
    pub track: TrackConfig,
    /// Player motion
    pub motion: MotionConfig,
    /// Timers
    pub timing: TimingConfig,
    /// Headless camera
    pub camera: CameraConfig,
}

impl GameConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let track = &self.track;
        let d = &track.difficulty;

        check_probability("path_difficulty", d.path_difficulty)?;
        check_probability("obstacle_frequency", d.obstacle_frequency)?;
        check_probability("gift_frequency", d.gift_frequency)?;
        check_probability("bird_frequency", d.bird_frequency)?;

        if track.wall_count == 0 {
            return Err(ConfigError::ZeroWallCount);
        }

        check_range("wall_distance", track.min_wall_distance, track.max_wall_distance)?;
        check_range("bird_speed", track.min_bird_speed, track.max_bird_speed)?;
        check_range(
            "chirp_delay",
            self.timing.chirp_delay_min,
            self.timing.chirp_delay_max,
        )?;

        check_positive("wall_stride", track.wall_stride)?;
        check_positive("land_stride", track.land_stride)?;
        check_positive("item_slot_step", track.item_slot_step)?;
        check_positive("item_distance_divisor", track.item_distance_divisor)?;
        check_positive("recycle_interval", self.timing.recycle_interval)?;
        check_positive("max_speed", self.motion.max_speed)?;
        check_positive("view_width", self.camera.view_width)?;
        check_positive("view_depth", self.camera.view_depth)?;

        Ok(())
    }
}

fn check_probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

fn check_range(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { name, min, max })
    }
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json_str(
            r#"{ "seed": 9, "track": { "wall_count": 4, "difficulty": { "path_difficulty": 1.0 } } }"#,
        )
        .unwrap();

        assert_eq!(config.seed, 9);
        assert_eq!(config.track.wall_count, 4);
        assert_eq!(config.track.difficulty.path_difficulty, 1.0);
        assert_eq!(config.track.difficulty.gift_frequency, Difficulty::default().gift_frequency);
        assert_eq!(config.motion, MotionConfig::default());
    }

    #[test]
    fn test_rejects_bad_probability() {
        let result = GameConfig::from_json_str(
            r#"{ "track": { "difficulty": { "gift_frequency": 1.5 } } }"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::ProbabilityOutOfRange { name: "gift_frequency", .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_wall_distance() {
        let mut config = GameConfig::default();
        config.track.min_wall_distance = 4.0;
        config.track.max_wall_distance = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { name: "wall_distance", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_walls() {
        let mut config = GameConfig::default();
        config.track.wall_count = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroWallCount)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            GameConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            GameConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
