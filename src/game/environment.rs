//! Environment Selection
//!
//! Maps the active character to a cosmetic bundle: decoration variants,
//! spawn toggles, colors and an optional music override.

use glam::Vec3;
use serde::{Serialize, Deserialize};

use crate::config::ConfigError;

/// Identity of a playable character.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    /// Create from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Character name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

/// Start-area landmark shown until it scrolls out of view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkProfile {
    /// Asset name
    pub asset: String,
    /// World position
    pub position: Vec3,
}

/// Per-character environment configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentProfile {
    /// Profile name (for logs)
    pub name: String,
    /// Character this profile belongs to; `None` for the default profile
    pub character: Option<CharacterId>,
    /// Tree asset variants
    pub tree_variants: Vec<String>,
    /// Rock asset variants
    pub obstacle_variants: Vec<String>,
    /// Bird asset variants
    pub bird_variants: Vec<String>,
    /// Play `background_music` instead of the stock in-game track
    pub use_custom_music: bool,
    /// Custom in-game track
    pub background_music: Option<String>,
    /// Ground tint
    pub plane_color: Rgba,
    /// Draw wall fences
    pub enable_fence: bool,
    /// Spawn birds on wall recycles
    pub enable_birds: bool,
    /// Attach a falling-particle effect to the camera
    pub enable_falling_particle: bool,
    /// Trees per primary row on each wall
    pub trees_per_wall: u32,
    /// Sky gradient top
    pub skybox_top: Rgba,
    /// Sky gradient bottom
    pub skybox_bottom: Rgba,
    /// Start-area landmark
    pub landmark: Option<LandmarkProfile>,
}

impl Default for EnvironmentProfile {
    fn default() -> Self {
        Self {
            name: "winter".to_string(),
            character: None,
            tree_variants: vec!["pine".to_string(), "pine_snow".to_string()],
            obstacle_variants: vec!["rock".to_string(), "rock_snow".to_string()],
            bird_variants: Vec::new(),
            use_custom_music: false,
            background_music: None,
            plane_color: Rgba([235, 240, 250, 255]),
            enable_fence: false,
            enable_birds: false,
            enable_falling_particle: true,
            trees_per_wall: 7,
            skybox_top: Rgba([40, 80, 200, 255]),
            skybox_bottom: Rgba([40, 80, 200, 255]),
            landmark: Some(LandmarkProfile {
                asset: "main_house".to_string(),
                position: Vec3::new(0.0, 0.0, 12.0),
            }),
        }
    }
}

impl EnvironmentProfile {
    /// Birds are spawned only when enabled and there is something to spawn.
    pub fn birds_enabled(&self) -> bool {
        self.enable_birds && !self.bird_variants.is_empty()
    }

    /// Music to play while a run is active, if this profile overrides it.
    pub fn music_override(&self) -> Option<&str> {
        if self.use_custom_music {
            self.background_music.as_deref()
        } else {
            None
        }
    }

    /// Check the values the generator depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trees_per_wall == 0 {
            return Err(ConfigError::ZeroTreesPerWall);
        }
        Ok(())
    }
}

/// All environments known to the game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentCatalog {
    /// Used when no profile matches the character
    pub default_environment: EnvironmentProfile,
    /// Character-specific profiles, searched in order
    pub environments: Vec<EnvironmentProfile>,
}

impl EnvironmentCatalog {
    /// Parse a catalog from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Profile for `character`, compared case-insensitively; the default
    /// profile when none matches.
    pub fn select(&self, character: Option<&CharacterId>) -> &EnvironmentProfile {
        let Some(character) = character else {
            return &self.default_environment;
        };

        self.environments
            .iter()
            .find(|env| {
                env.character
                    .as_ref()
                    .is_some_and(|c| c.name().eq_ignore_ascii_case(character.name()))
            })
            .unwrap_or(&self.default_environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> EnvironmentCatalog {
        EnvironmentCatalog {
            default_environment: EnvironmentProfile::default(),
            environments: vec![
                EnvironmentProfile {
                    name: "forest".to_string(),
                    character: Some(CharacterId::new("Ranger")),
                    enable_birds: true,
                    bird_variants: vec!["crow".to_string()],
                    ..EnvironmentProfile::default()
                },
                EnvironmentProfile {
                    name: "desert".to_string(),
                    character: Some(CharacterId::new("Nomad")),
                    use_custom_music: true,
                    background_music: Some("dunes".to_string()),
                    ..EnvironmentProfile::default()
                },
            ],
        }
    }

    #[test]
    fn test_select_case_insensitive() {
        let catalog = catalog();
        let env = catalog.select(Some(&CharacterId::new("rAnGeR")));
        assert_eq!(env.name, "forest");
        assert!(env.birds_enabled());
    }

    #[test]
    fn test_select_falls_back_to_default() {
        let catalog = catalog();
        assert_eq!(catalog.select(Some(&CharacterId::new("Nobody"))).name, "winter");
        assert_eq!(catalog.select(None).name, "winter");
    }

    #[test]
    fn test_music_override() {
        let catalog = catalog();
        assert_eq!(catalog.select(Some(&CharacterId::new("nomad"))).music_override(), Some("dunes"));
        assert_eq!(catalog.default_environment.music_override(), None);
    }

    #[test]
    fn test_birds_need_variants() {
        let env = EnvironmentProfile {
            enable_birds: true,
            bird_variants: Vec::new(),
            ..EnvironmentProfile::default()
        };
        assert!(!env.birds_enabled());
    }

    #[test]
    fn test_catalog_from_json() {
        let catalog = EnvironmentCatalog::from_json_str(
            r#"{ "environments": [ { "name": "beach", "character": "Surfer", "trees_per_wall": 3 } ] }"#,
        )
        .unwrap();
        let env = catalog.select(Some(&CharacterId::new("surfer")));
        assert_eq!(env.name, "beach");
        assert_eq!(env.trees_per_wall, 3);
    }

    #[test]
    fn test_validate_trees_per_wall() {
        let env = EnvironmentProfile {
            trees_per_wall: 0,
            ..EnvironmentProfile::default()
        };
        assert!(matches!(env.validate(), Err(ConfigError::ZeroTreesPerWall)));
    }
}
