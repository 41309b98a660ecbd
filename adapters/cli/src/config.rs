//! Scenario configuration loaded from TOML.

use std::{fs, io, path::Path, path::PathBuf};

use iso_tactics_core::Projector;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a scenario configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid scenario TOML.
    #[error("invalid scenario TOML")]
    Parse(#[from] toml::de::Error),
    /// The map has no cells.
    #[error("map must be at least 1x1 (got {width}x{length})")]
    EmptyMap {
        /// Configured width.
        width: u32,
        /// Configured length.
        length: u32,
    },
    /// Random terrain needs at least one layer per cell.
    #[error("max_layers must be positive")]
    NoLayers,
    /// Explicit heights do not match the map dimensions.
    #[error("heights must be {length} rows of {width} entries")]
    HeightsShape {
        /// Configured width.
        width: u32,
        /// Configured length.
        length: u32,
    },
    /// An actor starts outside the map.
    #[error("actor {index} starts outside the map at ({x}, {y})")]
    ActorOutOfBounds {
        /// Position of the actor in the `[[actors]]` list.
        index: usize,
        /// Configured column.
        x: i32,
        /// Configured row.
        y: i32,
    },
    /// Frames must have a finite duration.
    #[error("frame_rate must be positive")]
    ZeroFrameRate,
}

/// Complete scenario description.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Projection scale constants.
    pub projection: ProjectionConfig,
    /// Terrain layout.
    pub map: MapConfig,
    /// Actors spawned on the terrain.
    pub actors: Vec<ActorConfig>,
    /// Frame loop settings.
    pub simulation: SimulationConfig,
}

impl ScenarioConfig {
    /// Reads and validates a scenario file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates scenario TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let MapConfig {
            width,
            length,
            max_layers,
            ..
        } = self.map;
        if width == 0 || length == 0 {
            return Err(ConfigError::EmptyMap { width, length });
        }
        match &self.map.heights {
            Some(rows) => {
                let well_formed = rows.len() == length as usize
                    && rows.iter().all(|row| row.len() == width as usize);
                if !well_formed {
                    return Err(ConfigError::HeightsShape { width, length });
                }
            }
            None if max_layers == 0 => return Err(ConfigError::NoLayers),
            None => {}
        }
        for (index, actor) in self.actors.iter().enumerate() {
            let inside = (0..width as i64).contains(&i64::from(actor.x))
                && (0..length as i64).contains(&i64::from(actor.y));
            if !inside {
                return Err(ConfigError::ActorOutOfBounds {
                    index,
                    x: actor.x,
                    y: actor.y,
                });
            }
        }
        if self.simulation.frame_rate == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        Ok(())
    }
}

/// Scale constants of the isometric projection.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionConfig {
    /// Horizontal scale.
    pub sx: f32,
    /// Vertical scale of the ground plane.
    pub sy: f32,
    /// Vertical scale of elevation.
    pub sz: f32,
}

impl ProjectionConfig {
    /// Projector built from the configured scales, clamped to the minimum.
    #[must_use]
    pub fn projector(&self) -> Projector {
        Projector::new(self.sx, self.sy, self.sz)
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            sx: 64.0,
            sy: 32.0,
            sz: 16.0,
        }
    }
}

/// Terrain dimensions and layer counts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// Cells along x.
    pub width: u32,
    /// Cells along y.
    pub length: u32,
    /// Seed of the random terrain.
    pub seed: u64,
    /// Largest layer count drawn for random terrain.
    pub max_layers: u32,
    /// Explicit layer count per cell, one row per `y`. Overrides the random
    /// terrain when present.
    pub heights: Option<Vec<Vec<u32>>>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 8,
            length: 8,
            seed: 0,
            max_layers: 3,
            heights: None,
        }
    }
}

/// Actor placed on the terrain at startup.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActorConfig {
    /// Starting column.
    pub x: i32,
    /// Starting row.
    pub y: i32,
    /// Tiles per simulated second.
    #[serde(default = "ActorConfig::default_speed")]
    pub speed: f32,
    /// Motion ticks per simulated second.
    #[serde(default = "ActorConfig::default_tick_rate")]
    pub tick_rate: u32,
    /// Largest climbable height difference.
    #[serde(default = "ActorConfig::default_jump")]
    pub jump: f32,
    /// Whether the actor follows the terrain.
    #[serde(default = "ActorConfig::default_grounded")]
    pub grounded: bool,
    /// Waypoints walked once the scenario starts.
    #[serde(default)]
    pub path: Vec<[f32; 2]>,
}

impl ActorConfig {
    fn default_speed() -> f32 {
        2.0
    }

    fn default_tick_rate() -> u32 {
        60
    }

    fn default_jump() -> f32 {
        1.0
    }

    fn default_grounded() -> bool {
        true
    }
}

/// Frame loop settings.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Frames simulated by `run` unless overridden on the command line.
    pub frames: u64,
    /// Frames per simulated second.
    pub frame_rate: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frames: 300,
            frame_rate: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ScenarioConfig::from_toml_str("").expect("empty config is valid");

        assert_eq!(config, ScenarioConfig::default());
        assert_eq!(config.map.width, 8);
        assert_eq!(config.simulation.frame_rate, 60);
    }

    #[test]
    fn actor_fields_fall_back_individually() {
        let config = ScenarioConfig::from_toml_str(
            r#"
            [[actors]]
            x = 1
            y = 2
            jump = 0.5
            path = [[3.0, 2.0]]
            "#,
        )
        .expect("valid config");

        let actor = &config.actors[0];
        assert_eq!((actor.x, actor.y), (1, 2));
        assert_eq!(actor.speed, 2.0);
        assert_eq!(actor.jump, 0.5);
        assert!(actor.grounded);
        assert_eq!(actor.path, vec![[3.0, 2.0]]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = ScenarioConfig::from_toml_str("[map]\ndepth = 3\n")
            .expect_err("unknown key must fail");

        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn mismatched_heights_are_rejected() {
        let error = ScenarioConfig::from_toml_str(
            "[map]\nwidth = 2\nlength = 2\nheights = [[1, 1], [1]]\n",
        )
        .expect_err("ragged heights must fail");

        assert!(matches!(
            error,
            ConfigError::HeightsShape {
                width: 2,
                length: 2
            }
        ));
    }

    #[test]
    fn actors_outside_the_map_are_rejected() {
        let error = ScenarioConfig::from_toml_str(
            "[map]\nwidth = 2\nlength = 2\n[[actors]]\nx = 2\ny = 0\n",
        )
        .expect_err("actor outside the map must fail");

        assert!(matches!(
            error,
            ConfigError::ActorOutOfBounds {
                index: 0,
                x: 2,
                y: 0
            }
        ));
    }

    #[test]
    fn projection_scales_are_clamped() {
        let config = ScenarioConfig::from_toml_str("[projection]\nsx = 0.0\n")
            .expect("valid config");

        assert_eq!(config.projection.projector().sx(), Projector::MIN_SCALE);
    }
}
