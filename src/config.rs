//! Scene and driver configuration, read from TOML.
//!
//! Every field has a default so a partial (or empty) file is valid.

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] io::Error),

    #[error("Could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> ProjectionConfig {
        ProjectionConfig {
            fov: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PointerConfig {
    /// How long a target lives after it was hit.
    pub hit_expiry_ms: u64,
    /// How long the laser stays flagged after the trigger is let go.
    pub release_cooldown_ms: u64,
}

impl Default for PointerConfig {
    fn default() -> PointerConfig {
        PointerConfig {
            hit_expiry_ms: 1000,
            release_cooldown_ms: 250,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnConfig {
    pub interval_secs: f32,
    pub x_range: [f32; 2],
    pub y_range: [f32; 2],
    pub z_range: [f32; 2],
    pub gravity: f32,
}

impl Default for SpawnConfig {
    fn default() -> SpawnConfig {
        SpawnConfig {
            interval_secs: 0.5,
            x_range: [-10.0, 10.0],
            y_range: [10.0, 15.0],
            z_range: [-25.0, -5.0],
            gravity: -1.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    pub frames: u32,
    pub frame_rate: u32,
    pub stereo: bool,
    pub width: u32,
    pub height: u32,
    /// Simulate losing the render context on this frame.
    pub context_loss_frame: Option<u32>,
}

impl Default for DriverConfig {
    fn default() -> DriverConfig {
        DriverConfig {
            frames: 600,
            frame_rate: 60,
            stereo: true,
            width: 1600,
            height: 900,
            context_loss_frame: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub projection: ProjectionConfig,
    pub pointer: PointerConfig,
    pub spawn: SpawnConfig,
    pub driver: DriverConfig,
    /// Offset applied to the scene root, i.e. where the world sits relative to the viewer.
    pub scene_offset: [f32; 3],
    pub viewpoint_position: [f32; 3],
}

impl Default for SceneConfig {
    fn default() -> SceneConfig {
        SceneConfig {
            projection: ProjectionConfig::default(),
            pointer: PointerConfig::default(),
            spawn: SpawnConfig::default(),
            driver: DriverConfig::default(),
            scene_offset: [0.0, -1.5, 5.0],
            viewpoint_position: [0.0, 0.0, 5.0],
        }
    }
}

impl SceneConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<SceneConfig, ConfigError> {
        let contents = fs::read_to_string(path)?;
        SceneConfig::from_toml(&contents)
    }

    #[inline]
    pub fn from_toml(contents: &str) -> Result<SceneConfig, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = SceneConfig::from_toml("").unwrap();
        assert_eq!(SceneConfig::default(), config);
        assert_eq!(1000, config.pointer.hit_expiry_ms);
        assert_eq!(250, config.pointer.release_cooldown_ms);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SceneConfig::from_toml(
            r#"
            scene_offset = [0.0, -2.0, 4.0]

            [projection]
            far = 250.0

            [driver]
            stereo = false
            "#,
        )
        .unwrap();
        assert_eq!(250.0, config.projection.far);
        assert_eq!(0.1, config.projection.near);
        assert!(!config.driver.stereo);
        assert_eq!(600, config.driver.frames);
        assert_eq!(None, config.driver.context_loss_frame);
        assert_eq!([0.0, -2.0, 4.0], config.scene_offset);
        assert_eq!([0.0, 0.0, 5.0], config.viewpoint_position);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = SceneConfig::from_toml("projection = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SceneConfig::load_from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
