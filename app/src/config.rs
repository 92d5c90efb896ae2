//! Runner configuration loaded from RON.

use std::path::{Path, PathBuf};

use quasar_scene::SceneSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config `{}`: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for a headless run. Missing fields take their defaults.
///
/// ```ron
/// (
///     frames: 300,
///     timestep: 0.016666668,
///     log_filter: Some("quasar_scene=debug"),
///     scene: (physics: (gravity: (0.0, -3.7, 0.0))),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Frames to run; 0 runs until the handler stops.
    pub frames: u64,
    /// Seconds of simulated time per frame.
    pub timestep: f32,
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
    pub scene: SceneSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            timestep: 1.0 / 60.0,
            log_filter: None,
            scene: SceneSettings::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timestep > 0.0) || !self.timestep.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        let physics = &self.scene.physics;
        if !(physics.fixed_timestep > 0.0) || !physics.fixed_timestep.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "physics fixed_timestep must be positive, got {}",
                physics.fixed_timestep
            )));
        }
        if physics.max_substeps == 0 {
            return Err(ConfigError::Invalid(
                "physics max_substeps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
