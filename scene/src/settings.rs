//! Tunables for a scene and its physics world.

use quasar_core::math::Vec3;
use serde::{Deserialize, Serialize};

/// Physics world configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// World gravity in m/s².
    pub gravity: [f32; 3],
    /// Length of one simulation sub-step, in seconds.
    pub fixed_timestep: f32,
    /// Upper bound on sub-steps per `step` call; leftover time is dropped.
    pub max_substeps: u32,
}

impl PhysicsSettings {
    pub fn gravity_vector(&self) -> Vec3 {
        Vec3::from(self.gravity)
    }
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 10,
        }
    }
}

/// Scene configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub physics: PhysicsSettings,
}
