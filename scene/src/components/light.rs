use quasar_core::math::Vec3;
use quasar_ecs::Component;

#[derive(Debug, Clone, PartialEq, Component)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub radius: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            radius: 5.0,
        }
    }
}

/// Directional light; the direction is the entity's rotated -Z axis.
#[derive(Debug, Clone, PartialEq, Component)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }
}
