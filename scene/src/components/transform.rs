use quasar_core::math::{
    Mat4, Quat, Vec3, mat4_from_scale_rotation_translation, quat_from_euler_degrees,
};
use quasar_ecs::Component;

/// Authoring pose of an entity: position, Euler rotation in degrees, scale.
#[derive(Debug, Clone, PartialEq, Component)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation about X, then Y, then Z, in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, degrees: Vec3) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation as a unit quaternion.
    pub fn rotation_quat(&self) -> Quat {
        quat_from_euler_degrees(self.rotation)
    }

    /// TRS matrix for rendering.
    pub fn matrix(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(self.scale, self.rotation_quat(), self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_is_identity() {
        let t = Transform::default();
        assert_relative_eq!(t.matrix(), Mat4::identity());
    }

    #[test]
    fn matrix_translates() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let p = t.matrix().transform_point(&quasar_core::math::nalgebra::Point3::origin());
        assert_relative_eq!(p.coords, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn rotation_quat_uses_degrees() {
        let t = Transform::default().with_rotation(Vec3::new(0.0, 0.0, 90.0));
        let v = t.rotation_quat() * Vec3::x();
        assert_relative_eq!(v, Vec3::y(), epsilon = 1e-5);
    }
}
