use quasar_core::math::{Mat4, perspective_rh, orthographic_rh};
use quasar_ecs::{Component, ComponentField, FieldKind, FieldValue};

/// Camera projection model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

impl ComponentField for Projection {
    const KIND: FieldKind = FieldKind::Enum;

    fn to_field_value(&self) -> FieldValue {
        let name = match self {
            Projection::Perspective => "Perspective",
            Projection::Orthographic => "Orthographic",
        };
        FieldValue::Enum(name.to_string())
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Enum(name) | FieldValue::String(name) => match name.as_str() {
                "Perspective" => Some(Projection::Perspective),
                "Orthographic" => Some(Projection::Orthographic),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct Camera {
    pub projection: Projection,
    /// Vertical field of view in degrees.
    pub perspective_fov: f32,
    pub perspective_near: f32,
    pub perspective_far: f32,
    /// Height of the view volume in world units.
    pub orthographic_size: f32,
    pub orthographic_near: f32,
    pub orthographic_far: f32,
    pub primary: bool,
}

impl Camera {
    /// Projection matrix for the given viewport aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective => perspective_rh(
                self.perspective_fov.to_radians(),
                aspect,
                self.perspective_near,
                self.perspective_far,
            ),
            Projection::Orthographic => {
                let half_h = self.orthographic_size * 0.5;
                let half_w = half_h * aspect;
                orthographic_rh(
                    -half_w,
                    half_w,
                    -half_h,
                    half_h,
                    self.orthographic_near,
                    self.orthographic_far,
                )
            }
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            perspective_fov: 45.0,
            perspective_near: 0.1,
            perspective_far: 1000.0,
            orthographic_size: 10.0,
            orthographic_near: -1.0,
            orthographic_far: 1.0,
            primary: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orthographic_maps_size_to_unit_height() {
        let camera = Camera {
            projection: Projection::Orthographic,
            ..Camera::default()
        };
        let m = camera.projection_matrix(1.0);
        let top = m * quasar_core::math::nalgebra::Vector4::new(0.0, 5.0, 0.0, 1.0);
        assert_relative_eq!(top.y, 1.0, epsilon = 1e-5);
    }
}
