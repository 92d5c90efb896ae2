//! Collision shape components.
//!
//! Colliders describe a shape in local units. The physics world scales it by
//! the entity's [`Transform`](super::Transform) scale when it builds the
//! runtime shape and records the inputs in the `last_*` fields; a mismatch
//! between those and the current values means the shape must be rebuilt.

use quasar_core::math::Vec3;
use quasar_ecs::Component;

use crate::physics::ShapeHandle;

/// Axis-aligned box collider.
#[derive(Debug, Component)]
pub struct BoxCollider {
    /// Full extents before scaling.
    pub size: Vec3,
    /// Shape center relative to the entity position, in entity space.
    pub offset: Vec3,
    #[runtime]
    pub last_scale: Vec3,
    #[runtime]
    pub last_size: Vec3,
    #[runtime]
    pub shape: Option<ShapeHandle>,
}

impl BoxCollider {
    pub fn new(size: Vec3) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Returns true if the installed shape no longer matches `size` × `scale`.
    pub fn needs_rebuild(&self, scale: &Vec3) -> bool {
        self.shape.is_none() || self.last_size != self.size || self.last_scale != *scale
    }
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self {
            size: Vec3::new(1.0, 1.0, 1.0),
            offset: Vec3::zeros(),
            last_scale: Vec3::zeros(),
            last_size: Vec3::zeros(),
            shape: None,
        }
    }
}

/// Copies carry no shape; they are rebuilt on first use.
impl Clone for BoxCollider {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            offset: self.offset,
            ..Self::default()
        }
    }
}

/// Sphere collider.
#[derive(Debug, Component)]
pub struct SphereCollider {
    /// Radius before scaling.
    pub radius: f32,
    pub offset: Vec3,
    #[runtime]
    pub last_scale: Vec3,
    #[runtime]
    pub last_radius: f32,
    #[runtime]
    pub shape: Option<ShapeHandle>,
}

impl SphereCollider {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Returns true if the installed shape no longer matches `radius` × `scale`.
    pub fn needs_rebuild(&self, scale: &Vec3) -> bool {
        self.shape.is_none() || self.last_radius != self.radius || self.last_scale != *scale
    }
}

impl Default for SphereCollider {
    fn default() -> Self {
        Self {
            radius: 0.5,
            offset: Vec3::zeros(),
            last_scale: Vec3::zeros(),
            last_radius: 0.0,
            shape: None,
        }
    }
}

impl Clone for SphereCollider {
    fn clone(&self) -> Self {
        Self {
            radius: self.radius,
            offset: self.offset,
            ..Self::default()
        }
    }
}
