//! Runtime handles stored in components.
//!
//! Handles are created and released only by the
//! [`PhysicsWorld`](super::PhysicsWorld). They are deliberately not `Clone`:
//! a component copy must never share a shape or body with its source.

use quasar_core::math::Vec3;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
use slotmap::new_key_type;

use quasar_ecs::{Entity, Registry};

use crate::components::{BodyType, BoxCollider, RigidBody, SphereCollider};

new_key_type! {
    /// Key of a collision shape in the physics world's shape arena.
    pub struct ShapeKey;
}

/// Owning reference to a collision shape in the shape arena.
#[derive(Debug, PartialEq, Eq)]
pub struct ShapeHandle {
    pub(crate) key: ShapeKey,
}

impl ShapeHandle {
    pub fn key(&self) -> ShapeKey {
        self.key
    }
}

/// Which collider component a body's shape comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderKind {
    Box,
    Sphere,
}

impl ColliderKind {
    /// Collider a body is built from: the box if present, else the sphere.
    pub fn preferred(registry: &Registry, entity: Entity) -> Option<Self> {
        if registry.has_component::<BoxCollider>(entity) {
            Some(ColliderKind::Box)
        } else if registry.has_component::<SphereCollider>(entity) {
            Some(ColliderKind::Sphere)
        } else {
            None
        }
    }
}

/// Settings a body was built with. A difference from the authored
/// [`RigidBody`] means the body must be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySettings {
    pub body_type: BodyType,
    pub mass: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
    pub use_gravity: bool,
    pub freeze_rotation: bool,
}

impl BodySettings {
    pub fn from_component(rb: &RigidBody) -> Self {
        Self {
            body_type: rb.effective_type(),
            mass: rb.mass,
            linear_drag: rb.linear_drag,
            angular_drag: rb.angular_drag,
            use_gravity: rb.use_gravity,
            freeze_rotation: rb.freeze_rotation,
        }
    }
}

/// Owning reference to an installed rigid body and its collider.
#[derive(Debug)]
pub struct BodyHandle {
    pub(crate) body: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
    pub(crate) shape: ColliderKind,
    /// Collider offset the current pose was computed with.
    pub(crate) offset: Vec3,
    pub(crate) settings: BodySettings,
}

impl BodyHandle {
    pub fn rapier_handle(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider_kind(&self) -> ColliderKind {
        self.shape
    }

    pub fn settings(&self) -> &BodySettings {
        &self.settings
    }

    /// Returns true if `rb` was edited in a way the installed body cannot
    /// follow without being rebuilt.
    pub fn is_stale(&self, rb: &RigidBody) -> bool {
        self.settings != BodySettings::from_component(rb)
    }
}
