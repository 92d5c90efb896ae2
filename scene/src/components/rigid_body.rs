use quasar_core::math::Vec3;
use quasar_ecs::{Component, ComponentField, FieldKind, FieldValue};

use crate::physics::BodyHandle;

/// How a rigid body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyType {
    /// Immovable; moved only by teleporting from the authoring pose.
    Static,
    /// Driven by forces, gravity and contacts.
    #[default]
    Dynamic,
    /// Follows the authoring pose and pushes dynamic bodies.
    Kinematic,
}

impl BodyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyType::Static => "Static",
            BodyType::Dynamic => "Dynamic",
            BodyType::Kinematic => "Kinematic",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Static" => Some(BodyType::Static),
            "Dynamic" => Some(BodyType::Dynamic),
            "Kinematic" => Some(BodyType::Kinematic),
            _ => None,
        }
    }
}

impl ComponentField for BodyType {
    const KIND: FieldKind = FieldKind::Enum;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Enum(self.as_str().to_string())
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Enum(name) | FieldValue::String(name) => BodyType::parse(name),
            _ => None,
        }
    }
}

/// Rigid body settings and mirrored simulation state.
///
/// `linear_velocity` and `angular_velocity` seed dynamic bodies when they are
/// created and are overwritten with the simulated values every frame.
#[derive(Debug, Component)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub mass: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
    pub use_gravity: bool,
    /// Forces kinematic behavior regardless of `body_type`.
    pub is_kinematic: bool,
    pub freeze_rotation: bool,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    #[runtime]
    pub body: Option<BodyHandle>,
}

impl RigidBody {
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            ..Self::default()
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_gravity(mut self, use_gravity: bool) -> Self {
        self.use_gravity = use_gravity;
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Body type after applying `is_kinematic`.
    pub fn effective_type(&self) -> BodyType {
        if self.is_kinematic {
            BodyType::Kinematic
        } else {
            self.body_type
        }
    }

    /// Returns true if a body is installed in the physics world.
    pub fn is_registered(&self) -> bool {
        self.body.is_some()
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            mass: 1.0,
            linear_drag: 0.0,
            angular_drag: 0.05,
            use_gravity: true,
            is_kinematic: false,
            freeze_rotation: false,
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            body: None,
        }
    }
}

/// Copies are unregistered.
impl Clone for RigidBody {
    fn clone(&self) -> Self {
        Self {
            body_type: self.body_type,
            mass: self.mass,
            linear_drag: self.linear_drag,
            angular_drag: self.angular_drag,
            use_gravity: self.use_gravity,
            is_kinematic: self.is_kinematic,
            freeze_rotation: self.freeze_rotation,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let rb = RigidBody::default();
        assert_eq!(rb.body_type, BodyType::Dynamic);
        assert_eq!(rb.mass, 1.0);
        assert_eq!(rb.angular_drag, 0.05);
        assert!(rb.use_gravity);
        assert!(!rb.is_registered());
    }

    #[test]
    fn kinematic_flag_promotes_any_type() {
        let mut rb = RigidBody::new(BodyType::Static);
        rb.is_kinematic = true;
        assert_eq!(rb.effective_type(), BodyType::Kinematic);
    }

    #[test]
    fn body_type_reflects_as_enum_name() {
        let mut rb = RigidBody::default();
        rb.set_field("body_type", FieldValue::Enum("Kinematic".into()))
            .unwrap();
        assert_eq!(rb.body_type, BodyType::Kinematic);
        assert_eq!(
            rb.field("body_type"),
            Some(FieldValue::Enum("Kinematic".into()))
        );
        assert!(
            rb.set_field("body_type", FieldValue::Enum("Ghost".into()))
                .is_err()
        );
    }
}
