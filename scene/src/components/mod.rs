//! Component set of the scene runtime.
//!
//! Every entity created through a [`Scene`](crate::Scene) owns a
//! [`Transform`] and a [`Tag`]; everything else is optional.

mod audio;
mod camera;
mod collider;
mod light;
mod mesh;
mod rigid_body;
mod script;
mod tag;
mod transform;

pub use audio::{AudioListener, AudioSource};
pub use camera::{Camera, Projection};
pub use collider::{BoxCollider, SphereCollider};
pub use light::{DirectionalLight, PointLight};
pub use mesh::MeshRenderer;
pub use rigid_body::{BodyType, RigidBody};
pub use script::Script;
pub use tag::Tag;
pub use transform::Transform;

use quasar_ecs::Registry;

/// Registers every scene component for reflection (snapshots, instantiate).
pub fn register_scene_components(registry: &mut Registry) {
    registry.register_reflected::<Transform>();
    registry.register_reflected::<Tag>();
    registry.register_reflected::<BoxCollider>();
    registry.register_reflected::<SphereCollider>();
    registry.register_reflected::<RigidBody>();
    registry.register_reflected::<Script>();
    registry.register_reflected::<Camera>();
    registry.register_reflected::<MeshRenderer>();
    registry.register_reflected::<PointLight>();
    registry.register_reflected::<DirectionalLight>();
    registry.register_reflected::<AudioSource>();
    registry.register_reflected::<AudioListener>();
}
