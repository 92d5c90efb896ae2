//! # Quasar Scene
//!
//! Runtime for a 3D scene: the component set, a rigid-body world kept in
//! sync with authoring components, and the contracts for script hosts,
//! renderers and audio engines.
//!
//! ```no_run
//! use quasar_core::math::Vec3;
//! use quasar_scene::components::{BoxCollider, RigidBody, Transform};
//! use quasar_scene::Scene;
//!
//! let mut scene = Scene::new("Sandbox");
//! let crate_box = scene.create_entity("Crate");
//! scene.get_component_mut::<Transform>(crate_box).position = Vec3::new(0.0, 5.0, 0.0);
//! scene.add_component(crate_box, BoxCollider::default());
//! scene.add_component(crate_box, RigidBody::default());
//!
//! scene.on_runtime_start();
//! for _ in 0..60 {
//!     scene.on_update(1.0 / 60.0);
//! }
//! ```

pub mod audio;
pub mod commands;
pub mod components;
pub mod error;
pub mod physics;
pub mod render;
mod scene;
pub mod script;
pub mod settings;
pub mod snapshot;

pub use audio::{AudioEngine, AudioSourceId};
pub use error::{PhysicsError, ScriptError};
pub use physics::{PhysicsWorld, RaycastHit, SyncDirection};
pub use render::{CameraView, PointLightData, RenderSink};
pub use scene::Scene;
pub use script::{ScriptContext, ScriptHost, ScriptInstance};
pub use settings::{PhysicsSettings, SceneSettings};
pub use snapshot::{EntitySnapshot, SceneSnapshot};
