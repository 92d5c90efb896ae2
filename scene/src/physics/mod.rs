//! Rigid-body simulation and its synchronization with scene components.

mod conversions;
mod handles;
mod shapes;
pub mod sync;
mod world;

pub use conversions::{authoring_pose, body_pose};
pub use handles::{BodyHandle, BodySettings, ColliderKind, ShapeHandle, ShapeKey};
pub use shapes::{MIN_EXTENT, MIN_SCALE, box_half_extents, clamp_scale, sphere_radius};
pub use sync::SyncDirection;
pub use world::{MIN_DYNAMIC_MASS, PhysicsWorld, RaycastHit};
