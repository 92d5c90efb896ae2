//! Pose conversion between authoring transforms and simulation isometries.
//!
//! A body sits at the collider center: `entity position + rotation·offset`.
//! Reading a pose back subtracts the same rotated offset.

use quasar_core::math::{Isometry3, Vec3, euler_degrees_from_quat, isometry_from_parts};

use crate::components::Transform;

/// Simulation pose for `transform` with the collider center at `offset`.
pub fn body_pose(transform: &Transform, offset: &Vec3) -> Isometry3 {
    let rotation = transform.rotation_quat();
    isometry_from_parts(transform.position + rotation * offset, rotation)
}

/// Authoring position and Euler rotation (degrees) for a body pose.
pub fn authoring_pose(pose: &Isometry3, offset: &Vec3) -> (Vec3, Vec3) {
    let rotation = pose.rotation;
    let position = pose.translation.vector - rotation * offset;
    (position, euler_degrees_from_quat(&rotation))
}
