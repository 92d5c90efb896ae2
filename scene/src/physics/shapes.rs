//! Shape sizing from authored dimensions and entity scale.

use quasar_core::math::{Vec3, max_abs_component};

/// Smallest scale component magnitude accepted for shape construction.
pub const MIN_SCALE: f32 = 1.0e-4;

/// Smallest half extent or radius of a built shape.
pub const MIN_EXTENT: f32 = 1.0e-4;

/// Clamps each component with `|s| < MIN_SCALE` to `±MIN_SCALE` (zero
/// becomes positive). Returns the clamped scale and whether anything changed.
pub fn clamp_scale(scale: &Vec3) -> (Vec3, bool) {
    let mut clamped = false;
    let out = scale.map(|s| {
        if s.abs() < MIN_SCALE {
            clamped = true;
            if s < 0.0 { -MIN_SCALE } else { MIN_SCALE }
        } else {
            s
        }
    });
    (out, clamped)
}

/// Box half extents: `0.5 × size ⊙ scale`, made non-negative.
pub fn box_half_extents(size: &Vec3, scale: &Vec3) -> Vec3 {
    (size.component_mul(scale) * 0.5).map(|c| c.abs().max(MIN_EXTENT))
}

/// Sphere radius: `radius × max(|scale|)`.
pub fn sphere_radius(radius: f32, scale: &Vec3) -> f32 {
    (radius * max_abs_component(scale)).abs().max(MIN_EXTENT)
}
