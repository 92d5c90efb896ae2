//! Math type aliases and helper functions.
//!
//! Authoring data stores rotations as Euler angles in degrees; the simulation
//! works with unit quaternions and isometries. The helpers here convert
//! between the two with a single convention: rotations are applied about X,
//! then Y, then Z in world space (`R = Rz * Ry * Rx`).

pub use nalgebra;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Unit quaternion (f32).
pub type Quat = nalgebra::UnitQuaternion<f32>;

/// Rigid transform (rotation + translation, f32).
pub type Isometry3 = nalgebra::Isometry3<f32>;

/// Build a 4x4 TRS matrix from scale, rotation, and translation.
pub fn mat4_from_scale_rotation_translation(scale: Vec3, rotation: Quat, translation: Vec3) -> Mat4 {
    let m = rotation.to_rotation_matrix();
    let rm = m.matrix();
    #[rustfmt::skip]
    let result = Mat4::new(
        rm[(0, 0)] * scale.x, rm[(0, 1)] * scale.y, rm[(0, 2)] * scale.z, translation.x,
        rm[(1, 0)] * scale.x, rm[(1, 1)] * scale.y, rm[(1, 2)] * scale.z, translation.y,
        rm[(2, 0)] * scale.x, rm[(2, 1)] * scale.y, rm[(2, 2)] * scale.z, translation.z,
        0.0,                  0.0,                  0.0,                  1.0,
    );
    result
}

/// Build a right-handed perspective projection with depth range [0, 1].
pub fn perspective_rh(yfov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    let f = 1.0 / (yfov / 2.0).tan();
    let nf = 1.0 / (znear - zfar);
    #[rustfmt::skip]
    let result = Mat4::new(
        f / aspect, 0.0,  0.0,              0.0,
        0.0,        f,    0.0,              0.0,
        0.0,        0.0,  zfar * nf,        znear * zfar * nf,
        0.0,        0.0,  -1.0,             0.0,
    );
    result
}

/// Build a right-handed orthographic projection with depth range [0, 1].
pub fn orthographic_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let rml = right - left;
    let tmb = top - bottom;
    let fmn = far - near;
    #[rustfmt::skip]
    let result = Mat4::new(
        2.0 / rml, 0.0,       0.0,         -(right + left) / rml,
        0.0,       2.0 / tmb, 0.0,         -(top + bottom) / tmb,
        0.0,       0.0,       -1.0 / fmn,  -near / fmn,
        0.0,       0.0,       0.0,          1.0,
    );
    result
}

/// Quaternion from Euler angles given in degrees.
pub fn quat_from_euler_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler_angles(
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Euler angles in degrees from a quaternion.
///
/// Inverse of [`quat_from_euler_degrees`] while the Y angle stays inside
/// (-90, 90) degrees; outside that range an equivalent triple is returned.
pub fn euler_degrees_from_quat(rotation: &Quat) -> Vec3 {
    let (x, y, z) = rotation.euler_angles();
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Isometry placing `rotation` at `translation`.
pub fn isometry_from_parts(translation: Vec3, rotation: Quat) -> Isometry3 {
    Isometry3::from_parts(nalgebra::Translation3::from(translation), rotation)
}

/// Largest absolute component of a vector.
pub fn max_abs_component(v: &Vec3) -> f32 {
    v.x.abs().max(v.y.abs()).max(v.z.abs())
}

/// Component-wise product.
pub fn mul_components(a: &Vec3, b: &Vec3) -> Vec3 {
    a.component_mul(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_trs_matrix() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::new(1.0, 1.0, 1.0),
            Quat::identity(),
            Vec3::zeros(),
        );
        assert!((m - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn trs_matrix_applies_scale_before_rotation() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 1.0),
            Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_2),
            Vec3::new(0.0, 0.0, 5.0),
        );
        let p = m.transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn euler_degrees_roundtrip() {
        let degrees = Vec3::new(30.0, -45.0, 120.0);
        let q = quat_from_euler_degrees(degrees);
        let back = euler_degrees_from_quat(&q);
        assert_relative_eq!(back, degrees, epsilon = 1e-3);
    }

    #[test]
    fn euler_order_is_x_then_y_then_z() {
        let q = quat_from_euler_degrees(Vec3::new(90.0, 90.0, 0.0));
        let expected = Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2)
            * Quat::from_axis_angle(&Vec3::x_axis(), FRAC_PI_2);
        let v = Vec3::new(0.3, 0.5, 0.7);
        assert_relative_eq!(q * v, expected * v, epsilon = 1e-5);
    }

    #[test]
    fn rotation_y_90() {
        let q = quat_from_euler_degrees(Vec3::new(0.0, 90.0, 0.0));
        let v = q * Vec3::new(1.0, 0.0, 0.0);
        assert!((v.x - 0.0).abs() < 1e-5);
        assert!((v.z - (-1.0)).abs() < 1e-5);
    }

    #[test]
    fn isometry_places_origin_at_translation() {
        let iso = isometry_from_parts(Vec3::new(1.0, 2.0, 3.0), Quat::identity());
        let p = iso * nalgebra::Point3::origin();
        assert_relative_eq!(p.coords, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn max_abs_component_ignores_sign() {
        assert_eq!(max_abs_component(&Vec3::new(1.0, -3.0, 2.0)), 3.0);
    }

    #[test]
    fn perspective_maps_near_plane_to_zero_depth() {
        let m = perspective_rh(FRAC_PI_2, 1.0, 0.1, 100.0);
        let p = m * nalgebra::Vector4::new(0.0, 0.0, -0.1, 1.0);
        assert_relative_eq!(p.z / p.w, 0.0, epsilon = 1e-5);
    }
}
