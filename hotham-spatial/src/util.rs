use glam::{Affine3A, Vec3};
use rapier3d::na;

use crate::{SpatialError, SpatialResult};

/// Smallest absolute determinant a transform may have before it is considered degenerate
pub const DEGENERATE_DETERMINANT: f32 = 1e-12;

/// Check that `matrix` is finite and invertible.
pub fn validate_matrix(matrix: &Affine3A) -> SpatialResult<()> {
    if !matrix.is_finite() {
        return Err(SpatialError::InvalidTransform("matrix is not finite"));
    }

    if matrix.matrix3.determinant().abs() < DEGENERATE_DETERMINANT {
        return Err(SpatialError::InvalidTransform("matrix is degenerate"));
    }

    Ok(())
}

/// Fatal in debug builds, compiled out in release.
#[inline]
pub(crate) fn assert_valid_matrix(matrix: &Affine3A) {
    #[cfg(debug_assertions)]
    if let Err(e) = validate_matrix(matrix) {
        panic!("{e}: {matrix:?}");
    }
    #[cfg(not(debug_assertions))]
    let _ = matrix;
}

/// Strip any scale or shear from `matrix`, leaving an orthonormal rotation and the original translation.
#[inline]
pub fn normalize(matrix: &Affine3A) -> Affine3A {
    let (_, rotation, translation) = matrix.to_scale_rotation_translation();
    Affine3A::from_rotation_translation(rotation.normalize(), translation)
}

/// Per-element comparison with a fixed absolute tolerance.
#[inline]
pub fn approx_eq(a: &Affine3A, b: &Affine3A, epsilon: f32) -> bool {
    a.abs_diff_eq(*b, epsilon)
}

/// The largest factor by which `matrix` can stretch a unit vector along one of its basis axes.
#[inline]
pub fn max_axis_scale(matrix: &Affine3A) -> f32 {
    let m = matrix.matrix3;
    m.x_axis
        .length()
        .max(m.y_axis.length())
        .max(m.z_axis.length())
}

#[inline]
/// Convert a [`glam::Affine3A`] into a [`rapier3d::na::Isometry3`]
pub fn isometry_from_affine(a: &Affine3A) -> na::Isometry3<f32> {
    let (_, r, t) = a.to_scale_rotation_translation();
    let translation = na::Translation3::new(t.x, t.y, t.z);

    let rotation: na::UnitQuaternion<f32> =
        na::UnitQuaternion::new_normalize(na::Quaternion::new(r.w, r.x, r.y, r.z));

    na::Isometry3::from_parts(translation, rotation)
}

#[inline]
/// Convert a [`rapier3d::na::Isometry3`] into a [`glam::Affine3A`]
pub fn affine_from_isometry(isometry: &na::Isometry3<f32>) -> Affine3A {
    let t = isometry.translation.vector;
    let r = isometry.rotation.quaternion();
    Affine3A::from_rotation_translation(
        glam::Quat::from_xyzw(r.i, r.j, r.k, r.w),
        Vec3::new(t.x, t.y, t.z),
    )
}
