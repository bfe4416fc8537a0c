use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};

use crate::util;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Aabb {
    /// The minimum corner
    pub min: Vec3,
    /// The maximum corner
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

impl Aabb {
    /// Create a new box from its corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a new box from its center and half extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// A cube with sides of length one, centered on the origin
    pub fn unit_cube() -> Self {
        Self::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Transform the box by `matrix`, returning the smallest axis-aligned box that contains the result.
    pub fn transform(&self, matrix: &Affine3A) -> Aabb {
        let center = matrix.transform_point3(self.center());
        let half_extents = self.half_extents();
        let m = matrix.matrix3;
        let extent = Vec3::from(m.x_axis.abs()) * half_extents.x
            + Vec3::from(m.y_axis.abs()) * half_extents.y
            + Vec3::from(m.z_axis.abs()) * half_extents.z;

        Aabb::from_center_half_extents(center, extent)
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }
}

/// A bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// The smallest sphere centered on `aabb` that contains all of its corners
    pub fn from_aabb(aabb: &Aabb) -> Self {
        let center = aabb.center();
        Self {
            center,
            radius: center.distance(aabb.max),
        }
    }

    /// Move the sphere's center by `matrix`. The radius only grows if `matrix` carries scale.
    pub fn transform(&self, matrix: &Affine3A) -> BoundingSphere {
        BoundingSphere {
            center: matrix.transform_point3(self.center),
            radius: self.radius * util::max_axis_scale(matrix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Quat;

    #[test]
    pub fn test_aabb_translate() {
        let aabb = Aabb::unit_cube();
        let world = aabb.transform(&Affine3A::from_translation([10.0, 0.0, 0.0].into()));
        assert_relative_eq!(world.center(), Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(world.half_extents(), Vec3::splat(0.5));
    }

    #[test]
    pub fn test_aabb_rotate() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        let rotated = aabb.transform(&Affine3A::from_quat(Quat::from_rotation_z(
            std::f32::consts::FRAC_PI_2,
        )));
        assert_relative_eq!(rotated.half_extents(), Vec3::new(1.0, 2.0, 1.0), epsilon = 1e-5);

        let diagonal = Aabb::unit_cube().transform(&Affine3A::from_quat(Quat::from_rotation_z(
            std::f32::consts::FRAC_PI_4,
        )));
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(diagonal.half_extents().x, expected, epsilon = 1e-5);
        assert_relative_eq!(diagonal.half_extents().z, 0.5, epsilon = 1e-5);
    }

    #[test]
    pub fn test_aabb_queries() {
        let a = Aabb::unit_cube();
        let b = Aabb::from_center_half_extents(Vec3::new(0.9, 0.0, 0.0), Vec3::splat(0.5));
        let c = Aabb::from_center_half_extents(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(0.5));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_point(Vec3::new(0.5, 0.5, -0.5)));
        assert!(!a.contains_point(Vec3::new(0.6, 0.0, 0.0)));
    }

    #[test]
    pub fn test_sphere() {
        let sphere = BoundingSphere::from_aabb(&Aabb::unit_cube());
        assert_relative_eq!(sphere.radius, 0.75f32.sqrt());

        let rotated = sphere.transform(&Affine3A::from_rotation_translation(
            Quat::from_rotation_x(1.0),
            [0.0, 3.0, 0.0].into(),
        ));
        assert_relative_eq!(rotated.center, Vec3::new(0.0, 3.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(rotated.radius, sphere.radius, epsilon = 1e-6);

        let scaled = sphere.transform(&Affine3A::from_scale(Vec3::splat(2.0)));
        assert_relative_eq!(scaled.radius, sphere.radius * 2.0, epsilon = 1e-6);
    }
}
