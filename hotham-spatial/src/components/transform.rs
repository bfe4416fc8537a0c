use glam::{Affine3A, Vec3};

use super::bounds::{Aabb, BoundingSphere};
use crate::{collaborators::Bindings, util};

/// Component holding an object's position in the scene.
///
/// A `Transform` owns both the object's local matrix (relative to its [`super::Parent`], or to
/// the world if it has none) and its world matrix, along with the object's bounds in both spaces.
/// The world matrix and world bounds are derived: they are only ever written by
/// [`crate::SpatialContext`], which keeps them consistent with the local matrix and the parent's
/// world matrix after every operation.
///
/// To move an object, call [`crate::SpatialContext::set_world_matrix`]. Writing to the local
/// matrix directly is not supported as nothing would be notified.
#[derive(Debug, Clone)]
pub struct Transform {
    pub(crate) local: Affine3A,
    pub(crate) world: Affine3A,
    pub(crate) previous_parent_world: Affine3A,
    pub(crate) scale: Option<f32>,

    pub(crate) local_aabb: Aabb,
    pub(crate) local_sphere: BoundingSphere,
    pub(crate) world_aabb: Aabb,
    pub(crate) world_sphere: BoundingSphere,

    pub(crate) local_matrix_changed: bool,
    normalized_inverse_dirty: bool,
    inverse_scaled_dirty: bool,
    normalized_inverse: Affine3A,
    inverse_scaled: Affine3A,

    pub(crate) bindings: Bindings,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Affine3A::IDENTITY)
    }
}

impl Transform {
    /// Create a new transform with the given local matrix
    pub fn new(local: Affine3A) -> Self {
        Self {
            local,
            world: local,
            previous_parent_world: Affine3A::IDENTITY,
            scale: None,
            local_aabb: Default::default(),
            local_sphere: Default::default(),
            world_aabb: Default::default(),
            world_sphere: Default::default(),
            local_matrix_changed: true,
            normalized_inverse_dirty: true,
            inverse_scaled_dirty: true,
            normalized_inverse: Affine3A::IDENTITY,
            inverse_scaled: Affine3A::IDENTITY,
            bindings: Default::default(),
        }
    }

    /// Convenience function to create a transform at `translation`
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(Affine3A::from_translation(translation))
    }

    /// Set the local bounds before the transform is attached
    pub fn with_local_aabb(mut self, aabb: Aabb) -> Self {
        self.set_local_bounds(aabb);
        self.world_aabb = aabb.transform(&self.world);
        self.world_sphere = self.local_sphere.transform(&self.world);
        self
    }

    /// Set a uniform scale override before the transform is attached
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn local(&self) -> &Affine3A {
        &self.local
    }

    pub fn world(&self) -> &Affine3A {
        &self.world
    }

    /// The parent world matrix this transform was last composed with
    pub fn previous_parent_world(&self) -> &Affine3A {
        &self.previous_parent_world
    }

    /// Convenience function to get the world space translation
    pub fn translation(&self) -> Vec3 {
        self.world.translation.into()
    }

    pub fn scale(&self) -> Option<f32> {
        self.scale
    }

    /// Override the scale applied to matrices passed to [`crate::SpatialContext::set_world_matrix`].
    /// Takes effect on the next call.
    pub fn set_scale(&mut self, scale: Option<f32>) {
        self.scale = scale;
    }

    pub fn local_aabb(&self) -> &Aabb {
        &self.local_aabb
    }

    pub fn local_bounding_sphere(&self) -> &BoundingSphere {
        &self.local_sphere
    }

    pub fn world_aabb(&self) -> &Aabb {
        &self.world_aabb
    }

    pub fn world_bounding_sphere(&self) -> &BoundingSphere {
        &self.world_sphere
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Whether the local matrix changed since the world matrix was last composed
    pub fn is_local_matrix_changed(&self) -> bool {
        self.local_matrix_changed
    }

    pub fn is_normalized_inverse_dirty(&self) -> bool {
        self.normalized_inverse_dirty
    }

    pub fn is_inverse_scaled_dirty(&self) -> bool {
        self.inverse_scaled_dirty
    }

    /// Inverse of the world matrix with any scale removed, recomputed only after the world matrix changed
    pub fn world_normalized_inverse(&mut self) -> Affine3A {
        if self.normalized_inverse_dirty {
            self.normalized_inverse = util::normalize(&self.world).inverse();
            self.normalized_inverse_dirty = false;
        }
        self.normalized_inverse
    }

    /// Inverse of the world matrix including its scale, recomputed only after the world matrix changed
    pub fn world_inverse(&mut self) -> Affine3A {
        if self.inverse_scaled_dirty {
            self.inverse_scaled = self.world.inverse();
            self.inverse_scaled_dirty = false;
        }
        self.inverse_scaled
    }

    pub(crate) fn mark_inverses_dirty(&mut self) {
        self.normalized_inverse_dirty = true;
        self.inverse_scaled_dirty = true;
    }

    pub(crate) fn set_local_bounds(&mut self, aabb: Aabb) {
        self.local_aabb = aabb;
        self.local_sphere = BoundingSphere::from_aabb(&aabb);
    }

    /// Recompute the world bounds from the local bounds and the current world matrix
    pub(crate) fn update_world_volume(&mut self) {
        self.world_aabb = self.local_aabb.transform(&self.world);
        self.world_sphere = self.local_sphere.transform(&self.world);
    }

    /// Apply the scale override, if any, to a requested world matrix
    pub(crate) fn apply_scale(&self, matrix: Affine3A) -> Affine3A {
        match self.scale {
            Some(scale) => util::normalize(&matrix) * Affine3A::from_scale(Vec3::splat(scale)),
            None => matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Quat;

    #[test]
    pub fn test_apply_scale() {
        let transform = Transform::default().with_scale(2.0);
        let rotation = Quat::from_rotation_z(0.7);
        let requested = Affine3A::from_scale_rotation_translation(
            Vec3::new(5.0, 1.0, 3.0),
            rotation,
            [1.0, 2.0, 3.0].into(),
        );
        let expected = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.0),
            rotation,
            [1.0, 2.0, 3.0].into(),
        );
        assert_relative_eq!(transform.apply_scale(requested), expected, epsilon = 1e-5);

        let unscaled = Transform::default();
        assert_eq!(unscaled.apply_scale(requested), requested);
    }

    #[test]
    pub fn test_lazy_inverses() {
        let mut transform = Transform::new(Affine3A::from_scale_rotation_translation(
            Vec3::splat(3.0),
            Quat::IDENTITY,
            [1.0, 0.0, 0.0].into(),
        ));
        assert!(transform.is_inverse_scaled_dirty());

        let inverse = transform.world_inverse();
        assert!(!transform.is_inverse_scaled_dirty());
        assert_relative_eq!(
            inverse.transform_point3(Vec3::new(4.0, 0.0, 0.0)),
            Vec3::new(1.0, 0.0, 0.0),
            epsilon = 1e-5
        );

        let normalized_inverse = transform.world_normalized_inverse();
        assert!(!transform.is_normalized_inverse_dirty());
        assert_relative_eq!(
            normalized_inverse.transform_point3(Vec3::new(4.0, 0.0, 0.0)),
            Vec3::new(3.0, 0.0, 0.0),
            epsilon = 1e-5
        );

        transform.mark_inverses_dirty();
        assert!(transform.is_inverse_scaled_dirty());
        assert!(transform.is_normalized_inverse_dirty());
    }

    #[test]
    pub fn test_with_local_aabb() {
        let transform = Transform::from_translation([10.0, 0.0, 0.0].into())
            .with_local_aabb(Aabb::unit_cube());
        assert_relative_eq!(transform.world_aabb().center(), Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(
            transform.world_bounding_sphere().center,
            Vec3::new(10.0, 0.0, 0.0)
        );
        assert_relative_eq!(
            transform.local_bounding_sphere().radius,
            transform.world_bounding_sphere().radius
        );
    }
}
