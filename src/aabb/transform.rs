//! Bounds of transformed boxes.

use crate::aabb::Aabb;
use crate::utils::{fast_max, fast_min};
use crate::{Affine3, Point3, Real, Vector3, BOUND_HUGE};

impl Aabb {
    /// Returns the [`Aabb`] of this box after applying `transform`.
    ///
    /// The result encloses all eight transformed corners and is clipped to the range of
    /// [`Aabb::infinite`].
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::{Affine3, Point3, Vector3};
    /// use nalgebra::Matrix4;
    ///
    /// let translation = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
    /// let aabb = Aabb::new(Point3::origin(), Vector3::new(1.0, 2.0, 3.0));
    /// let moved = aabb.transformed(&Affine3::from_matrix_unchecked(translation));
    ///
    /// assert_eq!(moved.min(), Point3::new(1.0, 0.0, 0.0));
    /// assert_eq!(moved.size, Vector3::new(1.0, 2.0, 3.0));
    /// ```
    pub fn transformed(&self, transform: &Affine3) -> Aabb {
        self.map_corners(|corner| transform.transform_point(corner))
    }

    /// Returns the [`Aabb`] of this box after applying the inverse of `transform`.
    ///
    /// Objects stored in their own coordinate frame use this to bound a box given in
    /// world coordinates.
    pub fn inverse_transformed(&self, transform: &Affine3) -> Aabb {
        self.map_corners(|corner| transform.inverse_transform_point(corner))
    }

    fn map_corners(&self, map: impl Fn(&Point3) -> Point3) -> Aabb {
        let mut min = Point3::new(BOUND_HUGE, BOUND_HUGE, BOUND_HUGE);
        let mut max = Point3::new(-BOUND_HUGE, -BOUND_HUGE, -BOUND_HUGE);

        for i in 0..8 {
            let offset = Vector3::new(
                if i & 1 != 0 { self.size.x } else { 0.0 },
                if i & 2 != 0 { self.size.y } else { 0.0 },
                if i & 4 != 0 { self.size.z } else { 0.0 },
            );
            let corner = map(&(self.lower_left + offset));
            min = min.inf(&corner);
            max = max.sup(&corner);
        }

        let limit = BOUND_HUGE / 2.0;
        let clip_min = |v: Real| fast_max(v, -limit);
        let clip_max = |v: Real| fast_min(v, limit);
        Aabb::with_bounds(min.map(clip_min), max.map(clip_max))
    }
}
