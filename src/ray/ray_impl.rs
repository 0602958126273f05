//! This module defines a Ray structure and a distance-reporting intersection
//! with axis aligned bounding boxes.

use crate::aabb::Aabb;
use crate::axis::Axis;
use crate::utils::{fast_max, fast_min};
use crate::{Point3, Real, Vector3};

/// A struct which defines a ray and some of its cached values.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ray {
    /// The ray origin.
    pub origin: Point3,

    /// The ray direction.
    pub direction: Vector3,

    /// Inverse (1/x) ray direction. Cached for use in [`Aabb`] intersections.
    /// Components along which the ray does not move are infinite and never used.
    pub inv_direction: Vector3,
}

impl Ray {
    /// Creates a new [`Ray`] from an `origin` and a `direction`.
    /// `direction` will be normalized.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::ray::Ray;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let origin = Point3::new(0.0, 0.0, 0.0);
    /// let direction = Vector3::new(2.0, 0.0, 0.0);
    /// let ray = Ray::new(origin, direction);
    ///
    /// assert_eq!(ray.origin, origin);
    /// assert_eq!(ray.direction, Vector3::new(1.0, 0.0, 0.0));
    /// ```
    pub fn new(origin: Point3, direction: Vector3) -> Ray {
        let direction = direction.normalize();
        Ray {
            origin,
            direction,
            inv_direction: direction.map(|x| 1.0 / x),
        }
    }

    /// Returns the point at distance `depth` along the ray.
    pub fn at(&self, depth: Real) -> Point3 {
        self.origin + self.direction * depth
    }

    /// Intersect [`Aabb`] by [`Ray`].
    /// Returns the distance from the origin to the nearest and to the farthest
    /// intersection point, or `None` if the ray misses the box. The nearest distance is
    /// clamped to zero when the origin lies inside the box.
    ///
    /// Unlike [`RayInfo::intersects`], which only orders nodes, this is meant for
    /// primitive intersection code and reports where the ray leaves the box as well.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::ray::Ray;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let ray = Ray::new(Point3::new(0.0, 0.5, 0.5), Vector3::new(1.0, 0.0, 0.0));
    /// let aabb = Aabb::with_bounds(Point3::new(10.0, 0.0, 0.0), Point3::new(12.0, 1.0, 1.0));
    ///
    /// assert_eq!(ray.intersection_slice_for_aabb(&aabb), Some((10.0, 12.0)));
    /// ```
    ///
    /// [`RayInfo::intersects`]: struct.RayInfo.html#method.intersects
    pub fn intersection_slice_for_aabb(&self, aabb: &Aabb) -> Option<(Real, Real)> {
        let mut entry_distance = Real::NEG_INFINITY;
        let mut exit_distance = Real::INFINITY;

        for axis in Axis::ALL {
            let (min, max) = (aabb.min_on(axis), aabb.max_on(axis));
            if self.direction[axis] == 0.0 {
                if self.origin[axis] < min || self.origin[axis] > max {
                    return None;
                }
                continue;
            }

            let t1 = (min - self.origin[axis]) * self.inv_direction[axis];
            let t2 = (max - self.origin[axis]) * self.inv_direction[axis];
            entry_distance = fast_max(entry_distance, fast_min(t1, t2));
            exit_distance = fast_min(exit_distance, fast_max(t1, t2));
        }

        // no intersection
        if entry_distance > exit_distance || exit_distance < 0.0 {
            return None;
        }

        Some((fast_max(entry_distance, 0.0), exit_distance))
    }
}
