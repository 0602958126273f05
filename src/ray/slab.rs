//! The slab test used to order nodes during best-first traversal.

use crate::aabb::Aabb;
use crate::axis::Axis;
use crate::bvh::BvhNode;
use crate::ray::Ray;
use crate::stats::TraversalStats;
use crate::{Point3, Real, Vector3, BOUND_HUGE, EPSILON, INFINITE_DEPTH};

/// Per-ray data precomputed once and reused by every slab test of a query.
///
/// A direction component that is zero (of either sign) marks the ray as parallel to
/// that axis' slab; its inverse is never used.
#[derive(Debug, Clone, Copy)]
pub struct RayInfo {
    /// The ray origin.
    pub origin: Point3,

    /// Inverse ray direction, only meaningful where `nonzero` is set.
    pub inv_direction: Vector3,

    /// Whether the direction has a non-zero component along each axis.
    pub nonzero: [bool; 3],

    /// Whether the direction points towards positive coordinates along each axis.
    pub positive: [bool; 3],
}

impl RayInfo {
    /// Precomputes the slab test data for `ray`.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::ray::{Ray, RayInfo};
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let ray = Ray::new(Point3::origin(), Vector3::new(-1.0, 0.0, -0.0));
    /// let info = RayInfo::new(&ray);
    ///
    /// assert_eq!(info.nonzero, [true, false, false]);
    /// assert_eq!(info.positive, [false, false, false]);
    /// ```
    pub fn new(ray: &Ray) -> RayInfo {
        let mut info = RayInfo {
            origin: ray.origin,
            inv_direction: Vector3::zeros(),
            nonzero: [false; 3],
            positive: [false; 3],
        };

        for axis in Axis::ALL {
            let d = ray.direction[axis];
            // `-0.0 != 0.0` is false, so both zeros count as parallel.
            if d != 0.0 {
                info.nonzero[axis as usize] = true;
                info.positive[axis as usize] = d > 0.0;
                info.inv_direction[axis] = 1.0 / d;
            }
        }

        info
    }

    /// Tests the ray against `aabb`.
    ///
    /// Returns the distance at which the ray enters the box, or `None` if it misses it.
    /// The entry distance is negative when the origin lies inside the box. Boxes whose far
    /// side lies closer than [`EPSILON`] to the origin, or behind it, are missed.
    /// Empty boxes are always missed.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::ray::{Ray, RayInfo};
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let ray = Ray::new(Point3::new(0.5, 0.5, -5.0), Vector3::new(0.0, 0.0, 1.0));
    /// let info = RayInfo::new(&ray);
    ///
    /// let ahead = Aabb::new(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
    /// let aside = Aabb::new(Point3::new(2.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
    ///
    /// assert_eq!(info.intersects(&ahead), Some(5.0));
    /// assert_eq!(info.intersects(&aside), None);
    /// ```
    pub fn intersects(&self, aabb: &Aabb) -> Option<Real> {
        if aabb.is_empty() {
            return None;
        }

        let mut dmin = -BOUND_HUGE;
        let mut dmax = BOUND_HUGE;

        for axis in Axis::ALL {
            let i = axis as usize;
            let lower = aabb.lower_left[axis];
            let size = aabb.size[axis];

            if !self.nonzero[i] {
                // Parallel to this slab: the origin has to lie between its planes.
                if self.origin[axis] < lower || self.origin[axis] > lower + size {
                    return None;
                }
                continue;
            }

            let inv = self.inv_direction[axis];
            let (tmin, tmax) = if self.positive[i] {
                let tmin = (lower - self.origin[axis]) * inv;
                (tmin, tmin + size * inv)
            } else {
                let tmax = (lower - self.origin[axis]) * inv;
                (tmax + size * inv, tmax)
            };

            if tmax < EPSILON {
                return None;
            }
            if tmax < dmax {
                dmax = tmax;
            }
            if tmin > dmin {
                dmin = tmin;
            }
            if dmin > dmax {
                return None;
            }
        }

        Some(dmin)
    }

    /// Returns the queue priority of `node`, or `None` if the ray misses it.
    ///
    /// Infinite nodes skip the slab test and always report [`INFINITE_DEPTH`], so they are
    /// expanded before anything else. Tests of finite nodes are counted in `stats`.
    pub fn check_node<P>(&self, node: &BvhNode<P>, stats: &mut TraversalStats) -> Option<Real> {
        if node.is_infinite() {
            return Some(INFINITE_DEPTH);
        }

        stats.ray_box_tests += 1;
        let depth = self.intersects(node.aabb());
        if depth.is_some() {
            stats.ray_box_tests_succeeded += 1;
        }
        depth
    }
}
