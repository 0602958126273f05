//! Axis Aligned Bounding Boxes.

mod aabb_impl;
mod transform;

pub use aabb_impl::*;

use crate::Point3;

/// A trait implemented by things which can be bounded by an [`Aabb`].
///
/// # Examples
/// ```
/// use slab_bvh::aabb::{Aabb, Bounded};
/// use slab_bvh::{Point3, Vector3};
///
/// struct Sphere {
///     center: Point3,
///     radius: f32,
/// }
///
/// impl Bounded for Sphere {
///     fn aabb(&self) -> Aabb {
///         let half_size = Vector3::new(self.radius, self.radius, self.radius);
///         Aabb::with_bounds(self.center - half_size, self.center + half_size)
///     }
/// }
///
/// let sphere = Sphere { center: Point3::new(0.0, 0.0, 0.0), radius: 2.0 };
/// assert_eq!(sphere.aabb().size.x, 4.0);
/// ```
pub trait Bounded {
    /// Returns the geometric bounds of this object in the form of an [`Aabb`].
    fn aabb(&self) -> Aabb;
}

impl Bounded for Aabb {
    fn aabb(&self) -> Aabb {
        *self
    }
}

/// Implementation of [`Bounded`] for single points.
impl Bounded for Point3 {
    fn aabb(&self) -> Aabb {
        Aabb::with_bounds(*self, *self)
    }
}

impl<T: Bounded> Bounded for &T {
    fn aabb(&self) -> Aabb {
        T::aabb(self)
    }
}
