//! This module defines the contract between the hierarchy and the code that owns the
//! primitives: hits reported by the intersection callback, the best-hit accumulator,
//! ray/object conditions and the [`SceneObject`] trait.

use crate::aabb::Bounded;
use crate::ray::Ray;
use crate::{Point3, Real, MAX_DISTANCE};

/// A hit reported by the primitive intersection callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Distance from the ray origin to the intersection point.
    pub depth: Real,

    /// The intersection point.
    pub point: Point3,
}

impl Hit {
    /// Constructs a [`Hit`].
    pub fn new(depth: Real, point: Point3) -> Hit {
        Hit { depth, point }
    }
}

/// The running best intersection of a query.
///
/// Owned by the caller. [`Bvh::find_nearest`] only replaces it with strictly closer hits,
/// so a caller can seed `depth` with a maximum distance to restrict a query, as shadow
/// rays do with the distance to the light.
///
/// [`Bvh::find_nearest`]: ../bvh/struct.Bvh.html#method.find_nearest
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a, P> {
    /// Distance from the ray origin to the intersection point.
    pub depth: Real,

    /// The intersection point. Meaningless while `object` is `None`.
    pub point: Point3,

    /// Payload of the primitive that was hit.
    pub object: Option<&'a P>,
}

impl<'a, P> Intersection<'a, P> {
    /// An accumulator that accepts any hit up to [`MAX_DISTANCE`].
    pub fn none() -> Self {
        Self::within(MAX_DISTANCE)
    }

    /// An accumulator that only accepts hits closer than `max_depth`.
    pub fn within(max_depth: Real) -> Self {
        Intersection {
            depth: max_depth,
            point: Point3::origin(),
            object: None,
        }
    }

    /// Constructs an [`Intersection`] of `object` from a [`Hit`].
    pub fn new(hit: Hit, object: &'a P) -> Self {
        Intersection {
            depth: hit.depth,
            point: hit.point,
            object: Some(object),
        }
    }

    /// Returns true if a primitive has been recorded.
    pub fn is_hit(&self) -> bool {
        self.object.is_some()
    }
}

impl<P> Default for Intersection<'_, P> {
    fn default() -> Self {
        Self::none()
    }
}

/// A predicate on a ray and a primitive, used to exclude primitives from a query
/// (for example objects that cast no shadow).
///
/// Closures of the form `Fn(&Ray, &P, Real) -> bool` implement this trait.
///
/// # Examples
/// ```
/// use slab_bvh::bounding_hierarchy::RayObjectCondition;
/// use slab_bvh::ray::Ray;
/// use slab_bvh::{Point3, Vector3};
///
/// let casts_shadow = |_: &Ray, object: &u32, _: f32| *object != 7;
/// let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));
///
/// assert!(casts_shadow.test(&ray, &3, 0.0));
/// assert!(!casts_shadow.test(&ray, &7, 0.0));
/// ```
pub trait RayObjectCondition<P> {
    /// Returns true if `object` takes part in the query of `ray`. `depth` is the distance
    /// of the candidate hit, or zero when tested before intersecting.
    fn test(&self, ray: &Ray, object: &P, depth: Real) -> bool;
}

impl<P, F> RayObjectCondition<P> for F
where
    F: Fn(&Ray, &P, Real) -> bool,
{
    fn test(&self, ray: &Ray, object: &P, depth: Real) -> bool {
        self(ray, object, depth)
    }
}

/// A [`RayObjectCondition`] that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTrue;

impl<P> RayObjectCondition<P> for AlwaysTrue {
    fn test(&self, _ray: &Ray, _object: &P, _depth: Real) -> bool {
        true
    }
}

/// A scene object that can be handed to [`Bvh::from_objects`].
///
/// Objects reporting [`is_infinite`] are exempted from bounding box culling and tested by
/// every query.
///
/// [`Bvh::from_objects`]: ../bvh/struct.Bvh.html#method.from_objects
/// [`is_infinite`]: #method.is_infinite
pub trait SceneObject: Bounded {
    /// Returns true for primitives of unbounded extent, like planes.
    fn is_infinite(&self) -> bool {
        false
    }
}
