//! Axis Aligned Bounding Boxes.

use std::fmt;

use crate::aabb::Bounded;
use crate::axis::Axis;
use crate::utils::{fast_max, fast_min};
use crate::{Point3, Real, Vector3, BOUND_HUGE};

/// [`Aabb`] struct.
///
/// The box is stored as its lower left corner and its size along each axis, the same
/// layout the slab test consumes. A negative size on any axis marks the box as empty.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    /// Minimum coordinates
    pub lower_left: Point3,

    /// Extent along each axis
    pub size: Vector3,
}

impl fmt::Display for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (min, max) = (self.min(), self.max());
        write!(
            f,
            "Min bound: ({}, {}, {}); Max bound: ({}, {}, {})",
            min.x, min.y, min.z, max.x, max.y, max.z
        )
    }
}

impl Aabb {
    /// Creates a new [`Aabb`] from its lower left corner and its size.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let aabb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Vector3::new(2.0, 2.0, 2.0));
    /// assert_eq!(aabb.max(), Point3::new(1.0, 1.0, 1.0));
    /// ```
    pub fn new(lower_left: Point3, size: Vector3) -> Aabb {
        Aabb { lower_left, size }
    }

    /// Creates a new [`Aabb`] with the given bounds.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.lower_left, Point3::new(-1.0, -1.0, -1.0));
    /// assert_eq!(aabb.size, Vector3::new(2.0, 2.0, 2.0));
    /// ```
    pub fn with_bounds(min: Point3, max: Point3) -> Aabb {
        Aabb {
            lower_left: min,
            size: max - min,
        }
    }

    /// Creates a new empty [`Aabb`].
    ///
    /// Joining anything with it yields the other box unchanged.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    ///
    /// let aabb = Aabb::empty();
    /// assert!(aabb.is_empty());
    /// ```
    pub fn empty() -> Aabb {
        Aabb::with_bounds(
            Point3::new(BOUND_HUGE, BOUND_HUGE, BOUND_HUGE),
            Point3::new(-BOUND_HUGE, -BOUND_HUGE, -BOUND_HUGE),
        )
    }

    /// Creates the largest box the bounding code handles.
    /// Unbounded primitives report this as their [`Aabb`].
    pub fn infinite() -> Aabb {
        let half = BOUND_HUGE / 2.0;
        Aabb::with_bounds(
            Point3::new(-half, -half, -half),
            Point3::new(half, half, half),
        )
    }

    /// Returns the minimum corner.
    pub fn min(&self) -> Point3 {
        self.lower_left
    }

    /// Returns the maximum corner.
    pub fn max(&self) -> Point3 {
        self.lower_left + self.size
    }

    /// Returns the minimum coordinate along `axis`.
    pub fn min_on(&self, axis: Axis) -> Real {
        self.lower_left[axis]
    }

    /// Returns the maximum coordinate along `axis`.
    pub fn max_on(&self, axis: Axis) -> Real {
        self.lower_left[axis] + self.size[axis]
    }

    /// Returns true if any size component is negative.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let flat = Aabb::new(Point3::origin(), Vector3::new(1.0, 0.0, 1.0));
    /// let inverted = Aabb::new(Point3::origin(), Vector3::new(1.0, -1.0, 1.0));
    ///
    /// assert!(!flat.is_empty());
    /// assert!(inverted.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.size.x < 0.0 || self.size.y < 0.0 || self.size.z < 0.0
    }

    /// Returns true if the [`Point3`] is inside the [`Aabb`]. Bounds are inclusive.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    ///
    /// assert!(aabb.contains(&Point3::new(0.0, 1.0, -1.0)));
    /// assert!(!aabb.contains(&Point3::new(1.1, 0.0, 0.0)));
    /// ```
    pub fn contains(&self, p: &Point3) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| p[axis] >= self.min_on(axis) && p[axis] <= self.max_on(axis))
    }

    /// Returns true if the [`Point3`] is approximately inside the [`Aabb`]
    /// with respect to some `epsilon`.
    pub fn approx_contains_eps(&self, p: &Point3, epsilon: Real) -> bool {
        Axis::ALL.iter().all(|&axis| {
            (p[axis] - self.min_on(axis)) > -epsilon && (p[axis] - self.max_on(axis)) < epsilon
        })
    }

    /// Returns true if `other` lies approximately inside this [`Aabb`].
    pub fn approx_contains_aabb_eps(&self, other: &Aabb, epsilon: Real) -> bool {
        self.approx_contains_eps(&other.min(), epsilon)
            && self.approx_contains_eps(&other.max(), epsilon)
    }

    /// Returns true if both boxes have the same bounds within `epsilon`.
    pub fn relative_eq(&self, other: &Aabb, epsilon: Real) -> bool {
        let (min, max) = (self.min(), self.max());
        let (other_min, other_max) = (other.min(), other.max());
        Axis::ALL.iter().all(|&axis| {
            (min[axis] - other_min[axis]).abs() <= epsilon
                && (max[axis] - other_max[axis]).abs() <= epsilon
        })
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and `other`.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::Point3;
    ///
    /// let aabb1 = Aabb::with_bounds(Point3::new(-101.0, 0.0, 0.0), Point3::new(-100.0, 1.0, 1.0));
    /// let aabb2 = Aabb::with_bounds(Point3::new(100.0, 0.0, 0.0), Point3::new(101.0, 1.0, 1.0));
    /// let joint = aabb1.join(&aabb2);
    ///
    /// assert_eq!(joint.min(), Point3::new(-101.0, 0.0, 0.0));
    /// assert_eq!(joint.max(), Point3::new(101.0, 1.0, 1.0));
    /// ```
    pub fn join(&self, other: &Aabb) -> Aabb {
        let (min, max) = (self.min(), self.max());
        let (other_min, other_max) = (other.min(), other.max());
        Aabb::with_bounds(
            Point3::new(
                fast_min(min.x, other_min.x),
                fast_min(min.y, other_min.y),
                fast_min(min.z, other_min.z),
            ),
            Point3::new(
                fast_max(max.x, other_max.x),
                fast_max(max.y, other_max.y),
                fast_max(max.z, other_max.z),
            ),
        )
    }

    /// Mutable version of [`Aabb::join`].
    pub fn join_mut(&mut self, other: &Aabb) {
        *self = self.join(other);
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and the [`Point3`] `other`.
    pub fn grow(&self, other: &Point3) -> Aabb {
        self.join(&other.aabb())
    }

    /// Mutable version of [`Aabb::grow`].
    pub fn grow_mut(&mut self, other: &Point3) {
        *self = self.grow(other);
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and the [`Bounded`] `other`.
    pub fn join_bounded<T: Bounded>(&self, other: &T) -> Aabb {
        self.join(&other.aabb())
    }

    /// Returns the union of all boxes in `aabbs`, or [`Aabb::empty`] if there are none.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let boxes = (0..3).map(|i| Aabb::new(Point3::new(i as f32, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0)));
    /// let joint = Aabb::join_all(boxes);
    ///
    /// assert_eq!(joint.size, Vector3::new(3.0, 1.0, 1.0));
    /// ```
    pub fn join_all<I: IntoIterator<Item = Aabb>>(aabbs: I) -> Aabb {
        aabbs
            .into_iter()
            .fold(Aabb::empty(), |joint, aabb| joint.join(&aabb))
    }

    /// Returns the center [`Point3`] of the [`Aabb`].
    pub fn center(&self) -> Point3 {
        self.lower_left + self.size / 2.0
    }

    /// Returns twice the center coordinate along `axis`.
    /// Sorting by this value orders boxes by their midpoints without a division.
    pub fn midpoint(&self, axis: Axis) -> Real {
        2.0 * self.lower_left[axis] + self.size[axis]
    }

    /// Returns the total surface area of this [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let aabb = Aabb::new(Point3::origin(), Vector3::new(1.0, 2.0, 3.0));
    /// assert_eq!(aabb.surface_area(), 22.0);
    /// ```
    pub fn surface_area(&self) -> Real {
        let size = self.size;
        2.0 * (size.x * size.y + size.y * size.z + size.z * size.x)
    }

    /// Returns the volume of this [`Aabb`].
    pub fn volume(&self) -> Real {
        self.size.x * self.size.y * self.size.z
    }

    /// Returns the axis along which the [`Aabb`] is stretched the most.
    /// Ties are resolved in the order X, Y, Z.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::axis::Axis;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let cube = Aabb::new(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
    /// let tall = Aabb::new(Point3::origin(), Vector3::new(1.0, 5.0, 5.0));
    ///
    /// assert_eq!(cube.largest_axis(), Axis::X);
    /// assert_eq!(tall.largest_axis(), Axis::Y);
    /// ```
    pub fn largest_axis(&self) -> Axis {
        let mut which = Axis::X;
        let mut extent = self.size[Axis::X];
        for axis in [Axis::Y, Axis::Z] {
            if self.size[axis] > extent {
                extent = self.size[axis];
                which = axis;
            }
        }
        which
    }
}

/// Default instance for [`Aabb`]s. Returns an [`Aabb`] which is [`empty()`].
///
/// [`empty()`]: #method.empty
///
impl Default for Aabb {
    fn default() -> Aabb {
        Aabb::empty()
    }
}
