//! A crate which exports rays, axis-aligned bounding boxes, and an n-ary
//! bounding volume hierarchy with best-first nearest-hit traversal.
//!
//! ## About
//!
//! This crate can be used for applications which need the closest intersection of a ray
//! with a scene made of many primitives. The [`Bvh`] is built once with a surface area
//! heuristic median-cut, grouping up to four primitives per node, and is then shared
//! read-only by any number of worker threads. Each query expands the node whose bounding
//! box is closest to the ray origin first and stops as soon as no queued box can contain
//! a closer hit than the best one found so far.
//!
//! Primitives whose extent is unbounded (planes, for example) can be handed to the builder
//! separately. They are never culled and are tested by every query.
//!
//! ## Example
//!
//! ```
//! use slab_bvh::aabb::Aabb;
//! use slab_bvh::bounding_hierarchy::{Hit, Intersection};
//! use slab_bvh::bvh::Bvh;
//! use slab_bvh::ray::Ray;
//! use slab_bvh::{Point3, Vector3};
//!
//! // Four unit boxes on the x axis, the payload is the box itself.
//! let boxes = (0..4)
//!     .map(|i| {
//!         let aabb = Aabb::new(Point3::new(2.0 * i as f32, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
//!         (aabb, aabb)
//!     })
//!     .collect::<Vec<_>>();
//!
//! let bvh = Bvh::build(boxes, Vec::new()).unwrap();
//!
//! let ray = Ray::new(Point3::new(10.0, 0.5, 0.5), Vector3::new(-1.0, 0.0, 0.0));
//! let mut best = Intersection::none();
//! let found = bvh.find_nearest(&ray, &mut best, |aabb: &Aabb, ray: &Ray| {
//!     ray.intersection_slice_for_aabb(aabb)
//!         .map(|(entry, _)| Hit::new(entry, ray.at(entry)))
//! });
//!
//! assert!(found);
//! assert_eq!(best.object.unwrap().min().x, 6.0);
//! ```
//!
//! ## Features
//!
//! - `rayon` (default **enabled**) - sorts large candidate ranges in parallel while building
//! - `serde` (default **disabled**) - adds `Serialize` and `Deserialize` implementations for some types
//! - `demo` (default **disabled**) - builds the `slab-bvh-demo` binary
//!

/// Float type used by this crate.
pub type Real = f32;

/// Point math type used by this crate. Type alias for [`nalgebra::Point3`].
pub type Point3 = nalgebra::Point3<Real>;

/// Vector math type used by this crate. Type alias for [`nalgebra::Vector3`].
pub type Vector3 = nalgebra::Vector3<Real>;

/// Affine transformation type used by this crate. Type alias for [`nalgebra::Affine3`].
pub type Affine3 = nalgebra::Affine3<Real>;

/// A minimal floating value used as a lower bound.
/// A far slab plane closer than this to the ray origin counts as behind it.
pub const EPSILON: Real = 1.0e-5;

/// Largest coordinate magnitude handled by the bounding code.
pub const BOUND_HUGE: Real = 2.0e10;

/// The largest hit distance a query can report.
pub const MAX_DISTANCE: Real = 1.0e7;

/// Queue priority of infinite nodes. Lower than any distance the slab test can produce.
pub const INFINITE_DEPTH: Real = Real::NEG_INFINITY;

pub mod aabb;
pub mod axis;
pub mod bounding_hierarchy;
pub mod bvh;
pub mod error;
pub mod ray;
pub mod stats;
mod utils;

#[cfg(test)]
mod testbase;

pub use crate::bvh::Bvh;
pub use crate::error::BuildError;
