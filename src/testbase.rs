//! Common utilities shared by unit tests.
#![cfg(test)]

use std::collections::HashSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::{Hit, Intersection, SceneObject};
use crate::bvh::{Bvh, BvhNode};
use crate::ray::Ray;
use crate::{Point3, Real, Vector3};

/// A vector represented as a tuple
pub type TupleVec = (f32, f32, f32);

/// Generate a `TupleVec` for [`proptest::strategy::Strategy`] from -10e5 to 10e5.
/// Well inside the bounding code's working range, small enough that
/// lower-left/size rounding stays far below any test tolerance.
pub fn tuplevec_small_strategy() -> impl Strategy<Value = TupleVec> {
    (
        -10e5_f32..10e5_f32,
        -10e5_f32..10e5_f32,
        -10e5_f32..10e5_f32,
    )
}

/// Convert a `TupleVec` to a [`Point3`].
pub fn tuple_to_point(tpl: &TupleVec) -> Point3 {
    Point3::new(tpl.0, tpl.1, tpl.2)
}

/// Convert a `TupleVec` to a [`Vector3`].
pub fn tuple_to_vector(tpl: &TupleVec) -> Vector3 {
    Vector3::new(tpl.0, tpl.1, tpl.2)
}

/// Define some `Bounded` structure.
#[derive(Debug, Clone)]
pub struct UnitBox {
    pub id: i32,
    pub pos: Point3,
    pub infinite: bool,
}

impl UnitBox {
    pub fn new(id: i32, pos: Point3) -> UnitBox {
        UnitBox {
            id,
            pos,
            infinite: false,
        }
    }

    /// An unbounded stand-in, reporting the largest representable box.
    pub fn unbounded(id: i32) -> UnitBox {
        UnitBox {
            id,
            pos: Point3::origin(),
            infinite: true,
        }
    }
}

/// `UnitBox`'s `Aabb`s are unit `Aabb`s with their lower left corner on the box's position.
impl Bounded for UnitBox {
    fn aabb(&self) -> Aabb {
        if self.infinite {
            Aabb::infinite()
        } else {
            Aabb::new(self.pos, Vector3::new(1.0, 1.0, 1.0))
        }
    }
}

impl SceneObject for UnitBox {
    fn is_infinite(&self) -> bool {
        self.infinite
    }
}

/// Generate 21 `UnitBox`s along the X axis with their lower left corners on whole numbers
/// (-10,9,..,10). The id is set to that x-coordinate.
pub fn generate_aligned_boxes() -> Vec<UnitBox> {
    (-10..11)
        .map(|x| UnitBox::new(x, Point3::new(x as f32, 0.0, 0.0)))
        .collect()
}

/// Unit boxes at x = 0, 2, 4, ..., the payload is the id.
pub fn spaced_boxes(count: i32) -> Vec<(Aabb, i32)> {
    (0..count)
        .map(|i| {
            let unit = UnitBox::new(i, Point3::new(2.0 * i as f32, 0.0, 0.0));
            (unit.aabb(), unit.id)
        })
        .collect()
}

/// The collaborator used by most tests: a primitive is its own box and the hit is the
/// point where the ray enters it (or leaves it, for origins inside the box).
pub fn intersect_box(aabb: &Aabb, ray: &Ray) -> Option<Hit> {
    ray.intersection_slice_for_aabb(aabb).map(|(entry, exit)| {
        let depth = if entry > 0.0 { entry } else { exit };
        Hit::new(depth, ray.at(depth))
    })
}

/// Like [`intersect_box`], for primitives carrying their box next to an id.
pub fn intersect_tagged_box(primitive: &(Aabb, usize), ray: &Ray) -> Option<Hit> {
    intersect_box(&primitive.0, ray)
}

/// Generates `count` random boxes whose coordinates are multiples of a quarter, so that
/// every lower-left/size round trip is exact.
pub fn random_boxes(rng: &mut StdRng, count: usize) -> Vec<(Aabb, (Aabb, usize))> {
    fn quarter(rng: &mut StdRng, lo: i32, hi: i32) -> Real {
        rng.random_range(lo..hi) as Real / 4.0
    }

    (0..count)
        .map(|index| {
            let lower_left = Point3::new(
                quarter(rng, -400, 400),
                quarter(rng, -400, 400),
                quarter(rng, -400, 400),
            );
            let size = Vector3::new(
                quarter(rng, 1, 40),
                quarter(rng, 1, 40),
                quarter(rng, 1, 40),
            );
            let aabb = Aabb::new(lower_left, size);
            (aabb, (aabb, index))
        })
        .collect()
}

/// Generates a random ray starting outside the scene generated by [`random_boxes`],
/// aimed at a random point inside it.
pub fn random_ray(rng: &mut StdRng) -> Ray {
    fn coordinate(rng: &mut StdRng) -> Real {
        rng.random_range(-120.0..120.0)
    }

    let target = Point3::new(coordinate(rng), coordinate(rng), coordinate(rng));
    let origin = Point3::new(
        rng.random_range(-300.0..300.0),
        rng.random_range(-300.0..300.0),
        if rng.random_bool(0.5) { 250.0 } else { -250.0 },
    );
    Ray::new(origin, target - origin)
}

/// Deterministic generator for randomized scenes.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Linear scan over all primitives, the reference for [`Bvh::find_nearest`].
pub fn brute_force_nearest<'a>(
    primitives: &'a [(Aabb, (Aabb, usize))],
    ray: &Ray,
) -> Intersection<'a, (Aabb, usize)> {
    let mut best = Intersection::none();
    for (_, primitive) in primitives {
        if let Some(hit) = intersect_tagged_box(primitive, ray) {
            if hit.depth < best.depth {
                best = Intersection::new(hit, primitive);
            }
        }
    }
    best
}

/// Collects the payloads of all leaves of `bvh`, depth first.
pub fn collect_leaf_payloads<P: Clone>(bvh: &Bvh<P>) -> Vec<P> {
    bvh.leaves().map(|(_, payload)| payload.clone()).collect()
}

/// Asserts that the leaves of `bvh` reference each of `expected` exactly once.
pub fn assert_partition(bvh: &Bvh<i32>, expected: impl IntoIterator<Item = i32>) {
    let payloads = collect_leaf_payloads(bvh);
    let unique = payloads.iter().copied().collect::<HashSet<_>>();
    let expected = expected.into_iter().collect::<HashSet<_>>();

    assert_eq!(payloads.len(), unique.len(), "a primitive appears twice");
    assert_eq!(unique, expected);
}

/// Counts internal nodes and leaves.
pub fn count_nodes<P>(bvh: &Bvh<P>) -> (usize, usize) {
    bvh.nodes
        .iter()
        .fold((0, 0), |(internal, leaves), node| match node {
            BvhNode::Internal { .. } => (internal + 1, leaves),
            BvhNode::Leaf { .. } => (internal, leaves + 1),
        })
}
