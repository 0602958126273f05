#![no_main]
use std::fmt::{self, Debug, Formatter};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nalgebra::SimdPartialOrd;
use ordered_float::NotNan;
use slab_bvh::aabb::{Aabb, Bounded};
use slab_bvh::bounding_hierarchy::{Hit, Intersection};
use slab_bvh::bvh::{BuildOptions, Bvh, TraversalContext};
use slab_bvh::ray::Ray;
use slab_bvh::{Point3, Vector3};

type Float = f32;
const LIMIT: Float = 1_000_000.0;

fuzz_target!(|workload: Workload| {
    workload.fuzz();
});

#[derive(Arbitrary)]
struct ArbitraryPoint {
    coordinates: [NotNan<Float>; 3],
}

impl ArbitraryPoint {
    fn point(&self) -> Point3 {
        nalgebra::Point3::<NotNan<Float>>::from_slice(&self.coordinates)
            .map(|f| f.into_inner().clamp(-LIMIT, LIMIT))
    }
}

#[derive(Arbitrary)]
struct ArbitraryShape {
    a: ArbitraryPoint,
    b: ArbitraryPoint,
    infinite: bool,
}

impl Debug for ArbitraryShape {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.aabb(), f)
    }
}

impl Bounded for ArbitraryShape {
    fn aabb(&self) -> Aabb {
        if self.infinite {
            return Aabb::infinite();
        }

        let mut a = self.a.point();
        let b = self.b.point();

        // Ensure some separation.
        a.iter_mut().enumerate().for_each(|(i, a)| {
            if *a == b[i] {
                *a += 1.0;
            }
        });

        Aabb::with_bounds(a.simd_min(b), a.simd_max(b))
    }
}

#[derive(Arbitrary)]
struct ArbitraryRay {
    origin: ArbitraryPoint,
    destination: ArbitraryPoint,
}

impl Debug for ArbitraryRay {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.ray(), f)
    }
}

impl ArbitraryRay {
    fn ray(&self) -> Ray {
        let mut direction: Vector3 = self.destination.point() - self.origin.point();
        // Ensure no degenerate direction.
        if direction.magnitude() < 0.5 || direction.iter().any(|f| f.is_nan()) {
            direction = Vector3::new(1.0, 1.0, 1.0);
        }
        Ray::new(self.origin.point(), direction)
    }
}

#[derive(Debug, Arbitrary)]
struct Workload {
    shapes: Vec<ArbitraryShape>,
    rays: Vec<ArbitraryRay>,
    fan_out: u8,
}

/// A finite shape is hit where its box is entered, an infinite one never.
fn intersect(shape: &(Aabb, bool), ray: &Ray) -> Option<Hit> {
    if shape.1 {
        return None;
    }
    ray.intersection_slice_for_aabb(&shape.0)
        .map(|(entry, _)| Hit::new(entry, ray.at(entry)))
}

impl Workload {
    fn fuzz(self) {
        let (infinite, finite): (Vec<_>, Vec<_>) = self
            .shapes
            .iter()
            .map(|shape| (shape.aabb(), shape.infinite))
            .partition(|(_, infinite)| *infinite);
        let all = finite.iter().chain(&infinite).copied().collect::<Vec<_>>();

        let options = BuildOptions {
            fan_out: self.fan_out as usize,
            ..BuildOptions::default()
        };
        let bvh = match Bvh::try_build(
            finite.iter().map(|&(aabb, inf)| (aabb, (aabb, inf))).collect(),
            infinite.iter().map(|&(aabb, inf)| (aabb, (aabb, inf))).collect(),
            &options,
        )
        .unwrap()
        {
            Some(bvh) => bvh,
            None => {
                assert!(self.shapes.is_empty());
                return;
            }
        };

        // Check that these don't panic.
        bvh.assert_tight();
        bvh.assert_consistent();
        assert_eq!(bvh.leaves().count(), self.shapes.len());

        let mut context = TraversalContext::new();
        for ray in &self.rays {
            let ray = ray.ray();

            let mut expected = Intersection::none();
            for shape in &all {
                if let Some(hit) = intersect(shape, &ray) {
                    if hit.depth < expected.depth {
                        expected = Intersection::new(hit, shape);
                    }
                }
            }

            let mut visited_infinite = 0;
            let mut best = Intersection::none();
            bvh.find_nearest_with_context(&mut context, &ray, &mut best, |shape, ray| {
                if shape.1 {
                    visited_infinite += 1;
                }
                intersect(shape, ray)
            });

            assert_eq!(visited_infinite, infinite.len());
            if best.is_hit() && expected.is_hit() {
                let tolerance = 1e-3 * expected.depth.abs().max(1.0);
                assert!(
                    best.depth <= expected.depth + tolerance,
                    "bvh={} brute force={}",
                    best.depth,
                    expected.depth
                );
            }
        }
    }
}
