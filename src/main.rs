//! Traces a grid of primary rays through a random scene of spheres above a ground plane
//! and reports how much work the hierarchy saved.
//!
//! Usage: `slab-bvh-demo [SPHERES] [RESOLUTION]`. Set `RUST_LOG=debug` to see the build
//! summary.

use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use slab_bvh::aabb::{Aabb, Bounded};
use slab_bvh::bounding_hierarchy::{Hit, Intersection, SceneObject};
use slab_bvh::bvh::{Bvh, TraversalContext};
use slab_bvh::ray::Ray;
use slab_bvh::stats::TraversalStats;
use slab_bvh::{Point3, Real, Vector3, EPSILON};

#[derive(Debug)]
enum Shape {
    Sphere { center: Point3, radius: Real },
    /// The plane `y = height`.
    Ground { height: Real },
}

impl Bounded for Shape {
    fn aabb(&self) -> Aabb {
        match self {
            Shape::Sphere { center, radius } => {
                let half_size = Vector3::new(*radius, *radius, *radius);
                Aabb::with_bounds(center - half_size, center + half_size)
            }
            Shape::Ground { .. } => Aabb::infinite(),
        }
    }
}

impl SceneObject for Shape {
    fn is_infinite(&self) -> bool {
        matches!(self, Shape::Ground { .. })
    }
}

impl Shape {
    fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let depth = match self {
            Shape::Sphere { center, radius } => {
                let to_center = center - ray.origin;
                let along = to_center.dot(&ray.direction);
                let discriminant = along * along - to_center.norm_squared() + radius * radius;
                if discriminant < 0.0 {
                    return None;
                }
                let root = discriminant.sqrt();
                if along - root > EPSILON {
                    along - root
                } else {
                    along + root
                }
            }
            Shape::Ground { height } => {
                if ray.direction.y == 0.0 {
                    return None;
                }
                (height - ray.origin.y) / ray.direction.y
            }
        };

        if depth > EPSILON {
            Some(Hit::new(depth, ray.at(depth)))
        } else {
            None
        }
    }
}

fn random_scene(count: usize, rng: &mut StdRng) -> Vec<Shape> {
    let mut scene = vec![Shape::Ground { height: 0.0 }];
    scene.extend((0..count).map(|_| Shape::Sphere {
        center: Point3::new(
            rng.random_range(-100.0..100.0),
            rng.random_range(0.5..20.0),
            rng.random_range(-100.0..100.0),
        ),
        radius: rng.random_range(0.1..1.5),
    }));
    scene
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let count = args.next().and_then(|a| a.parse().ok()).unwrap_or(10_000);
    let resolution: usize = args.next().and_then(|a| a.parse().ok()).unwrap_or(256);

    let mut rng = StdRng::seed_from_u64(0);
    let scene = random_scene(count, &mut rng);

    let start = Instant::now();
    let bvh = match Bvh::from_objects(&scene) {
        Some(bvh) => bvh,
        None => {
            info!("empty scene, nothing to trace");
            return;
        }
    };
    info!(
        "built hierarchy over {} objects in {:?}, depth {}",
        scene.len(),
        start.elapsed(),
        bvh.depth()
    );

    let eye = Point3::new(0.0, 10.0, -150.0);
    let start = Instant::now();
    let (hits, stats) = (0..resolution)
        .into_par_iter()
        .map(|row| {
            let mut context = TraversalContext::new();
            let mut hits = 0usize;
            for column in 0..resolution {
                let u = column as Real / resolution as Real - 0.5;
                let v = 0.5 - row as Real / resolution as Real;
                let ray = Ray::new(eye, Vector3::new(u, v * 0.75, 1.0));

                let mut best = Intersection::none();
                if bvh.find_nearest_with_context(&mut context, &ray, &mut best, |&index, ray| {
                    scene[index].intersect(ray)
                }) {
                    hits += 1;
                }
            }
            (hits, context.stats)
        })
        .reduce(
            || (0, TraversalStats::default()),
            |(hits_a, stats_a), (hits_b, stats_b)| (hits_a + hits_b, stats_a + stats_b),
        );

    info!(
        "traced {} rays in {:?}, {} hit something",
        resolution * resolution,
        start.elapsed(),
        hits
    );
    info!("{}", stats);
    info!(
        "{:.2} primitive tests per ray, a linear scan needs {}",
        stats.primitive_tests as f64 / stats.queries.max(1) as f64,
        scene.len()
    );
}
