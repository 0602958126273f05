//! Best-first nearest hit queries.
//!
//! Nodes are expanded in order of the distance at which the ray enters their box. The
//! query ends once the closest queued box lies beyond the best hit found so far, since no
//! primitive inside it can produce a closer one.

use std::cell::RefCell;

use crate::bounding_hierarchy::{AlwaysTrue, Hit, Intersection, RayObjectCondition};
use crate::bvh::{Bvh, BvhNode, PriorityQueue};
use crate::ray::{Ray, RayInfo};
use crate::stats::TraversalStats;

thread_local! {
    /// Thread local pool of contexts for queries that do not bring their own
    static CONTEXTS: RefCell<Vec<TraversalContext>> = RefCell::new(Default::default());
}

/// Per-worker query state: the priority queue and the statistics counters.
///
/// A context may be reused for any number of queries against any [`Bvh`], but must not be
/// shared by two queries running at the same time. Give each worker thread its own and
/// merge their [`stats`](TraversalContext::stats) when reporting.
#[derive(Debug, Clone, Default)]
pub struct TraversalContext {
    /// Queue of nodes whose box the current ray enters.
    pub queue: PriorityQueue,

    /// Counters accumulated over all queries run with this context.
    pub stats: TraversalStats,
}

impl TraversalContext {
    /// Creates a context with an empty queue and zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counters accumulated so far and resets them.
    pub fn take_stats(&mut self) -> TraversalStats {
        std::mem::take(&mut self.stats)
    }
}

/// Returns and resets the counters of the queries this thread ran through
/// [`Bvh::find_nearest`].
pub fn take_thread_stats() -> TraversalStats {
    CONTEXTS.with(|pool| {
        pool.borrow_mut()
            .iter_mut()
            .map(TraversalContext::take_stats)
            .sum()
    })
}

impl<P> Bvh<P> {
    /// Finds the primitive closest to the origin of `ray`.
    ///
    /// `intersect` is called for the payload of each leaf whose box the ray enters, in
    /// order of increasing entry distance, until no remaining box can contain a hit closer
    /// than `best`. A hit replaces `best` only if it is strictly closer. Returns true if
    /// `best` was replaced.
    ///
    /// The queue comes from a thread local pool, so this can be called from any number of
    /// threads at once, and from inside `intersect` itself.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::Aabb;
    /// use slab_bvh::bounding_hierarchy::{Hit, Intersection};
    /// use slab_bvh::bvh::Bvh;
    /// use slab_bvh::ray::Ray;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// let floor = Aabb::new(Point3::new(-10.0, -1.0, -10.0), Vector3::new(20.0, 1.0, 20.0));
    /// let bvh = Bvh::build(vec![(floor, "floor")], Vec::new()).unwrap();
    ///
    /// let ray = Ray::new(Point3::new(0.0, 5.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
    /// let mut best = Intersection::none();
    /// bvh.find_nearest(&ray, &mut best, |_: &&str, ray: &Ray| {
    ///     let (entry, _) = ray.intersection_slice_for_aabb(&floor)?;
    ///     Some(Hit::new(entry, ray.at(entry)))
    /// });
    ///
    /// assert_eq!(best.object, Some(&"floor"));
    /// assert_eq!(best.depth, 5.0);
    /// ```
    pub fn find_nearest<'a>(
        &'a self,
        ray: &Ray,
        best: &mut Intersection<'a, P>,
        intersect: impl FnMut(&P, &Ray) -> Option<Hit>,
    ) -> bool {
        let mut context = CONTEXTS
            .with(|pool| pool.borrow_mut().pop())
            .unwrap_or_default();
        let found = self.find_nearest_with_context(&mut context, ray, best, intersect);

        CONTEXTS.with(|pool| pool.borrow_mut().push(context));
        found
    }

    /// Like [`find_nearest`](Bvh::find_nearest), using the queue and counters of `context`.
    pub fn find_nearest_with_context<'a>(
        &'a self,
        context: &mut TraversalContext,
        ray: &Ray,
        best: &mut Intersection<'a, P>,
        intersect: impl FnMut(&P, &Ray) -> Option<Hit>,
    ) -> bool {
        self.find_nearest_filtered(context, ray, best, &AlwaysTrue, &AlwaysTrue, intersect)
    }

    /// Finds the closest primitive accepted by both conditions.
    ///
    /// `precondition` is asked with a depth of zero before `intersect` is called for a
    /// payload; primitives it rejects are skipped. `postcondition` is asked with the depth
    /// of each hit; rejected hits never replace `best`.
    pub fn find_nearest_filtered<'a>(
        &'a self,
        context: &mut TraversalContext,
        ray: &Ray,
        best: &mut Intersection<'a, P>,
        precondition: &impl RayObjectCondition<P>,
        postcondition: &impl RayObjectCondition<P>,
        mut intersect: impl FnMut(&P, &Ray) -> Option<Hit>,
    ) -> bool {
        let TraversalContext { queue, stats } = context;
        let info = RayInfo::new(ray);
        let mut found = false;

        queue.clear();
        stats.queries += 1;

        if let Some(depth) = info.check_node(&self.nodes[self.root], stats) {
            queue.insert(depth, self.root);
            stats.nodes_enqueued += 1;
        }

        while let Some((depth, node_index)) = queue.remove_min() {
            stats.nodes_dequeued += 1;
            if depth > best.depth {
                break;
            }

            match &self.nodes[node_index] {
                BvhNode::Internal { children, .. } => {
                    for &child in children {
                        if let Some(depth) = info.check_node(&self.nodes[child], stats) {
                            queue.insert(depth, child);
                            stats.nodes_enqueued += 1;
                        }
                    }
                }
                BvhNode::Leaf { payload, .. } => {
                    if !precondition.test(ray, payload, 0.0) {
                        continue;
                    }

                    stats.primitive_tests += 1;
                    if let Some(hit) = intersect(payload, ray) {
                        if postcondition.test(ray, payload, hit.depth) && hit.depth < best.depth {
                            *best = Intersection::new(hit, payload);
                            found = true;
                        }
                    }
                }
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Arc;
    use std::thread;

    use float_eq::assert_float_eq;

    use crate::aabb::Aabb;
    use crate::bounding_hierarchy::{Hit, Intersection};
    use crate::bvh::{take_thread_stats, Bvh, TraversalContext};
    use crate::ray::{Ray, RayInfo};
    use crate::testbase::{
        brute_force_nearest, intersect_box, intersect_tagged_box, random_boxes, random_ray,
        seeded_rng, spaced_boxes,
    };
    use crate::{Point3, Real, Vector3};

    fn boxes_with_own_payload(count: i32) -> Vec<(Aabb, Aabb)> {
        spaced_boxes(count)
            .into_iter()
            .map(|(aabb, _)| (aabb, aabb))
            .collect()
    }

    fn ray_from_the_right() -> Ray {
        Ray::new(Point3::new(10.0, 0.5, 0.5), Vector3::new(-1.0, 0.0, 0.0))
    }

    #[test]
    /// Five boxes on the x axis, hit from the right. The box at x = 8 is hit first, and
    /// the box at x = 6 once the one at x = 8 is filtered out.
    fn test_nearest_of_five_boxes() {
        let bvh = Bvh::build(boxes_with_own_payload(5), Vec::new()).unwrap();
        let ray = Ray::new(Point3::new(10.0, 0.5, 0.5), Vector3::new(-1.0, 0.0, 0.0));

        let mut best = Intersection::none();
        assert!(bvh.find_nearest(&ray, &mut best, intersect_box));
        assert_eq!(best.object.unwrap().min().x, 8.0);
        assert_eq!(best.depth, 1.0);

        // Hide the box at x = 8, the next one is the box at x = 6.
        let mut context = TraversalContext::new();
        let mut best = Intersection::none();
        let not_eight = |_: &Ray, aabb: &Aabb, _: Real| aabb.min().x != 8.0;
        assert!(bvh.find_nearest_filtered(
            &mut context,
            &ray,
            &mut best,
            &not_eight,
            &not_eight,
            intersect_box
        ));
        assert_eq!(best.object.unwrap().min().x, 6.0);
        assert_eq!(best.depth, 3.0);
    }

    #[test]
    fn test_miss_leaves_best_untouched() {
        let bvh = Bvh::build(boxes_with_own_payload(5), Vec::new()).unwrap();
        let ray = Ray::new(Point3::new(10.0, 5.0, 0.5), Vector3::new(-1.0, 0.0, 0.0));

        let mut best = Intersection::none();
        assert!(!bvh.find_nearest(&ray, &mut best, intersect_box));
        assert!(!best.is_hit());
    }

    #[test]
    /// A seeded best depth acts as a maximum distance.
    fn test_bounded_query() {
        let bvh = Bvh::build(boxes_with_own_payload(5), Vec::new()).unwrap();
        let ray = ray_from_the_right();

        let mut best = Intersection::within(0.5);
        assert!(!bvh.find_nearest(&ray, &mut best, intersect_box));

        let mut best = Intersection::within(1.5);
        assert!(bvh.find_nearest(&ray, &mut best, intersect_box));
    }

    #[test]
    /// Hits rejected by the postcondition never become the best hit.
    fn test_postcondition_filters_hits() {
        let bvh = Bvh::build(boxes_with_own_payload(5), Vec::new()).unwrap();
        let mut context = TraversalContext::new();
        let far_only = |_: &Ray, _: &Aabb, depth: Real| depth > 4.0;
        let accept_all = |_: &Ray, _: &Aabb, _: Real| true;

        let mut best = Intersection::none();
        bvh.find_nearest_filtered(
            &mut context,
            &ray_from_the_right(),
            &mut best,
            &accept_all,
            &far_only,
            intersect_box,
        );
        assert_eq!(best.object.unwrap().min().x, 4.0);
    }

    #[test]
    /// The precondition skips primitives before their intersection is computed.
    fn test_precondition_skips_intersection() {
        let bvh = Bvh::build(boxes_with_own_payload(5), Vec::new()).unwrap();
        let mut context = TraversalContext::new();
        let nothing = |_: &Ray, _: &Aabb, _: Real| false;
        let accept_all = |_: &Ray, _: &Aabb, _: Real| true;

        let mut best = Intersection::none();
        let found = bvh.find_nearest_filtered(
            &mut context,
            &ray_from_the_right(),
            &mut best,
            &nothing,
            &accept_all,
            |_: &Aabb, _: &Ray| -> Option<Hit> { panic!("precondition was ignored") },
        );
        assert!(!found);
        assert_eq!(context.stats.primitive_tests, 0);
    }

    #[test]
    /// The traversal agrees with a linear scan over all primitives.
    fn test_agrees_with_brute_force() {
        let mut rng = seeded_rng(0x5eed);
        for count in [1, 3, 7, 50, 400] {
            let primitives = random_boxes(&mut rng, count);
            let bvh = Bvh::build(primitives.clone(), Vec::new()).unwrap();
            bvh.assert_tight();

            let mut context = TraversalContext::new();
            for _ in 0..200 {
                let ray = random_ray(&mut rng);
                let expected = brute_force_nearest(&primitives, &ray);

                let mut best = Intersection::none();
                let found = bvh.find_nearest_with_context(
                    &mut context,
                    &ray,
                    &mut best,
                    intersect_tagged_box,
                );

                assert_eq!(found, expected.is_hit());
                if found {
                    assert_float_eq!(best.depth, expected.depth, abs <= 1e-3);
                    // Ties may resolve to another primitive at the same distance.
                    let hit = intersect_tagged_box(best.object.unwrap(), &ray).unwrap();
                    assert_float_eq!(hit.depth, expected.depth, abs <= 1e-3);
                }
            }
        }
    }

    #[test]
    /// Every primitive handed to the intersection callback has a box the ray enters, and
    /// the query never tests more primitives than there are.
    fn test_only_reachable_primitives_are_tested() {
        let mut rng = seeded_rng(7);
        let primitives = random_boxes(&mut rng, 300);
        let bvh = Bvh::build(primitives.clone(), Vec::new()).unwrap();

        for _ in 0..100 {
            let ray = random_ray(&mut rng);
            let info = RayInfo::new(&ray);
            let tested = RefCell::new(Vec::new());

            let mut best = Intersection::none();
            bvh.find_nearest(&ray, &mut best, |primitive: &(Aabb, usize), ray: &Ray| {
                tested.borrow_mut().push(primitive.1);
                intersect_tagged_box(primitive, ray)
            });

            let tested = tested.into_inner();
            assert!(tested.len() <= primitives.len());
            for index in tested {
                let depth = info.intersects(&primitives[index].0);
                assert!(depth.is_some());
                assert!(depth.unwrap() <= best.depth + 1e-3);
            }
        }
    }

    #[test]
    /// Pruning pays off: a ray through a long row of boxes only tests a few of them.
    fn test_early_termination() {
        let bvh = Bvh::build(boxes_with_own_payload(200), Vec::new()).unwrap();
        let mut context = TraversalContext::new();

        let mut best = Intersection::none();
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vector3::new(1.0, 0.0, 0.0));
        bvh.find_nearest_with_context(&mut context, &ray, &mut best, intersect_box);

        assert_eq!(best.object.unwrap().min().x, 0.0);
        assert!(context.stats.primitive_tests < 10);
        assert_eq!(context.stats.queries, 1);
    }

    #[test]
    /// Infinite primitives are tested by every query, even when a finite hit is closer.
    fn test_infinite_primitive_always_visited() {
        let plane = Aabb::infinite();
        let bvh = Bvh::build(spaced_boxes(20), vec![(plane, -1)]).unwrap();
        let boxes = spaced_boxes(20);

        let mut rng = seeded_rng(3);
        for _ in 0..50 {
            let ray = random_ray(&mut rng);
            let visited = RefCell::new(false);

            let mut best = Intersection::none();
            bvh.find_nearest(&ray, &mut best, |id: &i32, ray: &Ray| {
                if *id < 0 {
                    *visited.borrow_mut() = true;
                    None
                } else {
                    intersect_box(&boxes[*id as usize].0, ray)
                }
            });

            assert!(visited.into_inner());
        }

        // Also when the ray starts right in front of a box.
        let visited = RefCell::new(false);
        let mut best = Intersection::none();
        let ray = Ray::new(Point3::new(-0.5, 0.5, 0.5), Vector3::new(1.0, 0.0, 0.0));
        bvh.find_nearest(&ray, &mut best, |id: &i32, ray: &Ray| {
            if *id < 0 {
                *visited.borrow_mut() = true;
                None
            } else {
                intersect_box(&boxes[*id as usize].0, ray)
            }
        });
        assert!(visited.into_inner());
        assert_eq!(best.object, Some(&0));
    }

    #[test]
    /// An infinite primitive closer than every finite one wins.
    fn test_infinite_primitive_hit() {
        let bvh = Bvh::build(spaced_boxes(5), vec![(Aabb::infinite(), 99)]).unwrap();
        let boxes = spaced_boxes(5);
        let ray = Ray::new(Point3::new(20.0, 0.5, 0.5), Vector3::new(-1.0, 0.0, 0.0));

        // A plane at x = 15.
        let mut best = Intersection::none();
        bvh.find_nearest(&ray, &mut best, |id: &i32, ray: &Ray| {
            if *id == 99 {
                Some(Hit::new(5.0, ray.at(5.0)))
            } else {
                intersect_box(&boxes[*id as usize].0, ray)
            }
        });

        assert_eq!(best.object, Some(&99));
        assert_eq!(best.depth, 5.0);
    }

    #[test]
    /// Queries nested inside the intersection callback get their own pooled queue.
    fn test_nested_queries() {
        let bvh = Bvh::build(boxes_with_own_payload(10), Vec::new()).unwrap();
        let ray = Ray::new(Point3::new(30.0, 0.5, 0.5), Vector3::new(-1.0, 0.0, 0.0));

        let mut best = Intersection::none();
        bvh.find_nearest(&ray, &mut best, |aabb: &Aabb, ray: &Ray| {
            let shadow = Ray::new(aabb.center(), Vector3::new(0.0, 1.0, 0.0));
            let mut blocker = Intersection::within(10.0);
            bvh.find_nearest(&shadow, &mut blocker, |other: &Aabb, ray: &Ray| {
                if other == aabb {
                    None
                } else {
                    intersect_box(other, ray)
                }
            });
            assert!(!blocker.is_hit());
            intersect_box(aabb, ray)
        });

        assert_eq!(best.object.unwrap().min().x, 18.0);
    }

    #[test]
    /// Statistics count every step of a query.
    fn test_statistics() {
        let bvh = Bvh::build(boxes_with_own_payload(4), Vec::new()).unwrap();
        let mut context = TraversalContext::new();

        let mut best = Intersection::none();
        bvh.find_nearest_with_context(&mut context, &ray_from_the_right(), &mut best, intersect_box);
        let stats = context.take_stats();

        // Root plus four leaves tested, all hit. The second closest leaf ends the query.
        assert_eq!(stats.queries, 1);
        assert_eq!(stats.ray_box_tests, 5);
        assert_eq!(stats.ray_box_tests_succeeded, 5);
        assert_eq!(stats.nodes_enqueued, 5);
        assert_eq!(stats.primitive_tests, 1);
        assert_eq!(stats.nodes_dequeued, 3);
        assert_eq!(context.stats.queries, 0);
    }

    #[test]
    /// Pooled contexts keep counting until their statistics are taken.
    fn test_thread_stats() {
        thread::spawn(|| {
            let bvh = Bvh::build(boxes_with_own_payload(4), Vec::new()).unwrap();
            for _ in 0..3 {
                let mut best = Intersection::none();
                bvh.find_nearest(&ray_from_the_right(), &mut best, intersect_box);
            }

            assert_eq!(take_thread_stats().queries, 3);
            assert_eq!(take_thread_stats().queries, 0);
        })
        .join()
        .unwrap();
    }

    #[test]
    /// One tree, many threads, each with its own context.
    fn test_concurrent_queries() {
        let mut rng = seeded_rng(11);
        let primitives = random_boxes(&mut rng, 500);
        let rays = (0..400).map(|_| random_ray(&mut rng)).collect::<Vec<_>>();
        let bvh = Arc::new(Bvh::build(primitives.clone(), Vec::new()).unwrap());

        let expected = rays
            .iter()
            .map(|ray| brute_force_nearest(&primitives, ray).depth)
            .collect::<Vec<_>>();
        let rays = Arc::new(rays);

        let workers = (0..4)
            .map(|worker| {
                let bvh = Arc::clone(&bvh);
                let rays = Arc::clone(&rays);
                thread::spawn(move || {
                    let mut context = TraversalContext::new();
                    let depths = rays
                        .iter()
                        .skip(worker)
                        .step_by(4)
                        .map(|ray| {
                            let mut best = Intersection::none();
                            bvh.find_nearest_with_context(
                                &mut context,
                                ray,
                                &mut best,
                                intersect_tagged_box,
                            );
                            best.depth
                        })
                        .collect::<Vec<_>>();
                    (worker, depths, context.stats)
                })
            })
            .collect::<Vec<_>>();

        let mut queries = 0;
        for handle in workers {
            let (worker, depths, stats) = handle.join().unwrap();
            queries += stats.queries;
            for (i, depth) in depths.into_iter().enumerate() {
                assert_float_eq!(depth, expected[worker + 4 * i], abs <= 1e-3);
            }
        }
        assert_eq!(queries, 400);
    }
}
