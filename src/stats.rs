//! Counters describing the work done by queries.

use std::fmt;
use std::ops::{Add, AddAssign};

/// Per-thread traversal statistics.
///
/// Every worker owns its own counters (inside its [`TraversalContext`]); they are only
/// combined with `+`/`+=` when reporting, never while a query runs.
///
/// [`TraversalContext`]: ../bvh/struct.TraversalContext.html
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraversalStats {
    /// Number of slab tests performed against finite nodes.
    pub ray_box_tests: u64,

    /// Number of slab tests that hit.
    pub ray_box_tests_succeeded: u64,

    /// Number of nodes pushed onto the priority queue, infinite ones included.
    pub nodes_enqueued: u64,

    /// Number of nodes taken from the priority queue.
    pub nodes_dequeued: u64,

    /// Number of calls to the primitive intersection callback.
    pub primitive_tests: u64,

    /// Number of queries run.
    pub queries: u64,
}

impl TraversalStats {
    /// Fraction of slab tests that hit, or zero if none ran.
    pub fn ray_box_hit_ratio(&self) -> f64 {
        if self.ray_box_tests == 0 {
            0.0
        } else {
            self.ray_box_tests_succeeded as f64 / self.ray_box_tests as f64
        }
    }
}

impl AddAssign for TraversalStats {
    fn add_assign(&mut self, other: TraversalStats) {
        self.ray_box_tests += other.ray_box_tests;
        self.ray_box_tests_succeeded += other.ray_box_tests_succeeded;
        self.nodes_enqueued += other.nodes_enqueued;
        self.nodes_dequeued += other.nodes_dequeued;
        self.primitive_tests += other.primitive_tests;
        self.queries += other.queries;
    }
}

impl Add for TraversalStats {
    type Output = TraversalStats;

    fn add(mut self, other: TraversalStats) -> TraversalStats {
        self += other;
        self
    }
}

impl std::iter::Sum for TraversalStats {
    fn sum<I: Iterator<Item = TraversalStats>>(iter: I) -> TraversalStats {
        iter.fold(TraversalStats::default(), Add::add)
    }
}

impl fmt::Display for TraversalStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} queries, {} ray/box tests ({} hit, {:.1}%), {} enqueued, {} dequeued, {} primitive tests",
            self.queries,
            self.ray_box_tests,
            self.ray_box_tests_succeeded,
            100.0 * self.ray_box_hit_ratio(),
            self.nodes_enqueued,
            self.nodes_dequeued,
            self.primitive_tests,
        )
    }
}
