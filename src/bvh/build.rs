//! Level-by-level construction of a [`Bvh`] using a surface area heuristic median cut.
//!
//! Each level sorts a range of candidate nodes along the largest axis of their union,
//! cuts it where the summed surface area cost is smallest and groups the pieces into
//! composite nodes. The composites of one level are the candidates of the next, until a
//! single composite, the root, is left.
//!
//! [`Bvh`]: struct.Bvh.html

use std::cmp::Ordering;
use std::ops::Range;

use log::{debug, trace};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::aabb::Aabb;
use crate::axis::Axis;
use crate::bvh::{BvhNode, NodeId};
use crate::error::{BuildError, Result};
use crate::utils::grown_capacity;
use crate::Real;

/// Allocation tag of the candidate list and the split cost tables.
const CANDIDATES_TAG: &str = "bounding boxes";

/// Allocation tag of composite child lists.
const COMPOSITE_TAG: &str = "composite";

/// Allocation tag of the node arena.
const NODES_TAG: &str = "bounding nodes";

/// Ranges at least this long are sorted on the rayon thread pool.
#[cfg(feature = "rayon")]
const PARALLEL_SORT_THRESHOLD: usize = 4096;

/// Tunables of the builder.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildOptions {
    /// Ranges of at most this many candidates are never split. Values below 2 count as 2.
    pub fan_out: usize,

    /// A range of `n` candidates with union area `A` is only split if some cut costs less
    /// than `A * (n - split_baseline)`. Smaller values split more eagerly.
    pub split_baseline: Real,

    /// The candidate list initially has room for this many entries per primitive.
    pub initial_capacity_factor: usize,

    /// Factor by which a full candidate list grows.
    pub growth_factor: Real,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            fan_out: 4,
            split_baseline: 3.0,
            initial_capacity_factor: 2,
            growth_factor: 1.5,
        }
    }
}

/// Reserves room for exactly `additional` more entries, or reports which buffer failed.
fn try_reserve<T>(buffer: &mut Vec<T>, additional: usize, tag: &'static str) -> Result<()> {
    buffer
        .try_reserve_exact(additional)
        .map_err(|source| BuildError::Allocation {
            tag,
            requested: buffer.len().saturating_add(additional),
            source,
        })
}

fn compare_midpoints(a: Real, b: Real) -> Ordering {
    a.total_cmp(&b)
}

#[cfg(not(feature = "rayon"))]
fn sort_by_midpoint<P>(nodes: &[BvhNode<P>], candidates: &mut [NodeId], axis: Axis) {
    candidates.sort_by(|&a, &b| {
        compare_midpoints(nodes[a].aabb().midpoint(axis), nodes[b].aabb().midpoint(axis))
    });
}

#[cfg(feature = "rayon")]
fn sort_by_midpoint<P>(nodes: &[BvhNode<P>], candidates: &mut [NodeId], axis: Axis) {
    if candidates.len() < PARALLEL_SORT_THRESHOLD {
        candidates.sort_by(|&a, &b| {
            compare_midpoints(nodes[a].aabb().midpoint(axis), nodes[b].aabb().midpoint(axis))
        });
        return;
    }

    let mut keys = candidates
        .iter()
        .map(|&id| (nodes[id].aabb().midpoint(axis), id))
        .collect::<Vec<_>>();
    keys.par_sort_by(|a, b| compare_midpoints(a.0, b.0));
    for (slot, (_, id)) in candidates.iter_mut().zip(keys) {
        *slot = id;
    }
}

/// Working state of one build.
pub(crate) struct Builder<'o, P> {
    options: &'o BuildOptions,
    nodes: Vec<BvhNode<P>>,
    candidates: Vec<NodeId>,
    levels: usize,
    growths: usize,
}

impl<'o, P> Builder<'o, P> {
    pub(crate) fn new(options: &'o BuildOptions) -> Self {
        Builder {
            options,
            nodes: Vec::new(),
            candidates: Vec::new(),
            levels: 0,
            growths: 0,
        }
    }

    /// Builds the node arena for `primitives` and the unbounded `infinite` primitives.
    /// Returns the arena and the index of its root, or `None` if there is nothing to build.
    pub(crate) fn build(
        mut self,
        primitives: Vec<(Aabb, P)>,
        infinite: Vec<(Aabb, P)>,
    ) -> Result<Option<(Vec<BvhNode<P>>, NodeId)>> {
        if primitives.is_empty() && infinite.is_empty() {
            return Ok(None);
        }

        let finite_count = primitives.len();
        let infinite_count = infinite.len();
        let capacity = finite_count.saturating_mul(self.options.initial_capacity_factor);
        try_reserve(&mut self.candidates, capacity, CANDIDATES_TAG)?;
        try_reserve(
            &mut self.nodes,
            finite_count.saturating_add(infinite_count),
            NODES_TAG,
        )?;

        for (aabb, payload) in primitives {
            let leaf = self.push_node(BvhNode::Leaf {
                aabb,
                infinite: false,
                payload,
            })?;
            self.push_candidate(leaf)?;
        }

        let mut root = None;
        if finite_count > 0 {
            let mut range = 0..finite_count;
            loop {
                range = self.build_level(range)?;
                if range.len() == 1 {
                    break;
                }
            }
            root = Some(self.candidates[range.start]);
        }

        if infinite_count > 0 {
            let composite = self.build_infinite_composite(infinite)?;
            root = Some(match root {
                Some(root) => {
                    self.prepend_child(root, composite)?;
                    root
                }
                None => {
                    let root = self.push_composite(vec![composite])?;
                    self.nodes[root].set_infinite();
                    root
                }
            });
        }

        let root = match root {
            Some(root) => root,
            None => return Ok(None),
        };

        debug!(
            "built bvh: {} finite and {} infinite primitives, {} nodes, {} levels, candidate list grew {} times to {} entries",
            finite_count,
            infinite_count,
            self.nodes.len(),
            self.levels,
            self.growths,
            self.candidates.capacity(),
        );

        Ok(Some((self.nodes, root)))
    }

    /// Groups the candidates in `range` into composites appended to the candidate list.
    /// Returns the range of the new composites.
    fn build_level(&mut self, range: Range<usize>) -> Result<Range<usize>> {
        let start = self.candidates.len();
        self.sort_and_split(range.start, range.end)?;
        self.levels += 1;

        let level = start..self.candidates.len();
        trace!(
            "level {}: {} candidates grouped into {} composites",
            self.levels,
            range.len(),
            level.len()
        );
        Ok(level)
    }

    /// Sorts the candidates in `first..last` and either groups them into one composite or
    /// recurses on both sides of the cheapest cut.
    fn sort_and_split(&mut self, first: usize, last: usize) -> Result<()> {
        let size = last - first;
        if size == 0 {
            return Ok(());
        }

        let axis = self.joint_aabb(first..last).largest_axis();
        self.sort_range(first..last, axis);

        let split = if size <= self.options.fan_out.max(2) {
            None
        } else {
            self.best_split(first..last)?
        };

        match split {
            Some(split) => {
                self.sort_and_split(first, split)?;
                self.sort_and_split(split, last)
            }
            None => {
                let mut children = Vec::new();
                try_reserve(&mut children, size, COMPOSITE_TAG)?;
                children.extend_from_slice(&self.candidates[first..last]);

                let composite = self.push_composite(children)?;
                self.push_candidate(composite)
            }
        }
    }

    /// Returns the index at which `range` should be cut, or `None` if no cut beats
    /// keeping the range together.
    fn best_split(&self, range: Range<usize>) -> Result<Option<usize>> {
        let size = range.len();
        let mut area_left: Vec<f64> = Vec::new();
        let mut area_right: Vec<f64> = Vec::new();
        try_reserve(&mut area_left, size, CANDIDATES_TAG)?;
        try_reserve(&mut area_right, size, CANDIDATES_TAG)?;

        // area_left[i] covers candidates 0..=i, area_right[i] covers i..size.
        let candidates = &self.candidates[range.clone()];
        let mut joint = Aabb::empty();
        for &id in candidates {
            joint.join_mut(self.nodes[id].aabb());
            area_left.push(joint.surface_area() as f64);
        }
        let mut joint = Aabb::empty();
        for &id in candidates.iter().rev() {
            joint.join_mut(self.nodes[id].aabb());
            area_right.push(joint.surface_area() as f64);
        }
        area_right.reverse();

        let mut best_cost = area_right[0] * (size as f64 - self.options.split_baseline as f64);
        let mut best = None;
        for i in 1..size {
            let cost = i as f64 * area_left[i - 1] + (size - i) as f64 * area_right[i];
            if cost < best_cost {
                best_cost = cost;
                best = Some(range.start + i);
            }
        }

        Ok(best)
    }

    /// Stable sort of the candidates in `range` by their box midpoints along `axis`.
    fn sort_range(&mut self, range: Range<usize>, axis: Axis) {
        sort_by_midpoint(&self.nodes, &mut self.candidates[range], axis);
    }

    fn joint_aabb(&self, range: Range<usize>) -> Aabb {
        Aabb::join_all(self.candidates[range].iter().map(|&id| *self.nodes[id].aabb()))
    }

    fn build_infinite_composite(&mut self, infinite: Vec<(Aabb, P)>) -> Result<NodeId> {
        let mut leaves = Vec::new();
        try_reserve(&mut leaves, infinite.len(), COMPOSITE_TAG)?;
        for (aabb, payload) in infinite {
            leaves.push(self.push_node(BvhNode::Leaf {
                aabb,
                infinite: true,
                payload,
            })?);
        }

        let composite = self.push_composite(leaves)?;
        self.nodes[composite].set_infinite();
        Ok(composite)
    }

    /// Makes `child` the first child of the internal node `parent`, refits the parent's box
    /// and flags it infinite.
    fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let child_aabb = *self.nodes[child].aabb();
        if let BvhNode::Internal {
            aabb,
            infinite,
            children,
        } = &mut self.nodes[parent]
        {
            try_reserve(children, 1, COMPOSITE_TAG)?;
            children.insert(0, child);
            aabb.join_mut(&child_aabb);
            *infinite = true;
        }
        Ok(())
    }

    fn push_composite(&mut self, children: Vec<NodeId>) -> Result<NodeId> {
        let aabb = Aabb::join_all(children.iter().map(|&id| *self.nodes[id].aabb()));
        self.push_node(BvhNode::Internal {
            aabb,
            infinite: false,
            children,
        })
    }

    fn push_node(&mut self, node: BvhNode<P>) -> Result<NodeId> {
        if self.nodes.len() == self.nodes.capacity() {
            let grown = grown_capacity(self.nodes.capacity(), 2.0 as Real);
            let additional = grown - self.nodes.len();
            try_reserve(&mut self.nodes, additional, NODES_TAG)?;
        }
        self.nodes.push(node);
        Ok(self.nodes.len() - 1)
    }

    /// Appends to the candidate list, growing it by the configured factor when full.
    fn push_candidate(&mut self, id: NodeId) -> Result<()> {
        if self.candidates.len() == self.candidates.capacity() {
            let capacity = self.candidates.capacity();
            let grown = grown_capacity(capacity, self.options.growth_factor);
            trace!("growing candidate list from {} to {} entries", capacity, grown);
            let additional = grown - self.candidates.len();
            try_reserve(&mut self.candidates, additional, CANDIDATES_TAG)?;
            self.growths += 1;
        }
        self.candidates.push(id);
        Ok(())
    }
}
