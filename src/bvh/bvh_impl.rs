//! This module defines [`Bvh`], the node arena produced by the builder, along with
//! functions for inspecting it and checking its invariants.
//!
//! [`Bvh`]: struct.Bvh.html
//!

use std::iter::repeat;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::SceneObject;
use crate::bvh::build::Builder;
use crate::bvh::{BuildOptions, BvhNode, LeafIterator, NodeId};
use crate::error::Result;
use crate::EPSILON;

/// The [`Bvh`] data structure. Contains the list of [`BvhNode`]s.
///
/// Nodes are owned by the arena and reference their children by index. The tree is never
/// modified after it is built, so it can be shared by any number of threads running
/// queries at once.
///
/// [`Bvh`]: struct.Bvh.html
///
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bvh<P> {
    /// The list of nodes of the [`Bvh`].
    ///
    /// [`Bvh`]: struct.Bvh.html
    ///
    pub nodes: Vec<BvhNode<P>>,

    /// Index of the root node.
    pub root: NodeId,
}

impl<P> Bvh<P> {
    /// Creates a new [`Bvh`] from bounded primitives and unbounded ones, with the default
    /// [`BuildOptions`]. Returns `None` if both lists are empty.
    ///
    /// # Panics
    ///
    /// Panics if the builder runs out of memory. Use [`try_build`] to handle that case.
    ///
    /// [`Bvh`]: struct.Bvh.html
    /// [`try_build`]: #method.try_build
    ///
    pub fn build(primitives: Vec<(Aabb, P)>, infinite: Vec<(Aabb, P)>) -> Option<Bvh<P>> {
        match Self::try_build(primitives, infinite, &BuildOptions::default()) {
            Ok(bvh) => bvh,
            Err(error) => panic!("cannot build bounding hierarchy: {}", error),
        }
    }

    /// Creates a new [`Bvh`] using `options`, reporting allocation failures.
    ///
    /// [`Bvh`]: struct.Bvh.html
    ///
    pub fn try_build(
        primitives: Vec<(Aabb, P)>,
        infinite: Vec<(Aabb, P)>,
        options: &BuildOptions,
    ) -> Result<Option<Bvh<P>>> {
        let built = Builder::new(options).build(primitives, infinite)?;
        Ok(built.map(|(nodes, root)| Bvh { nodes, root }))
    }

    /// Returns the root node.
    pub fn root_node(&self) -> &BvhNode<P> {
        &self.nodes[self.root]
    }

    /// Returns the box of the whole scene, unbounded primitives included.
    pub fn root_aabb(&self) -> &Aabb {
        self.root_node().aabb()
    }

    /// Iterates over the leaves reachable from the root.
    pub fn leaves(&self) -> LeafIterator<'_, P> {
        LeafIterator::new(self)
    }

    /// Number of nodes on the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        self.node_depth(self.root)
    }

    fn node_depth(&self, node_index: NodeId) -> usize {
        1 + self.nodes[node_index]
            .children()
            .iter()
            .map(|&child| self.node_depth(child))
            .max()
            .unwrap_or(0)
    }

    /// Prints the [`Bvh`] in a tree-like visualization.
    ///
    /// [`Bvh`]: struct.Bvh.html
    ///
    pub fn pretty_print(&self)
    where
        P: std::fmt::Debug,
    {
        self.print_node(self.root, 0);
    }

    fn print_node(&self, node_index: NodeId, depth: usize)
    where
        P: std::fmt::Debug,
    {
        let padding: String = repeat(" ").take(depth).collect();
        let node = &self.nodes[node_index];
        let infinite = if node.is_infinite() { " infinite" } else { "" };
        match node {
            BvhNode::Internal { aabb, children, .. } => {
                println!(
                    "{}node={} children={}{} {}",
                    padding,
                    node_index,
                    children.len(),
                    infinite,
                    aabb
                );
                for &child in children {
                    self.print_node(child, depth + 1);
                }
            }
            BvhNode::Leaf { aabb, payload, .. } => {
                println!(
                    "{}leaf={} payload={:?}{} {}",
                    padding, node_index, payload, infinite, aabb
                );
            }
        }
    }

    /// Check that the `Aabb`s in the `Bvh` are tight, which means, that parent `Aabb`s are not
    /// larger than they should be. Infinite nodes are exempt, their boxes are never tested.
    pub fn assert_tight(&self) {
        self.assert_tight_subtree(self.root);
    }

    fn assert_tight_subtree(&self, node_index: NodeId) {
        if let BvhNode::Internal {
            aabb,
            children,
            infinite,
        } = &self.nodes[node_index]
        {
            assert!(!children.is_empty(), "internal node {} is empty", node_index);
            let joint_aabb = Aabb::join_all(children.iter().map(|&c| *self.nodes[c].aabb()));
            if !*infinite {
                assert!(
                    joint_aabb.relative_eq(aabb, EPSILON),
                    "{} real_aabb={} stored_aabb={}",
                    node_index,
                    joint_aabb,
                    aabb
                );
            }
            for &child in children {
                self.assert_tight_subtree(child);
            }
        }
    }

    /// Checks the structure of the arena: every node is reachable from the root exactly
    /// once, and the ancestors of infinite nodes are infinite too.
    pub fn assert_consistent(&self) {
        let mut visits = vec![0usize; self.nodes.len()];
        self.assert_consistent_subtree(self.root, &mut visits);

        for (node_index, count) in visits.into_iter().enumerate() {
            assert_eq!(count, 1, "node {} is reached {} times", node_index, count);
        }
    }

    fn assert_consistent_subtree(&self, node_index: NodeId, visits: &mut [usize]) {
        visits[node_index] += 1;
        let node = &self.nodes[node_index];
        for &child in node.children() {
            if self.nodes[child].is_infinite() {
                assert!(
                    node.is_infinite(),
                    "node {} has an infinite child but is finite",
                    node_index
                );
            }
            self.assert_consistent_subtree(child, visits);
        }
    }
}

impl Bvh<usize> {
    /// Builds a [`Bvh`] over scene objects. Unbounded objects, as reported by
    /// [`SceneObject::is_infinite`], are exempted from culling. The payload of each leaf
    /// is the index of its object in `objects`.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::aabb::{Aabb, Bounded};
    /// use slab_bvh::bounding_hierarchy::SceneObject;
    /// use slab_bvh::bvh::Bvh;
    /// use slab_bvh::{Point3, Vector3};
    ///
    /// enum Shape {
    ///     Cube(Point3),
    ///     Plane,
    /// }
    ///
    /// impl Bounded for Shape {
    ///     fn aabb(&self) -> Aabb {
    ///         match self {
    ///             Shape::Cube(at) => Aabb::new(*at, Vector3::new(1.0, 1.0, 1.0)),
    ///             Shape::Plane => Aabb::infinite(),
    ///         }
    ///     }
    /// }
    ///
    /// impl SceneObject for Shape {
    ///     fn is_infinite(&self) -> bool {
    ///         matches!(self, Shape::Plane)
    ///     }
    /// }
    ///
    /// let scene = vec![Shape::Plane, Shape::Cube(Point3::origin())];
    /// let bvh = Bvh::from_objects(&scene).unwrap();
    ///
    /// assert!(bvh.root_node().is_infinite());
    /// assert_eq!(bvh.leaves().count(), 2);
    /// ```
    ///
    /// [`Bvh`]: struct.Bvh.html
    pub fn from_objects<S: SceneObject>(objects: &[S]) -> Option<Bvh<usize>> {
        let (infinite, finite): (Vec<_>, Vec<_>) = objects
            .iter()
            .enumerate()
            .map(|(index, object)| (object.is_infinite(), (object.aabb(), index)))
            .partition(|(infinite, _)| *infinite);

        Bvh::build(
            finite.into_iter().map(|(_, primitive)| primitive).collect(),
            infinite.into_iter().map(|(_, primitive)| primitive).collect(),
        )
    }
}
