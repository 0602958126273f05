use crate::aabb::Aabb;

/// Index of a node in the [`Bvh`] arena.
///
/// [`Bvh`]: struct.Bvh.html
pub type NodeId = usize;

/// The [`BvhNode`] enum that describes a node in a [`Bvh`].
/// It's either a leaf node which owns the payload of exactly one primitive,
/// or an internal node grouping any number of child nodes.
/// Both variants store their own [`Aabb`]; an internal node's box is the union of its
/// children's boxes.
///
/// Nodes flagged `infinite` hold unbounded primitives, or lie on the path from such a
/// primitive to the root. They are never culled by the slab test.
///
/// [`Aabb`]: ../aabb/struct.Aabb.html
/// [`Bvh`]: struct.Bvh.html
///
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BvhNode<P> {
    /// Leaf node.
    Leaf {
        /// Bounds of the primitive.
        aabb: Aabb,

        /// Whether the primitive is unbounded.
        infinite: bool,

        /// The primitive referenced by this leaf.
        payload: P,
    },
    /// Inner node.
    Internal {
        /// The union of the children's [`Aabb`]s.
        aabb: Aabb,

        /// Whether this node bypasses the slab test.
        infinite: bool,

        /// Indices of the child nodes.
        children: Vec<NodeId>,
    },
}

impl<P> BvhNode<P> {
    /// Returns the bounding box of this node.
    pub fn aabb(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }

    /// Returns true if this node is exempt from the slab test.
    pub fn is_infinite(&self) -> bool {
        match self {
            BvhNode::Leaf { infinite, .. } | BvhNode::Internal { infinite, .. } => *infinite,
        }
    }

    /// Returns true for leaves.
    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }

    /// Returns the children of an internal node, or an empty slice for a leaf.
    pub fn children(&self) -> &[NodeId] {
        match self {
            BvhNode::Leaf { .. } => &[],
            BvhNode::Internal { children, .. } => children,
        }
    }

    /// Returns the payload of a leaf.
    pub fn payload(&self) -> Option<&P> {
        match self {
            BvhNode::Leaf { payload, .. } => Some(payload),
            BvhNode::Internal { .. } => None,
        }
    }

    pub(crate) fn set_infinite(&mut self) {
        match self {
            BvhNode::Leaf { infinite, .. } | BvhNode::Internal { infinite, .. } => {
                *infinite = true
            }
        }
    }
}
