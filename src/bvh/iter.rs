use crate::bvh::{Bvh, BvhNode, NodeId};

/// Iterator over the leaves of a [`Bvh`], depth first, children in stored order.
///
/// Yields the node index of each leaf along with its payload.
pub struct LeafIterator<'bvh, P> {
    /// Reference to the [`Bvh`] to traverse
    bvh: &'bvh Bvh<P>,
    /// Nodes still to visit, the next one on top.
    stack: Vec<NodeId>,
}

impl<'bvh, P> LeafIterator<'bvh, P> {
    /// Creates a new [`LeafIterator`] starting at the root of `bvh`.
    pub fn new(bvh: &'bvh Bvh<P>) -> Self {
        LeafIterator {
            bvh,
            stack: vec![bvh.root],
        }
    }
}

impl<'bvh, P> Iterator for LeafIterator<'bvh, P> {
    type Item = (NodeId, &'bvh P);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node_index) = self.stack.pop() {
            match &self.bvh.nodes[node_index] {
                BvhNode::Leaf { payload, .. } => return Some((node_index, payload)),
                BvhNode::Internal { children, .. } => {
                    self.stack.extend(children.iter().rev());
                }
            }
        }
        None
    }
}
