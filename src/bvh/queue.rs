//! A binary min-heap of nodes keyed on their distance along a ray.

use crate::bvh::NodeId;
use crate::Real;

/// Priority queue used by best-first traversal.
///
/// The heap is stored 1-based: slot 0 is reserved so that the children of slot `i` are
/// `2i` and `2i + 1`. [`clear`](PriorityQueue::clear) keeps the backing storage, so a
/// queue reused across many queries stops allocating once it has grown to the deepest
/// frontier it has seen.
#[derive(Debug, Clone)]
pub struct PriorityQueue {
    heap: Vec<(Real, NodeId)>,
}

impl Default for PriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty queue with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut heap = Vec::with_capacity(capacity + 1);
        heap.push((0.0, 0));
        PriorityQueue { heap }
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.heap.len() - 1
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.heap.truncate(1);
    }

    /// Queues `node` with priority `depth`.
    ///
    /// # Examples
    /// ```
    /// use slab_bvh::bvh::PriorityQueue;
    ///
    /// let mut queue = PriorityQueue::new();
    /// queue.insert(2.0, 7);
    /// queue.insert(-1.0, 3);
    ///
    /// assert_eq!(queue.remove_min(), Some((-1.0, 3)));
    /// assert_eq!(queue.remove_min(), Some((2.0, 7)));
    /// assert_eq!(queue.remove_min(), None);
    /// ```
    pub fn insert(&mut self, depth: Real, node: NodeId) {
        self.heap.push((depth, node));

        // Move the hole up until its parent is not larger.
        let mut i = self.heap.len() - 1;
        while i > 1 && self.heap[i / 2].0 > depth {
            self.heap[i] = self.heap[i / 2];
            i /= 2;
        }
        self.heap[i] = (depth, node);
    }

    /// Removes and returns the entry with the smallest depth.
    pub fn remove_min(&mut self) -> Option<(Real, NodeId)> {
        if self.is_empty() {
            return None;
        }

        let min = self.heap[1];
        let last = self.heap.pop()?;
        let size = self.heap.len() - 1;
        if size == 0 {
            return Some(min);
        }

        // Move the hole left at the root down, following the smaller child, until
        // `last` fits.
        let mut i = 1;
        loop {
            let mut child = 2 * i;
            if child > size {
                break;
            }
            if child < size && self.heap[child + 1].0 < self.heap[child].0 {
                child += 1;
            }
            if last.0 <= self.heap[child].0 {
                break;
            }
            self.heap[i] = self.heap[child];
            i = child;
        }
        self.heap[i] = last;

        Some(min)
    }
}
