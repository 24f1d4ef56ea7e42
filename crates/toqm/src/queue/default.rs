use crate::node::NodeId;

use super::{CostHeap, NodeQueue, QueueEntry};

/// Unbounded priority queue: pop always returns the globally best node.
#[derive(Debug, Default)]
pub struct DefaultQueue {
    heap: CostHeap,
}

impl DefaultQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeQueue for DefaultQueue {
    fn name(&self) -> &str {
        "DefaultQueue"
    }

    fn push(&mut self, entry: QueueEntry) -> Vec<NodeId> {
        self.heap.push(entry);
        Vec::new()
    }

    fn pop(&mut self) -> Option<QueueEntry> {
        self.heap.pop()
    }

    fn retire(&mut self, node: NodeId) -> bool {
        self.heap.retire(node)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clone_box(&self) -> Box<dyn NodeQueue> {
        Box::new(Self::new())
    }
}
