//! Node-ordering queues.
//!
//! A queue holds the search frontier as [`QueueEntry`] records: a node id
//! plus its cost. The node itself lives in the engine's arena. Entries pop in
//! ascending cost order; ties go to the older node, so identical runs pop
//! identical sequences.

mod default;
mod trim;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use rustc_hash::FxHashSet;

use crate::cost::Cost;
use crate::node::NodeId;

pub use default::DefaultQueue;
pub use trim::TrimSlowNodes;

/// Entry in a node queue.
#[derive(Debug, Clone, Copy)]
pub struct QueueEntry {
    /// Node cost at push time.
    pub cost: Cost,
    /// Node id; doubles as creation order for FIFO tie-breaking.
    pub node: NodeId,
}

impl QueueEntry {
    /// Create an entry.
    pub fn new(node: NodeId, cost: Cost) -> Self {
        Self { cost, node }
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    /// Better entries compare greater, so a max-heap pops them first.
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower cost first, then older node first.
        // Note: BinaryHeap is a max-heap, so both comparisons are reversed.
        match other.cost.cmp(&self.cost) {
            Ordering::Equal => other.node.cmp(&self.node),
            other_cmp => other_cmp,
        }
    }
}

/// Node-ordering queue policy.
pub trait NodeQueue: Send + fmt::Debug {
    /// Name of the queue, for logging.
    fn name(&self) -> &str;

    /// Push an entry. Returns the ids of any entries the queue discarded to
    /// stay within its capacity; the pushed entry may be among them.
    fn push(&mut self, entry: QueueEntry) -> Vec<NodeId>;

    /// Pop the best live entry.
    fn pop(&mut self) -> Option<QueueEntry>;

    /// Remove a queued node without popping it. Returns whether it was live.
    fn retire(&mut self, node: NodeId) -> bool;

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Whether no live entries remain.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh, empty queue with the same configuration.
    fn clone_box(&self) -> Box<dyn NodeQueue>;
}

impl Clone for Box<dyn NodeQueue> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Binary heap with lazy removal.
///
/// Retired ids are dropped from the live set only; their heap entries are
/// skipped when they surface.
#[derive(Debug, Default)]
pub(crate) struct CostHeap {
    heap: BinaryHeap<QueueEntry>,
    live: FxHashSet<NodeId>,
}

impl CostHeap {
    pub(crate) fn push(&mut self, entry: QueueEntry) {
        self.live.insert(entry.node);
        self.heap.push(entry);
    }

    pub(crate) fn pop(&mut self) -> Option<QueueEntry> {
        while let Some(entry) = self.heap.pop() {
            if self.live.remove(&entry.node) {
                return Some(entry);
            }
        }
        None
    }

    pub(crate) fn retire(&mut self, node: NodeId) -> bool {
        self.live.remove(&node)
    }

    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    /// Keep the `keep` most advanced live entries: fewest remaining gates
    /// first, then pop order. Returns the ids of the rest.
    pub(crate) fn trim_slowest(&mut self, keep: usize) -> Vec<NodeId> {
        let mut entries: Vec<QueueEntry> = std::mem::take(&mut self.heap)
            .into_vec()
            .into_iter()
            .filter(|e| self.live.contains(&e.node))
            .collect();
        entries.sort_unstable_by(|a, b| {
            a.cost
                .remaining
                .cmp(&b.cost.remaining)
                .then_with(|| b.cmp(a))
        });

        let dropped: Vec<NodeId> = entries
            .get(keep..)
            .unwrap_or_default()
            .iter()
            .map(|e| e.node)
            .collect();
        entries.truncate(keep);

        for id in &dropped {
            self.live.remove(id);
        }
        self.heap = BinaryHeap::from(entries);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(node: NodeId, total: u32) -> QueueEntry {
        advanced(node, total, 0)
    }

    fn advanced(node: NodeId, total: u32, remaining: u32) -> QueueEntry {
        QueueEntry::new(
            node,
            Cost {
                total,
                remaining,
                swaps: 0,
            },
        )
    }

    #[test]
    fn test_heap_pops_lowest_cost_then_oldest() {
        let mut heap = CostHeap::default();
        heap.push(entry(3, 5));
        heap.push(entry(1, 5));
        heap.push(entry(2, 4));
        heap.push(entry(0, 9));

        let order: Vec<NodeId> = std::iter::from_fn(|| heap.pop()).map(|e| e.node).collect();
        assert_eq!(order, vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_heap_skips_retired() {
        let mut heap = CostHeap::default();
        heap.push(entry(0, 1));
        heap.push(entry(1, 2));
        assert!(heap.retire(0));
        assert!(!heap.retire(0));
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.pop().map(|e| e.node), Some(1));
        assert!(heap.pop().is_none());
    }

    #[test]
    fn test_heap_trim_keeps_best_on_equal_progress() {
        let mut heap = CostHeap::default();
        for (id, total) in [(0, 7), (1, 3), (2, 5), (3, 3), (4, 9)] {
            heap.push(entry(id, total));
        }
        heap.retire(2);
        let mut dropped = heap.trim_slowest(2);
        dropped.sort_unstable();
        assert_eq!(dropped, vec![0, 4]);
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.pop().map(|e| e.node), Some(1));
        assert_eq!(heap.pop().map(|e| e.node), Some(3));
    }

    #[test]
    fn test_heap_trim_keeps_most_advanced() {
        let mut heap = CostHeap::default();
        // Cheap but shallow entries lose to deeper, costlier ones.
        heap.push(advanced(0, 4, 9));
        heap.push(advanced(1, 5, 9));
        heap.push(advanced(2, 20, 3));
        heap.push(advanced(3, 12, 5));
        let mut dropped = heap.trim_slowest(2);
        dropped.sort_unstable();
        assert_eq!(dropped, vec![0, 1]);
        assert_eq!(heap.pop().map(|e| e.node), Some(3));
        assert_eq!(heap.pop().map(|e| e.node), Some(2));
    }
}
