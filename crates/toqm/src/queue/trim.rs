use tracing::trace;

use crate::error::{MapperError, MapperResult};
use crate::node::NodeId;

use super::{CostHeap, NodeQueue, QueueEntry};

/// Priority queue that sheds its slowest nodes once it grows too large.
///
/// Every `check_interval` pushes, if more than `max_len` nodes are live, the
/// slow ones are discarded: only the `target_len` nodes with the fewest gates
/// left survive, cheaper first among equals. Pruning the stragglers forces
/// the search to commit to a path, which bounds both memory and run time on
/// large circuits at the price of optimality.
#[derive(Debug)]
pub struct TrimSlowNodes {
    max_len: usize,
    target_len: usize,
    check_interval: u32,
    pushes: u32,
    heap: CostHeap,
}

impl TrimSlowNodes {
    /// Default trigger size.
    pub const DEFAULT_MAX_LEN: usize = 1000;
    /// Default size after trimming.
    pub const DEFAULT_TARGET_LEN: usize = 500;

    /// Create a trimming queue.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] unless
    /// `1 <= target_len <= max_len`.
    pub fn new(max_len: usize, target_len: usize) -> MapperResult<Self> {
        if target_len == 0 || target_len > max_len {
            return Err(MapperError::Configuration(format!(
                "TrimSlowNodes needs 1 <= target_len <= max_len, got target {target_len} and max {max_len}"
            )));
        }
        Ok(Self {
            max_len,
            target_len,
            check_interval: 1,
            pushes: 0,
            heap: CostHeap::default(),
        })
    }

    /// Only check the size every `interval` pushes.
    #[must_use]
    pub fn with_check_interval(mut self, interval: u32) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    /// Trigger size.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Size after trimming.
    pub fn target_len(&self) -> usize {
        self.target_len
    }
}

impl Default for TrimSlowNodes {
    fn default() -> Self {
        Self {
            max_len: Self::DEFAULT_MAX_LEN,
            target_len: Self::DEFAULT_TARGET_LEN,
            check_interval: 1,
            pushes: 0,
            heap: CostHeap::default(),
        }
    }
}

impl NodeQueue for TrimSlowNodes {
    fn name(&self) -> &str {
        "TrimSlowNodes"
    }

    fn push(&mut self, entry: QueueEntry) -> Vec<NodeId> {
        self.heap.push(entry);
        self.pushes += 1;
        if self.pushes < self.check_interval {
            return Vec::new();
        }
        self.pushes = 0;

        if self.heap.len() <= self.max_len {
            return Vec::new();
        }
        let dropped = self.heap.trim_slowest(self.target_len);
        trace!("Trimmed {} slow nodes", dropped.len());
        dropped
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
        Box::new(Self {
            max_len: self.max_len,
            target_len: self.target_len,
            check_interval: self.check_interval,
            pushes: 0,
            heap: CostHeap::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Cost;

    fn entry(node: NodeId, total: u32) -> QueueEntry {
        QueueEntry::new(
            node,
            Cost {
                total,
                ..Cost::default()
            },
        )
    }

    #[test]
    fn test_trim_drops_worst() {
        let mut queue = TrimSlowNodes::new(3, 2).unwrap();
        assert!(queue.push(entry(0, 5)).is_empty());
        assert!(queue.push(entry(1, 1)).is_empty());
        assert!(queue.push(entry(2, 9)).is_empty());

        let mut dropped = queue.push(entry(3, 2));
        dropped.sort_unstable();
        assert_eq!(dropped, vec![0, 2]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().map(|e| e.node), Some(1));
        assert_eq!(queue.pop().map(|e| e.node), Some(3));
    }

    #[test]
    fn test_trim_prefers_progress_over_cost() {
        let shallow = |node, total| {
            QueueEntry::new(
                node,
                Cost {
                    total,
                    remaining: 6,
                    swaps: 0,
                },
            )
        };
        let mut queue = TrimSlowNodes::new(2, 1).unwrap();
        queue.push(shallow(0, 1));
        queue.push(shallow(1, 2));
        let deep = QueueEntry::new(
            2,
            Cost {
                total: 30,
                remaining: 1,
                swaps: 4,
            },
        );
        let mut dropped = queue.push(deep);
        dropped.sort_unstable();
        assert_eq!(dropped, vec![0, 1]);
        assert_eq!(queue.pop().map(|e| e.node), Some(2));
    }

    #[test]
    fn test_pushed_entry_may_be_dropped() {
        let mut queue = TrimSlowNodes::new(1, 1).unwrap();
        queue.push(entry(0, 1));
        assert_eq!(queue.push(entry(1, 8)), vec![1]);
    }

    #[test]
    fn test_check_interval() {
        let mut queue = TrimSlowNodes::new(1, 1).unwrap().with_check_interval(3);
        assert!(queue.push(entry(0, 3)).is_empty());
        assert!(queue.push(entry(1, 2)).is_empty());
        assert_eq!(queue.push(entry(2, 1)).len(), 2);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TrimSlowNodes::new(10, 0).is_err());
        assert!(TrimSlowNodes::new(10, 11).is_err());
        let queue = TrimSlowNodes::default();
        assert_eq!(queue.max_len(), 1000);
        assert_eq!(queue.target_len(), 500);
    }
}
