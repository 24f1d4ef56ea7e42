use rustc_hash::FxHashMap;

use crate::node::{Node, NodeId, dominates};

use super::{Filter, FilterVerdict};

/// Compact dominance filter.
///
/// Keys nodes by the 64-bit signature hash alone and remembers only each
/// node's id and free-time vector, so it uses less memory than
/// [`HashFilter`](super::HashFilter) but may, on a hash collision, prune a
/// node whose state differs. Besides rejecting dominated newcomers it asks
/// the engine to retire queued nodes that a newcomer dominates.
#[derive(Debug, Default)]
pub struct HashFilter2 {
    table: FxHashMap<u64, Vec<(NodeId, Box<[u32]>)>>,
    len: usize,
}

impl HashFilter2 {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Filter for HashFilter2 {
    fn name(&self) -> &str {
        "HashFilter2"
    }

    fn check(&mut self, node: &Node) -> FilterVerdict {
        let bucket = self.table.entry(node.signature()).or_default();
        if bucket.iter().any(|(_, busy)| dominates(busy, node.busy())) {
            return FilterVerdict::Reject;
        }

        let mut retire = Vec::new();
        bucket.retain(|(id, busy)| {
            let dominated = dominates(node.busy(), busy);
            if dominated {
                retire.push(*id);
            }
            !dominated
        });
        bucket.push((node.id(), node.busy().into()));
        self.len = self.len + 1 - retire.len();
        FilterVerdict::Accept { retire }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(Self::new())
    }
}
