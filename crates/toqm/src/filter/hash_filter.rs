use rustc_hash::FxHashMap;

use crate::node::{LayoutPhase, Node, dominates};

use super::{Filter, FilterVerdict};

/// Full signature of a recorded node, kept to resolve hash collisions.
#[derive(Debug, Clone)]
struct Seen {
    laq: Box<[u32]>,
    cursor: Box<[u32]>,
    layout: LayoutPhase,
    busy: Box<[u32]>,
}

impl Seen {
    fn new(node: &Node) -> Self {
        Self {
            laq: node.laq().into(),
            cursor: node.cursor().into(),
            layout: node.layout(),
            busy: node.busy().into(),
        }
    }

    fn same_state(&self, node: &Node) -> bool {
        *self.laq == *node.laq() && *self.cursor == *node.cursor() && self.layout == node.layout()
    }
}

/// Exact duplicate filter.
///
/// Rejects a node when a recorded node with an identical signature frees
/// every physical qubit no later. Full signatures are stored alongside the
/// 64-bit hash, so collisions never cause a wrong rejection.
#[derive(Debug, Default)]
pub struct HashFilter {
    table: FxHashMap<u64, Vec<Seen>>,
    len: usize,
}

impl HashFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Filter for HashFilter {
    fn name(&self) -> &str {
        "HashFilter"
    }

    fn check(&mut self, node: &Node) -> FilterVerdict {
        let bucket = self.table.entry(node.signature()).or_default();
        if bucket
            .iter()
            .any(|seen| seen.same_state(node) && dominates(&seen.busy, node.busy()))
        {
            return FilterVerdict::Reject;
        }

        let before = bucket.len();
        bucket.retain(|seen| !(seen.same_state(node) && dominates(node.busy(), &seen.busy)));
        let removed = before - bucket.len();
        bucket.push(Seen::new(node));
        self.len = self.len + 1 - removed;
        FilterVerdict::accept()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(Self::new())
    }
}
