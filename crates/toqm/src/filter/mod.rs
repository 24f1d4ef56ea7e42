//! Duplicate and dominated-state pruning.
//!
//! Two nodes with the same signature (assignment, gate cursors and layout
//! phase) can be followed by exactly the same operations. If one of them
//! frees every physical qubit no later than the other, the other can never
//! lead to a shorter schedule and is pruned.
//!
//! Filters keep a table of what they have seen, so every search run owns
//! private instances; [`Filter::clone_box`] hands out an empty table.

mod hash_filter;
mod hash_filter2;

use std::fmt;

use crate::node::{Node, NodeId};

pub use hash_filter::HashFilter;
pub use hash_filter2::HashFilter2;

/// Outcome of filtering a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    /// Keep the node. Already-queued nodes listed in `retire` are dominated
    /// by it and should be withdrawn.
    Accept {
        /// Ids of dominated nodes.
        retire: Vec<NodeId>,
    },
    /// Discard the node.
    Reject,
}

impl FilterVerdict {
    /// Accept without retiring anything.
    pub fn accept() -> Self {
        Self::Accept { retire: Vec::new() }
    }

    /// Whether the node was rejected.
    pub fn is_reject(&self) -> bool {
        matches!(self, Self::Reject)
    }
}

/// Node filter policy.
pub trait Filter: Send + fmt::Debug {
    /// Name of the filter, used as the key of its pruning statistics.
    fn name(&self) -> &str;

    /// Decide whether to keep a freshly created node, recording it if kept.
    fn check(&mut self, node: &Node) -> FilterVerdict;

    /// Number of states currently recorded.
    fn len(&self) -> usize;

    /// Whether nothing has been recorded.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh filter with the same configuration and an empty table.
    fn clone_box(&self) -> Box<dyn Filter>;
}

impl Clone for Box<dyn Filter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
