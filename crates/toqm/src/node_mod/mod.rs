//! In-place node rewrites applied before a node is queued.

mod greedy_mapper;

use std::fmt;

use crate::context::SearchContext;
use crate::node::Node;

pub use greedy_mapper::GreedyMapper;

/// Node modifier policy.
///
/// A modifier may rewrite a node's assignment or layout but must leave its
/// committed operations alone. The engine re-scores any node a modifier
/// reports as changed.
pub trait NodeMod: Send + Sync + fmt::Debug {
    /// Name of the modifier, for logging.
    fn name(&self) -> &str;

    /// Rewrite `node` in place. Returns whether anything changed.
    fn modify(&self, node: &mut Node, ctx: &SearchContext<'_>) -> bool;

    /// Duplicate this modifier into an independently owned box.
    fn clone_box(&self) -> Box<dyn NodeMod>;
}

impl Clone for Box<dyn NodeMod> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
