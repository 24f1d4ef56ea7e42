//! Node cost functions.
//!
//! A [`CostFunc`] scores a node with a [`Cost`]: an estimate of the final
//! schedule length followed by tie-breakers. Costs must be pure functions of
//! the node and the search context so that runs are reproducible.

mod cx_frontier;
mod cx_full;
mod simple;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::SearchContext;
use crate::node::Node;

pub use cx_frontier::CXFrontier;
pub use cx_full::CXFull;
pub use simple::SimpleCost;

/// Lexicographically ordered node score; lower is better.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Cost {
    /// Estimated total schedule length in cycles.
    pub total: u32,
    /// Gates still to commit.
    pub remaining: u32,
    /// Swaps inserted so far.
    pub swaps: u32,
}

impl Cost {
    /// Marks a node from which no complete schedule exists.
    pub const UNREACHABLE: Self = Self {
        total: u32::MAX,
        remaining: u32::MAX,
        swaps: u32::MAX,
    };

    /// Score a node from a schedule-length estimate.
    pub fn for_node(node: &Node, total: u32) -> Self {
        Self {
            total,
            remaining: node.remaining(),
            swaps: node.num_swaps(),
        }
    }

    /// Whether this cost marks a dead end.
    #[inline]
    pub fn is_unreachable(&self) -> bool {
        *self == Self::UNREACHABLE
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unreachable() {
            return write!(f, "unreachable");
        }
        write!(
            f,
            "{} cycles ({} gates left, {} swaps)",
            self.total, self.remaining, self.swaps
        )
    }
}

/// Cost function policy.
pub trait CostFunc: Send + Sync + fmt::Debug {
    /// Name of the cost function, for logging.
    fn name(&self) -> &str;

    /// Score a node.
    fn cost(&self, node: &Node, ctx: &SearchContext<'_>) -> Cost;

    /// Duplicate this cost function into an independently owned box.
    fn clone_box(&self) -> Box<dyn CostFunc>;
}

impl Clone for Box<dyn CostFunc> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Earliest common start of two timelines after `swaps` swaps of
/// `swap_latency` cycles each are split between them as evenly as their
/// ready times allow.
pub(crate) fn split_swaps(ready_a: u32, ready_b: u32, swaps: u32, swap_latency: u32) -> u32 {
    (0..=swaps)
        .map(|x| (ready_a + x * swap_latency).max(ready_b + (swaps - x) * swap_latency))
        .min()
        .unwrap_or_else(|| ready_a.max(ready_b))
}

/// Makespan or the latest finish of any logical qubit running its remaining
/// gates back to back, whichever is larger.
pub(crate) fn serial_bound(node: &Node, ctx: &SearchContext<'_>) -> u32 {
    node.laq()
        .iter()
        .zip(node.cursor())
        .enumerate()
        .map(|(q, (&physical, &k))| node.busy()[physical as usize] + ctx.circuit.tail(q as u32, k))
        .fold(node.makespan(), u32::max)
}
