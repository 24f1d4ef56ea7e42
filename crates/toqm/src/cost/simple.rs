use crate::context::SearchContext;
use crate::node::Node;

use super::{Cost, CostFunc, serial_bound};

/// Makespan plus the serial latency of each logical qubit's remaining gates.
///
/// Admissible but loose: it ignores routing entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCost;

impl CostFunc for SimpleCost {
    fn name(&self) -> &str {
        "SimpleCost"
    }

    fn cost(&self, node: &Node, ctx: &SearchContext<'_>) -> Cost {
        Cost::for_node(node, serial_bound(node, ctx))
    }

    fn clone_box(&self) -> Box<dyn CostFunc> {
        Box::new(*self)
    }
}
