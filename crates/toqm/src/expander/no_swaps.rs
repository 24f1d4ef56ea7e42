use crate::context::SearchContext;
use crate::cost::CostFunc;
use crate::node::Node;

use super::{Expander, Successors};

/// Never inserts timed swaps.
///
/// Once the layout is fixed, a node's only successor is the node with
/// every routable gate committed, and a node that cannot advance is a dead
/// end. During an initial layout search free swaps are still explored, so
/// this expander can look for a layout that needs no routing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSwaps;

impl Expander for NoSwaps {
    fn name(&self) -> &str {
        "NoSwaps"
    }

    fn expand(&self, node: &Node, ctx: &SearchContext<'_>, cost: &dyn CostFunc) -> Vec<Node> {
        Successors {
            ctx,
            cost,
            timed_swaps: false,
        }
        .generate(node, |_, candidates| candidates)
    }

    fn clone_box(&self) -> Box<dyn Expander> {
        Box::new(*self)
    }
}
