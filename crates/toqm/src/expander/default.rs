use crate::context::SearchContext;
use crate::cost::CostFunc;
use crate::node::Node;

use super::{Expander, Successors};

/// Branches on every swap candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExpander;

impl Expander for DefaultExpander {
    fn name(&self) -> &str {
        "DefaultExpander"
    }

    fn expand(&self, node: &Node, ctx: &SearchContext<'_>, cost: &dyn CostFunc) -> Vec<Node> {
        Successors {
            ctx,
            cost,
            timed_swaps: true,
        }
        .generate(node, |_, candidates| candidates)
    }

    fn clone_box(&self) -> Box<dyn Expander> {
        Box::new(*self)
    }
}
