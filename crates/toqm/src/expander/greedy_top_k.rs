use crate::context::SearchContext;
use crate::cost::CostFunc;
use crate::node::Node;

use super::{Edge, Expander, Successors, pending_two_qubit};

/// Branches only on the `k` swap candidates that most reduce the summed
/// operand distance of the pending two-qubit gates.
///
/// Bounding the branching factor makes large circuits tractable but gives
/// up completeness: the optimal schedule may need a swap that ranked lower.
#[derive(Debug, Clone, Copy)]
pub struct GreedyTopK {
    k: usize,
}

impl GreedyTopK {
    /// Keep the best `k` candidates per node (at least one).
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1) }
    }

    /// Candidates kept per node.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Rank candidates by the change in summed operand distance, ties broken
    /// by edge order, and keep the first `k`.
    fn select(&self, node: &Node, ctx: &SearchContext<'_>, candidates: Vec<Edge>) -> Vec<Edge> {
        if candidates.len() <= self.k {
            return candidates;
        }
        let pairs: Vec<(u32, u32)> = pending_two_qubit(node, ctx)
            .into_iter()
            .filter_map(|gate| {
                let op = ctx.circuit.gate(gate);
                let control = op.control?;
                Some((node.physical_of(control), node.physical_of(op.target)))
            })
            .collect();

        let mut ranked: Vec<(i64, Edge)> = candidates
            .into_iter()
            .map(|edge| (distance_change(ctx, &pairs, edge), edge))
            .collect();
        ranked.sort_unstable();
        ranked.truncate(self.k);
        ranked.into_iter().map(|(_, edge)| edge).collect()
    }
}

fn distance_change(ctx: &SearchContext<'_>, pairs: &[(u32, u32)], (a, b): Edge) -> i64 {
    let moved = |p: u32| {
        if p == a {
            b
        } else if p == b {
            a
        } else {
            p
        }
    };
    pairs
        .iter()
        .filter_map(|&(pc, pt)| {
            let before = ctx.coupling.distance(pc, pt)?;
            let after = ctx.coupling.distance(moved(pc), moved(pt))?;
            Some(i64::from(after) - i64::from(before))
        })
        .sum()
}

impl Default for GreedyTopK {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Expander for GreedyTopK {
    fn name(&self) -> &str {
        "GreedyTopK"
    }

    fn expand(&self, node: &Node, ctx: &SearchContext<'_>, cost: &dyn CostFunc) -> Vec<Node> {
        Successors {
            ctx,
            cost,
            timed_swaps: true,
        }
        .generate(node, |n, candidates| self.select(n, ctx, candidates))
    }

    fn clone_box(&self) -> Box<dyn Expander> {
        Box::new(*self)
    }
}
