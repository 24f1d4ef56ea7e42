use crate::context::SearchContext;
use crate::node::{LayoutPhase, Node};

use super::{CXFrontier, Cost, CostFunc, split_swaps};

/// Lookahead over every pending gate.
///
/// Simulates the remaining circuit as soon as possible under the current
/// assignment. Each non-adjacent two-qubit gate is charged the swaps its
/// operands would need, with the swap latency halved for every two-qubit
/// layer the gate sits behind, since earlier routing tends to move later
/// operands too. The result is combined with [`CXFrontier`], so it is never
/// looser than the frontier bound, but it is not admissible.
#[derive(Debug, Clone, Copy, Default)]
pub struct CXFull;

impl CXFull {
    fn lookahead(node: &Node, ctx: &SearchContext<'_>) -> Option<u32> {
        let circuit = ctx.circuit;
        let cursor = node.cursor();
        let mut ready: Vec<u32> = node
            .laq()
            .iter()
            .map(|&p| node.busy()[p as usize])
            .collect();
        let mut layer = vec![0u32; ready.len()];

        let first = (0..cursor.len() as u32)
            .filter_map(|q| node.next_gate(ctx, q))
            .min()
            .unwrap_or(circuit.len());

        for gate in first..circuit.len() {
            let op = circuit.gate(gate);
            let target = op.target as usize;
            if circuit.position(gate, op.target) < cursor[target] {
                continue;
            }
            let Some(control) = op.control else {
                ready[target] += circuit.min_latency(gate);
                continue;
            };
            let control = control as usize;

            let distance = ctx.coupling.distance(
                node.physical_of(control as u32),
                node.physical_of(op.target),
            )?;
            let depth = layer[control].max(layer[target]);
            let swap_latency = ctx.min_swap_latency.checked_shr(depth).unwrap_or(0);
            let start = split_swaps(
                ready[control],
                ready[target],
                distance.saturating_sub(1),
                swap_latency,
            );
            let end = start + circuit.min_latency(gate);
            ready[control] = end;
            ready[target] = end;
            layer[control] = depth + 1;
            layer[target] = depth + 1;
        }
        Some(ready.into_iter().fold(node.makespan(), u32::max))
    }
}

impl CostFunc for CXFull {
    fn name(&self) -> &str {
        "CXFull"
    }

    fn cost(&self, node: &Node, ctx: &SearchContext<'_>) -> Cost {
        let bound = CXFrontier::bound(node, ctx).and_then(|frontier| {
            if node.layout() != LayoutPhase::Closed {
                return Some(frontier);
            }
            Some(frontier.max(Self::lookahead(node, ctx)?))
        });
        match bound {
            Some(total) => Cost::for_node(node, total),
            None => Cost::UNREACHABLE,
        }
    }

    fn clone_box(&self) -> Box<dyn CostFunc> {
        Box::new(*self)
    }
}
