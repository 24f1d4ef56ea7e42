use crate::context::SearchContext;
use crate::node::{LayoutPhase, Node};

use super::{Cost, CostFunc, serial_bound, split_swaps};

/// [`SimpleCost`](super::SimpleCost) tightened by the routing needed for
/// each logical qubit's first pending two-qubit gate.
///
/// A gate whose operands are `d` apart needs at least `d - 1` swaps, and
/// every swap occupies one of the two operands. The bound charges the best
/// possible split of those swaps across both operand timelines, so it stays
/// admissible.
///
/// While the layout is still open, free swaps can bring any operands
/// together, so only the serial bound applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct CXFrontier;

impl CXFrontier {
    /// Lower bound on the schedule length, or `None` if some pending gate
    /// joins qubits in different connected components.
    pub(crate) fn bound(node: &Node, ctx: &SearchContext<'_>) -> Option<u32> {
        let mut bound = serial_bound(node, ctx);
        if node.layout() != LayoutPhase::Closed {
            return Some(bound);
        }
        let circuit = ctx.circuit;
        let cursor = node.cursor();

        for q in 0..cursor.len() as u32 {
            let Some((_, gate)) = circuit.next_two_qubit(q, cursor[q as usize]) else {
                continue;
            };
            let op = circuit.gate(gate);
            let Some(control) = op.control else {
                continue;
            };
            let operands = [control, op.target];

            let distance = ctx
                .coupling
                .distance(node.physical_of(control), node.physical_of(op.target))?;

            let [ready_a, ready_b] = operands.map(|x| {
                let pos = circuit.position(gate, x);
                node.busy()[node.physical_of(x) as usize] + circuit.tail(x, cursor[x as usize])
                    - circuit.tail(x, pos)
            });
            let start = split_swaps(
                ready_a,
                ready_b,
                distance.saturating_sub(1),
                ctx.min_swap_latency,
            );
            let after = operands
                .iter()
                .map(|&x| circuit.tail(x, circuit.position(gate, x) + 1))
                .max()
                .unwrap_or(0);
            bound = bound.max(start + circuit.min_latency(gate) + after);
        }
        Some(bound)
    }
}

impl CostFunc for CXFrontier {
    fn name(&self) -> &str {
        "CXFrontier"
    }

    fn cost(&self, node: &Node, ctx: &SearchContext<'_>) -> Cost {
        match Self::bound(node, ctx) {
            Some(total) => Cost::for_node(node, total),
            None => Cost::UNREACHABLE,
        }
    }

    fn clone_box(&self) -> Box<dyn CostFunc> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use crate::coupling::CouplingMap;
    use crate::cost::{CXFull, SimpleCost};
    use crate::gate::GateOp;
    use crate::latency::Latency1_2_6;

    #[test]
    fn test_frontier_charges_swaps() {
        let gates = [GateOp::two_qubit(0, "cx", 0, 1)];
        let map = CouplingMap::linear(4);
        let circuit = Circuit::new(&gates, 2, &map, &Latency1_2_6).unwrap();
        let usable = [0, 1, 2, 3];
        let ctx = SearchContext::new(&circuit, &map, &Latency1_2_6, &usable);

        // Distance 3: two swaps, one per side, then the gate.
        let root = Node::root(&ctx, vec![0, 3], LayoutPhase::Closed);
        assert_eq!(CXFrontier.cost(&root, &ctx).total, 8);
        assert_eq!(SimpleCost.cost(&root, &ctx).total, 2);

        // Distance 2: one swap on either side.
        let root = Node::root(&ctx, vec![0, 2], LayoutPhase::Closed);
        assert_eq!(CXFrontier.cost(&root, &ctx).total, 8);

        let root = Node::root(&ctx, vec![0, 1], LayoutPhase::Closed);
        assert_eq!(CXFrontier.cost(&root, &ctx).total, 2);
    }

    #[test]
    fn test_open_layout_charges_no_routing() {
        let gates = [
            GateOp::two_qubit(0, "cx", 0, 1),
            GateOp::one_qubit(1, "h", 1),
        ];
        let map = CouplingMap::linear(4);
        let circuit = Circuit::new(&gates, 2, &map, &Latency1_2_6).unwrap();
        let usable = [0, 1, 2, 3];
        let ctx = SearchContext::new(&circuit, &map, &Latency1_2_6, &usable);

        let open = Node::root(&ctx, vec![0, 3], LayoutPhase::Open { budget: None });
        assert_eq!(CXFrontier.cost(&open, &ctx).total, 3);
        assert_eq!(CXFull.cost(&open, &ctx).total, 3);

        let closed = Node::root(&ctx, vec![0, 3], LayoutPhase::Closed);
        assert_eq!(CXFrontier.cost(&closed, &ctx).total, 9);
    }

    #[test]
    fn test_disconnected_operands_are_unreachable() {
        let gates = [GateOp::two_qubit(0, "cx", 0, 1)];
        let map = CouplingMap::new(4, [(0, 1), (2, 3)]).unwrap();
        let circuit = Circuit::new(&gates, 2, &map, &Latency1_2_6).unwrap();
        let usable = [0, 1, 2, 3];
        let ctx = SearchContext::new(&circuit, &map, &Latency1_2_6, &usable);

        let root = Node::root(&ctx, vec![0, 2], LayoutPhase::Closed);
        assert!(CXFrontier.cost(&root, &ctx).is_unreachable());
    }
}
