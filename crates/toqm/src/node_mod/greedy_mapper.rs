use tracing::trace;

use crate::context::SearchContext;
use crate::node::Node;

use super::NodeMod;

/// Lazily places idle logical qubits next to their first partner.
///
/// A logical qubit that no committed operation has touched yet can still be
/// put anywhere without changing the schedule. When its next gate is a
/// two-qubit gate, it is moved to the free, never-used physical qubit
/// closest to its partner, provided that strictly shortens their distance.
/// The node's initial layout is rewritten to match. Qubits the caller placed
/// explicitly stay where they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyMapper;

impl NodeMod for GreedyMapper {
    fn name(&self) -> &str {
        "GreedyMapper"
    }

    fn modify(&self, node: &mut Node, ctx: &SearchContext<'_>) -> bool {
        let mut changed = false;
        for logical in 0..node.laq().len() as u32 {
            let physical = node.physical_of(logical);
            if ctx.is_fixed(logical) || node.is_touched(physical) {
                continue;
            }
            let Some(gate) = node.next_gate(ctx, logical) else {
                continue;
            };
            let op = ctx.circuit.gate(gate);
            let Some(control) = op.control else {
                continue;
            };
            let partner = if control == logical { op.target } else { control };
            let anchor = node.physical_of(partner);
            let current = ctx.coupling.distance(physical, anchor).unwrap_or(u32::MAX);

            let best = ctx
                .usable
                .iter()
                .filter(|&&p| node.qal()[p as usize].is_none() && !node.is_touched(p))
                .filter_map(|&p| ctx.coupling.distance(p, anchor).map(|d| (d, p)))
                .min();
            if let Some((distance, target)) = best {
                if distance < current && node.relocate(logical, target) {
                    trace!(
                        "Placed logical {} on physical {} next to logical {}",
                        logical, target, partner
                    );
                    changed = true;
                }
            }
        }
        changed
    }

    fn clone_box(&self) -> Box<dyn NodeMod> {
        Box::new(*self)
    }
}
