//! Successor generation.
//!
//! Expansion of a node with a fixed layout first commits every gate that
//! needs no routing. If gates remain, each swap candidate yields one child:
//! the swap is inserted at the earliest cycle both endpoints are free, and
//! whatever it unblocks is committed straight away.
//!
//! A node still in its layout phase instead yields a child that fixes the
//! layout, plus one child per free swap that rearranges the initial layout
//! without spending cycles. Free swaps may use any coupling edge with a
//! logical qubit on either end, so every placement stays reachable.
//!
//! A timed swap candidate is a coupling edge that brings the operands of
//! some logical qubit's next two-qubit gate strictly closer together.

mod default;
mod greedy_top_k;
mod no_swaps;

use std::collections::BTreeSet;
use std::fmt;

use rayon::prelude::*;

use crate::context::SearchContext;
use crate::cost::CostFunc;
use crate::node::{LayoutPhase, Node};

pub use default::DefaultExpander;
pub use greedy_top_k::GreedyTopK;
pub use no_swaps::NoSwaps;

/// A physical coupling edge, `(low, high)`.
pub type Edge = (u32, u32);

/// Expander policy.
pub trait Expander: Send + Sync + fmt::Debug {
    /// Name of the expander, for logging.
    fn name(&self) -> &str;

    /// Build the scored successors of `node`. The input is left untouched.
    fn expand(&self, node: &Node, ctx: &SearchContext<'_>, cost: &dyn CostFunc) -> Vec<Node>;

    /// Duplicate this expander into an independently owned box.
    fn clone_box(&self) -> Box<dyn Expander>;
}

impl Clone for Box<dyn Expander> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Edges that strictly shorten the distance between the operands of some
/// logical qubit's next two-qubit gate, in ascending order.
pub fn swap_candidates(node: &Node, ctx: &SearchContext<'_>) -> Vec<Edge> {
    let mut edges = BTreeSet::new();
    for gate in pending_two_qubit(node, ctx) {
        let op = ctx.circuit.gate(gate);
        let Some(control) = op.control else {
            continue;
        };
        let (pc, pt) = (node.physical_of(control), node.physical_of(op.target));
        let Some(distance) = ctx.coupling.distance(pc, pt) else {
            continue;
        };
        if distance <= 1 {
            continue;
        }
        for (moving, other) in [(pc, pt), (pt, pc)] {
            for &neighbor in ctx.coupling.neighbors(moving) {
                if ctx
                    .coupling
                    .distance(neighbor, other)
                    .is_some_and(|d| d < distance)
                {
                    edges.insert((moving.min(neighbor), moving.max(neighbor)));
                }
            }
        }
    }
    edges.into_iter().collect()
}

/// Edges a free swap may use: every coupling edge that moves at least one
/// logical qubit, in ascending order.
pub fn free_swap_candidates(node: &Node, ctx: &SearchContext<'_>) -> Vec<Edge> {
    let qal = node.qal();
    ctx.coupling
        .edges()
        .iter()
        .copied()
        .filter(|&(a, b)| qal[a as usize].is_some() || qal[b as usize].is_some())
        .collect()
}

/// Distinct next two-qubit gates over all logical qubits, ascending.
pub(crate) fn pending_two_qubit(node: &Node, ctx: &SearchContext<'_>) -> BTreeSet<usize> {
    node.cursor()
        .iter()
        .enumerate()
        .filter_map(|(q, &k)| ctx.circuit.next_two_qubit(q as u32, k))
        .map(|(_, gate)| gate)
        .collect()
}

/// How an expander spends routing effort.
pub(crate) struct Successors<'s, 'a> {
    pub(crate) ctx: &'s SearchContext<'a>,
    pub(crate) cost: &'s dyn CostFunc,
    /// Whether timed swaps may be inserted after the layout is fixed.
    pub(crate) timed_swaps: bool,
}

impl Successors<'_, '_> {
    /// Generate scored successors, letting `select` prune the candidate
    /// edges for the node they apply to.
    pub(crate) fn generate(
        &self,
        parent: &Node,
        select: impl Fn(&Node, Vec<Edge>) -> Vec<Edge> + Sync,
    ) -> Vec<Node> {
        let mut children = match parent.layout() {
            LayoutPhase::Open { .. } => self.layout_children(parent, &select),
            LayoutPhase::Closed => self.routed_children(parent, &select),
        };
        for child in &mut children {
            child.set_cost(self.cost.cost(child, self.ctx));
        }
        children
    }

    fn layout_children(
        &self,
        parent: &Node,
        select: &(impl Fn(&Node, Vec<Edge>) -> Vec<Edge> + Sync),
    ) -> Vec<Node> {
        let mut commit = parent.child();
        commit.close_layout();
        commit.flush(self.ctx);

        let mut children = vec![commit];
        if parent.layout().can_swap() {
            let candidates = select(parent, free_swap_candidates(parent, self.ctx));
            children.extend(self.build(&candidates, |&(a, b)| {
                let mut child = parent.child();
                child.apply_free_swap(a, b);
                child
            }));
        }
        children
    }

    fn routed_children(
        &self,
        parent: &Node,
        select: &(impl Fn(&Node, Vec<Edge>) -> Vec<Edge> + Sync),
    ) -> Vec<Node> {
        let mut base = parent.child();
        let progressed = base.flush(self.ctx);
        if base.is_terminal() {
            return vec![base];
        }
        if !self.timed_swaps {
            return if progressed { vec![base] } else { Vec::new() };
        }

        let candidates = select(&base, swap_candidates(&base, self.ctx));
        self.build(&candidates, |&(a, b)| {
            let mut child = base.clone();
            child.apply_swap(self.ctx, a, b);
            child.flush(self.ctx);
            child
        })
    }

    /// Build one child per candidate, across threads when enabled. Output
    /// order always follows `candidates`.
    fn build(&self, candidates: &[Edge], make: impl Fn(&Edge) -> Node + Sync + Send) -> Vec<Node> {
        if self.ctx.parallel && candidates.len() > 1 {
            candidates.par_iter().map(make).collect()
        } else {
            candidates.iter().map(make).collect()
        }
    }
}
