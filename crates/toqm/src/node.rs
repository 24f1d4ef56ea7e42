//! Search nodes: partial schedules.
//!
//! A [`Node`] records the state reached after committing some prefix of the
//! schedule: the current logical/physical assignment, how far each logical
//! qubit has advanced through its gate chain, and when each physical qubit
//! becomes free. Only the operations committed by the node itself are kept
//! in [`Node::steps`]; the full history is recovered by walking parent ids
//! through the arena.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::context::SearchContext;
use crate::cost::Cost;
use crate::latency::LatencyQuery;

/// Node identifier. Ids are handed out in creation order, so comparing two
/// ids compares creation time.
pub type NodeId = u64;

/// Whether a node may still rearrange the initial layout for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutPhase {
    /// Layout is fixed.
    Closed,
    /// Free swaps are allowed; `budget` is the number left, `None` for no cap.
    Open {
        /// Remaining free swaps.
        budget: Option<u32>,
    },
}

impl LayoutPhase {
    /// Whether at least one more free swap is allowed.
    pub fn can_swap(self) -> bool {
        match self {
            Self::Closed => false,
            Self::Open { budget } => budget.is_none_or(|b| b > 0),
        }
    }
}

/// What a committed step executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOp {
    /// The input gate with this index.
    Gate(usize),
    /// A router-inserted swap.
    Swap,
}

/// One committed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Executed operation.
    pub op: StepOp,
    /// Physical control (or first swap endpoint).
    pub physical_control: Option<u32>,
    /// Physical target (or second swap endpoint).
    pub physical_target: u32,
    /// Start cycle.
    pub cycle: u32,
    /// Duration.
    pub latency: u32,
}

/// A partial schedule.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    laq: Vec<u32>,
    qal: Vec<Option<u32>>,
    cursor: Vec<u32>,
    busy: Vec<u32>,
    touched: Vec<bool>,
    remaining: u32,
    swaps: u32,
    makespan: u32,
    layout: LayoutPhase,
    start_laq: Arc<[u32]>,
    steps: Vec<Step>,
    cost: Cost,
}

impl Node {
    /// Create a root node with the given logical-to-physical layout.
    ///
    /// The root is not flushed; callers that want a closed layout flush it.
    pub fn root(ctx: &SearchContext<'_>, laq: Vec<u32>, layout: LayoutPhase) -> Self {
        let num_physical = ctx.num_physical() as usize;
        let mut qal = vec![None; num_physical];
        for (logical, &physical) in laq.iter().enumerate() {
            qal[physical as usize] = Some(logical as u32);
        }
        Self {
            id: 0,
            parent: None,
            cursor: vec![0; laq.len()],
            start_laq: Arc::from(laq.as_slice()),
            laq,
            qal,
            busy: vec![0; num_physical],
            touched: vec![false; num_physical],
            remaining: ctx.circuit.len() as u32,
            swaps: 0,
            makespan: 0,
            layout,
            steps: Vec::new(),
            cost: Cost::default(),
        }
    }

    /// A copy of this node's state as a fresh child with no steps of its own.
    pub fn child(&self) -> Self {
        Self {
            id: 0,
            parent: Some(self.id),
            laq: self.laq.clone(),
            qal: self.qal.clone(),
            cursor: self.cursor.clone(),
            busy: self.busy.clone(),
            touched: self.touched.clone(),
            remaining: self.remaining,
            swaps: self.swaps,
            makespan: self.makespan,
            layout: self.layout,
            start_laq: Arc::clone(&self.start_laq),
            steps: Vec::new(),
            cost: self.cost,
        }
    }

    /// Node id.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    /// Parent id, `None` for roots.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Logical-to-physical assignment.
    #[inline]
    pub fn laq(&self) -> &[u32] {
        &self.laq
    }

    /// Physical-to-logical assignment.
    #[inline]
    pub fn qal(&self) -> &[Option<u32>] {
        &self.qal
    }

    /// Physical qubit currently holding `logical`.
    #[inline]
    pub fn physical_of(&self, logical: u32) -> u32 {
        self.laq[logical as usize]
    }

    /// Per-logical number of committed gates.
    #[inline]
    pub fn cursor(&self) -> &[u32] {
        &self.cursor
    }

    /// Per-physical next free cycle.
    #[inline]
    pub fn busy(&self) -> &[u32] {
        &self.busy
    }

    /// Whether any committed operation used `physical`.
    #[inline]
    pub fn is_touched(&self, physical: u32) -> bool {
        self.touched[physical as usize]
    }

    /// Number of gates not yet committed.
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether every gate has been committed.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.remaining == 0
    }

    /// Number of inserted swaps along the path to this node.
    #[inline]
    pub fn num_swaps(&self) -> u32 {
        self.swaps
    }

    /// First cycle after every committed operation has finished.
    #[inline]
    pub fn makespan(&self) -> u32 {
        self.makespan
    }

    /// Layout phase.
    #[inline]
    pub fn layout(&self) -> LayoutPhase {
        self.layout
    }

    /// Initial layout this node's schedule starts from.
    #[inline]
    pub fn start_laq(&self) -> &[u32] {
        &self.start_laq
    }

    /// Operations committed by this node, not by its ancestors.
    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Cached cost.
    #[inline]
    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// Replace the cached cost.
    pub fn set_cost(&mut self, cost: Cost) {
        self.cost = cost;
    }

    /// Fix the layout.
    pub fn close_layout(&mut self) {
        self.layout = LayoutPhase::Closed;
    }

    /// The gate at the head of `logical`'s chain, if any.
    #[inline]
    pub fn next_gate(&self, ctx: &SearchContext<'_>, logical: u32) -> Option<usize> {
        ctx.circuit.gate_at(logical, self.cursor[logical as usize])
    }

    /// Whether `gate` heads the chain of every one of its operands.
    pub fn is_ready(&self, ctx: &SearchContext<'_>, gate: usize) -> bool {
        ctx.circuit
            .gate(gate)
            .qubits()
            .all(|q| self.next_gate(ctx, q) == Some(gate))
    }

    /// Commit every ready gate that needs no routing, repeatedly, in gate
    /// order. Returns whether anything was committed.
    pub fn flush(&mut self, ctx: &SearchContext<'_>) -> bool {
        let mut progressed = false;
        let mut ready = Vec::new();
        loop {
            ready.clear();
            ready.extend(
                (0..self.laq.len() as u32)
                    .filter_map(|q| self.next_gate(ctx, q))
                    .filter(|&g| self.is_ready(ctx, g)),
            );
            ready.sort_unstable();
            ready.dedup();

            let mut committed = false;
            for &gate in &ready {
                let op = ctx.circuit.gate(gate);
                if let Some(control) = op.control {
                    if !ctx
                        .coupling
                        .is_adjacent(self.physical_of(control), self.physical_of(op.target))
                    {
                        continue;
                    }
                }
                self.execute(ctx, gate);
                committed = true;
            }
            if !committed {
                return progressed;
            }
            progressed = true;
        }
    }

    fn execute(&mut self, ctx: &SearchContext<'_>, gate: usize) {
        let op = ctx.circuit.gate(gate);
        let target = self.physical_of(op.target);
        let control = op.control.map(|c| self.physical_of(c));
        let latency = ctx
            .latency
            .latency(&LatencyQuery::placed(&op.kind, control, target));
        let start = self.occupy(control, target, latency);

        for q in op.qubits() {
            self.cursor[q as usize] += 1;
        }
        self.remaining -= 1;
        self.layout = LayoutPhase::Closed;
        self.steps.push(Step {
            op: StepOp::Gate(gate),
            physical_control: control,
            physical_target: target,
            cycle: start,
            latency,
        });
    }

    /// Reserve the operands from their common free cycle; returns the start.
    fn occupy(&mut self, control: Option<u32>, target: u32, latency: u32) -> u32 {
        let start = control
            .map_or(0, |c| self.busy[c as usize])
            .max(self.busy[target as usize]);
        let end = start + latency;
        for p in control.into_iter().chain(std::iter::once(target)) {
            self.busy[p as usize] = end;
            self.touched[p as usize] = true;
        }
        self.makespan = self.makespan.max(end);
        start
    }

    fn exchange(&mut self, a: u32, b: u32) {
        self.qal.swap(a as usize, b as usize);
        for p in [a, b] {
            if let Some(logical) = self.qal[p as usize] {
                self.laq[logical as usize] = p;
            }
        }
    }

    /// Insert a timed swap on the edge `(a, b)`. Fixes the layout.
    pub fn apply_swap(&mut self, ctx: &SearchContext<'_>, a: u32, b: u32) {
        let latency = ctx.latency.latency(&LatencyQuery::swap(a, b));
        let start = self.occupy(Some(a), b, latency);
        self.exchange(a, b);
        self.swaps += 1;
        self.layout = LayoutPhase::Closed;
        self.steps.push(Step {
            op: StepOp::Swap,
            physical_control: Some(a),
            physical_target: b,
            cycle: start,
            latency,
        });
    }

    /// Exchange two physical qubits in the initial layout without spending
    /// cycles. Returns `false` (and changes nothing) if the layout is fixed
    /// or the free-swap budget is spent.
    pub fn apply_free_swap(&mut self, a: u32, b: u32) -> bool {
        let LayoutPhase::Open { budget } = self.layout else {
            return false;
        };
        if !self.layout.can_swap() {
            return false;
        }
        self.exchange(a, b);
        self.start_laq = Arc::from(self.laq.as_slice());
        self.layout = LayoutPhase::Open {
            budget: budget.map(|b| b.saturating_sub(1)),
        };
        true
    }

    /// Move an untouched logical qubit to a free, untouched physical qubit,
    /// rewriting the initial layout to match. Returns `false` if either
    /// qubit has taken part in a committed operation or `physical` is
    /// occupied.
    pub fn relocate(&mut self, logical: u32, physical: u32) -> bool {
        let from = self.physical_of(logical);
        if from == physical
            || self.touched[from as usize]
            || self.touched[physical as usize]
            || self.qal[physical as usize].is_some()
        {
            return false;
        }
        self.qal[from as usize] = None;
        self.qal[physical as usize] = Some(logical);
        self.laq[logical as usize] = physical;

        let mut start = self.start_laq.to_vec();
        start[logical as usize] = physical;
        self.start_laq = Arc::from(start);
        true
    }

    /// Hash of the state that decides which schedules can still follow:
    /// assignment, gate cursors and layout phase.
    pub fn signature(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.laq.hash(&mut hasher);
        self.cursor.hash(&mut hasher);
        self.layout.hash(&mut hasher);
        hasher.finish()
    }

    /// Whether `other` has exactly the same signature state.
    pub fn same_signature(&self, other: &Node) -> bool {
        self.laq == other.laq && self.cursor == other.cursor && self.layout == other.layout
    }

    /// Whether every physical qubit is free no later here than in `other`.
    pub fn dominates(&self, other: &Node) -> bool {
        dominates(&self.busy, &other.busy)
    }
}

/// Componentwise `a <= b`.
pub(crate) fn dominates(a: &[u32], b: &[u32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x <= y)
}
