//! Logical gate operations and their scheduled counterparts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical operation from the input gate list.
///
/// The input list is assumed to be topologically ordered: every gate appears
/// after all earlier gates that share one of its qubits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GateOp {
    /// Caller-assigned identifier, unique within one gate list.
    pub uid: u64,
    /// Gate type tag (e.g. `"cx"`, `"h"`, `"swap"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Target logical qubit.
    pub target: u32,
    /// Control logical qubit for two-qubit gates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<u32>,
}

impl GateOp {
    /// Create a single-qubit gate.
    pub fn one_qubit(uid: u64, kind: impl Into<String>, target: u32) -> Self {
        Self {
            uid,
            kind: kind.into(),
            target,
            control: None,
        }
    }

    /// Create a two-qubit gate.
    pub fn two_qubit(uid: u64, kind: impl Into<String>, control: u32, target: u32) -> Self {
        Self {
            uid,
            kind: kind.into(),
            target,
            control: Some(control),
        }
    }

    /// Number of qubits the gate acts on.
    pub fn arity(&self) -> u32 {
        if self.control.is_some() { 2 } else { 1 }
    }

    /// Whether this gate acts on two qubits.
    pub fn is_two_qubit(&self) -> bool {
        self.control.is_some()
    }

    /// Whether this is a swap gate (`swap` or `swp`, any case).
    pub fn is_swap(&self) -> bool {
        is_swap_kind(&self.kind)
    }

    /// Logical operands, control first.
    pub fn qubits(&self) -> impl Iterator<Item = u32> + use<> {
        self.control.into_iter().chain(std::iter::once(self.target))
    }
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind)?;
        if let Some(control) = self.control {
            write!(f, "q[{control}],")?;
        }
        write!(f, "q[{}]", self.target)
    }
}

/// Whether a gate type tag names a swap.
pub fn is_swap_kind(kind: &str) -> bool {
    kind.eq_ignore_ascii_case("swap") || kind.eq_ignore_ascii_case("swp")
}

/// What a scheduled entry executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "gate", rename_all = "snake_case")]
pub enum ScheduledOp {
    /// An input gate.
    Gate(GateOp),
    /// A swap inserted by the router.
    Swap,
}

/// A gate assigned to physical qubits and a start cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledGateOp {
    /// The executed operation.
    pub op: ScheduledOp,
    /// Physical qubit holding the target.
    pub physical_target: u32,
    /// Physical qubit holding the control, for two-qubit operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_control: Option<u32>,
    /// Start cycle.
    pub cycle: u32,
    /// Duration in cycles.
    pub latency: u32,
}

impl ScheduledGateOp {
    /// Whether this entry is a router-inserted swap.
    pub fn is_inserted_swap(&self) -> bool {
        matches!(self.op, ScheduledOp::Swap)
    }

    /// The input gate, if this entry is not an inserted swap.
    pub fn gate(&self) -> Option<&GateOp> {
        match &self.op {
            ScheduledOp::Gate(gate) => Some(gate),
            ScheduledOp::Swap => None,
        }
    }

    /// First cycle after this operation finishes.
    pub fn end_cycle(&self) -> u32 {
        self.cycle + self.latency
    }

    /// Physical operands, control first.
    pub fn physical_qubits(&self) -> impl Iterator<Item = u32> + use<> {
        self.physical_control
            .into_iter()
            .chain(std::iter::once(self.physical_target))
    }
}

impl fmt::Display for ScheduledGateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            ScheduledOp::Swap => write!(f, "swap ")?,
            ScheduledOp::Gate(gate) => write!(f, "{} ", gate.kind)?,
        }
        if let Some(control) = self.physical_control {
            write!(f, "q[{control}],")?;
        }
        write!(f, "q[{}]; //cycle: {}", self.physical_target, self.cycle)?;
        if let ScheduledOp::Gate(gate) = &self.op {
            write!(f, " //{gate};")?;
        }
        Ok(())
    }
}
