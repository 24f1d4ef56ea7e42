//! Search results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gate::ScheduledGateOp;

/// Outcome of a mapper run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToqmResult {
    /// Scheduled operations, sorted by start cycle and otherwise in commit
    /// order.
    pub scheduled_gates: Vec<ScheduledGateOp>,
    /// Live nodes left in the queue when the search stopped.
    pub remaining_in_queue: u64,
    /// Physical qubits on the device.
    pub num_physical_qubits: u32,
    /// Logical qubits in the circuit.
    pub num_logical_qubits: u32,
    /// Logical-to-physical layout the schedule starts from.
    pub initial_laq: Vec<u32>,
    /// Logical-to-physical assignment after the last operation.
    pub inferred_laq: Vec<u32>,
    /// Physical-to-logical assignment after the last operation.
    pub inferred_qal: Vec<Option<u32>>,
    /// Critical-path length ignoring connectivity.
    pub ideal_cycles: u32,
    /// Schedule length.
    pub cycles: u32,
    /// Inserted swaps.
    pub num_swaps: u32,
    /// Nodes popped from the queue.
    pub num_popped: u64,
    /// Nodes created, including filtered ones.
    pub nodes_created: u64,
    /// Nodes still stored when the search stopped.
    pub nodes_retained: u64,
    /// Nodes pruned, per filter name.
    pub filter_stats: BTreeMap<String, u64>,
    /// Whether the schedule covers the whole circuit. Only `false` for a
    /// best-effort result after the search budget ran out.
    pub terminal: bool,
}

impl ToqmResult {
    /// Router-inserted swaps, in schedule order.
    pub fn swaps(&self) -> impl Iterator<Item = &ScheduledGateOp> {
        self.scheduled_gates.iter().filter(|g| g.is_inserted_swap())
    }

    /// Physical-to-logical form of [`initial_laq`](Self::initial_laq).
    pub fn initial_qal(&self) -> Vec<Option<u32>> {
        let mut qal = vec![None; self.num_physical_qubits as usize];
        for (logical, &physical) in self.initial_laq.iter().enumerate() {
            if let Some(slot) = qal.get_mut(physical as usize) {
                *slot = Some(logical as u32);
            }
        }
        qal
    }
}

impl fmt::Display for ToqmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "//{} original cycles; {} cycles after routing; {} swaps",
            self.ideal_cycles, self.cycles, self.num_swaps
        )?;
        writeln!(f, "//initial layout: {:?}", self.initial_laq)?;
        for gate in &self.scheduled_gates {
            writeln!(f, "{gate}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{GateOp, ScheduledOp};

    fn sample() -> ToqmResult {
        ToqmResult {
            scheduled_gates: vec![
                ScheduledGateOp {
                    op: ScheduledOp::Swap,
                    physical_target: 1,
                    physical_control: Some(0),
                    cycle: 0,
                    latency: 6,
                },
                ScheduledGateOp {
                    op: ScheduledOp::Gate(GateOp::two_qubit(0, "cx", 0, 1)),
                    physical_target: 2,
                    physical_control: Some(1),
                    cycle: 6,
                    latency: 2,
                },
            ],
            remaining_in_queue: 1,
            num_physical_qubits: 3,
            num_logical_qubits: 2,
            initial_laq: vec![0, 2],
            inferred_laq: vec![1, 2],
            inferred_qal: vec![None, Some(0), Some(1)],
            ideal_cycles: 2,
            cycles: 8,
            num_swaps: 1,
            num_popped: 2,
            nodes_created: 3,
            nodes_retained: 2,
            filter_stats: BTreeMap::new(),
            terminal: true,
        }
    }

    #[test]
    fn test_swaps_and_initial_qal() {
        let result = sample();
        assert_eq!(result.swaps().count(), 1);
        assert_eq!(result.initial_qal(), vec![Some(0), None, Some(1)]);
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        assert!(text.starts_with("//2 original cycles; 8 cycles after routing; 1 swaps"));
        assert!(text.contains("swap q[0],q[1]; //cycle: 0"));
        assert!(text.contains("cx q[1],q[2]; //cycle: 6 //cx q[0],q[1];"));
    }

    #[test]
    fn test_json_round_trip() {
        let result = sample();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""kind":"swap""#));
        let back: ToqmResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
