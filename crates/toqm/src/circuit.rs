//! Validated, indexed view of the input gate list.
//!
//! The search never touches the raw gate list directly. [`Circuit`] checks the
//! input once and precomputes the per-logical-qubit gate chains, minimum
//! latencies and latency tails that the expander and cost functions consult
//! on every node.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::coupling::CouplingMap;
use crate::error::{MapperError, MapperResult};
use crate::gate::GateOp;
use crate::latency::{Latency, LatencyQuery};

/// Prepared routing problem.
#[derive(Debug, Clone)]
pub struct Circuit {
    gates: Vec<GateOp>,
    num_logical: u32,
    /// Gate indices acting on each logical qubit, in program order.
    qubit_gates: Vec<Vec<usize>>,
    /// Position of each gate within its control's and target's chains.
    operand_pos: Vec<(Option<u32>, u32)>,
    /// Cheapest latency of each gate over every placement on the device.
    min_latency: Vec<u32>,
    /// `tails[q][k]` is the summed minimum latency of `qubit_gates[q][k..]`.
    tails: Vec<Vec<u32>>,
    /// `next_two[q][k]` is the chain position of the first two-qubit gate at
    /// or after `k`, or the chain length if there is none.
    next_two: Vec<Vec<u32>>,
    ideal_cycles: u32,
}

impl Circuit {
    /// Validate `gates` and build the search indices.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::QubitOutOfRange`] for an operand outside
    /// `[0, num_logical)`, [`MapperError::DuplicateOperand`] for a two-qubit
    /// gate acting twice on one qubit, and [`MapperError::DuplicateGateUid`]
    /// if two gates share a uid.
    pub fn new(
        gates: &[GateOp],
        num_logical: u32,
        coupling: &CouplingMap,
        latency: &dyn Latency,
    ) -> MapperResult<Self> {
        let mut uids = FxHashSet::default();
        for gate in gates {
            for qubit in gate.qubits() {
                if qubit >= num_logical {
                    return Err(MapperError::QubitOutOfRange {
                        uid: gate.uid,
                        qubit,
                        num_logical,
                    });
                }
            }
            if gate.control == Some(gate.target) {
                return Err(MapperError::DuplicateOperand {
                    uid: gate.uid,
                    qubit: gate.target,
                });
            }
            if !uids.insert(gate.uid) {
                return Err(MapperError::DuplicateGateUid(gate.uid));
            }
        }

        let n = num_logical as usize;
        let mut qubit_gates = vec![Vec::new(); n];
        let mut operand_pos = Vec::with_capacity(gates.len());
        for (index, gate) in gates.iter().enumerate() {
            let control_pos = gate.control.map(|c| {
                let chain = &mut qubit_gates[c as usize];
                chain.push(index);
                (chain.len() - 1) as u32
            });
            let chain = &mut qubit_gates[gate.target as usize];
            chain.push(index);
            operand_pos.push((control_pos, (chain.len() - 1) as u32));
        }

        let min_latency = min_latencies(gates, coupling, latency);

        let tails = qubit_gates
            .iter()
            .map(|chain| {
                let mut tail = vec![0; chain.len() + 1];
                for k in (0..chain.len()).rev() {
                    tail[k] = tail[k + 1] + min_latency[chain[k]];
                }
                tail
            })
            .collect();

        let next_two = qubit_gates
            .iter()
            .map(|chain| {
                let len = chain.len() as u32;
                let mut next = vec![len; chain.len() + 1];
                for k in (0..chain.len()).rev() {
                    next[k] = if gates[chain[k]].is_two_qubit() {
                        k as u32
                    } else {
                        next[k + 1]
                    };
                }
                next
            })
            .collect();

        let mut ready = vec![0u32; n];
        let mut ideal_cycles = 0;
        for (index, gate) in gates.iter().enumerate() {
            let start = gate.qubits().map(|q| ready[q as usize]).max().unwrap_or(0);
            let end = start + min_latency[index];
            for q in gate.qubits() {
                ready[q as usize] = end;
            }
            ideal_cycles = ideal_cycles.max(end);
        }

        Ok(Self {
            gates: gates.to_vec(),
            num_logical,
            qubit_gates,
            operand_pos,
            min_latency,
            tails,
            next_two,
            ideal_cycles,
        })
    }

    /// Number of gates.
    #[inline]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the circuit has no gates.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Number of logical qubits.
    #[inline]
    pub fn num_logical(&self) -> u32 {
        self.num_logical
    }

    /// All gates in program order.
    pub fn gates(&self) -> &[GateOp] {
        &self.gates
    }

    /// Gate by index.
    #[inline]
    pub fn gate(&self, index: usize) -> &GateOp {
        &self.gates[index]
    }

    /// Gate indices acting on a logical qubit, in program order.
    #[inline]
    pub fn chain(&self, qubit: u32) -> &[usize] {
        &self.qubit_gates[qubit as usize]
    }

    /// The gate at position `k` of a qubit's chain, if any.
    #[inline]
    pub fn gate_at(&self, qubit: u32, k: u32) -> Option<usize> {
        self.qubit_gates[qubit as usize].get(k as usize).copied()
    }

    /// Position of `gate` within the chain of its operand `qubit`.
    #[inline]
    pub fn position(&self, gate: usize, qubit: u32) -> u32 {
        let (control_pos, target_pos) = self.operand_pos[gate];
        if self.gates[gate].control == Some(qubit) {
            control_pos.unwrap_or(target_pos)
        } else {
            target_pos
        }
    }

    /// Cheapest latency of a gate over every placement on the device.
    #[inline]
    pub fn min_latency(&self, gate: usize) -> u32 {
        self.min_latency[gate]
    }

    /// Summed minimum latency of a qubit's gates from chain position `k` on.
    #[inline]
    pub fn tail(&self, qubit: u32, k: u32) -> u32 {
        let tail = &self.tails[qubit as usize];
        tail.get(k as usize).copied().unwrap_or(0)
    }

    /// First two-qubit gate at or after chain position `k`, as
    /// `(position, gate index)`.
    #[inline]
    pub fn next_two_qubit(&self, qubit: u32, k: u32) -> Option<(u32, usize)> {
        let pos = *self.next_two[qubit as usize].get(k as usize)?;
        self.gate_at(qubit, pos).map(|gate| (pos, gate))
    }

    /// Critical-path length of the circuit using minimum latencies and
    /// ignoring connectivity.
    #[inline]
    pub fn ideal_cycles(&self) -> u32 {
        self.ideal_cycles
    }
}

fn min_latencies(gates: &[GateOp], coupling: &CouplingMap, latency: &dyn Latency) -> Vec<u32> {
    let mut cache: FxHashMap<(&str, u32), u32> = FxHashMap::default();
    gates
        .iter()
        .map(|gate| {
            *cache
                .entry((gate.kind.as_str(), gate.arity()))
                .or_insert_with(|| cheapest_placement(&gate.kind, gate.arity(), coupling, latency))
        })
        .collect()
}

fn cheapest_placement(kind: &str, arity: u32, coupling: &CouplingMap, latency: &dyn Latency) -> u32 {
    let cheapest = if arity < 2 {
        (0..coupling.num_qubits())
            .map(|p| latency.latency(&LatencyQuery::placed(kind, None, p)))
            .min()
    } else {
        coupling
            .edges()
            .iter()
            .flat_map(|&(a, b)| [(a, b), (b, a)])
            .map(|(c, t)| latency.latency(&LatencyQuery::placed(kind, Some(c), t)))
            .min()
    };
    cheapest.unwrap_or_else(|| latency.latency(&LatencyQuery::unplaced(kind, arity)))
}
