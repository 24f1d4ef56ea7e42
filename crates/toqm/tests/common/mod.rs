//! Schedule validation shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use toqm::{CouplingMap, GateOp, ScheduledOp, ToqmResult};

/// Check that a terminal result is a legal schedule of `gates` on `coupling`.
///
/// Replays the schedule in cycle order from the initial layout and panics
/// with a description of the first violation:
/// - every input gate appears exactly once, on the physical qubits that hold
///   its logical operands at that point,
/// - two-qubit operations (inserted swaps included) use coupled qubits,
/// - no physical qubit runs two operations at once,
/// - gates on each logical qubit keep their input order,
/// - the final layout matches `inferred_laq`.
pub fn assert_valid_schedule(result: &ToqmResult, gates: &[GateOp], coupling: &CouplingMap) {
    assert!(result.terminal, "result is not terminal");

    let mut laq = result.initial_laq.clone();
    let mut qal = vec![None; coupling.num_qubits() as usize];
    for (logical, &physical) in laq.iter().enumerate() {
        assert!(qal[physical as usize].is_none(), "initial layout is not injective");
        qal[physical as usize] = Some(logical as u32);
    }

    let mut free_at = vec![0_u32; coupling.num_qubits() as usize];
    let mut next_index: BTreeMap<u32, usize> = BTreeMap::new();
    let mut seen = vec![false; gates.len()];
    let mut last_cycle = 0;

    for op in &result.scheduled_gates {
        assert!(op.cycle >= last_cycle, "schedule is not sorted by cycle");
        last_cycle = op.cycle;

        if let Some(control) = op.physical_control {
            assert!(
                coupling.is_adjacent(control, op.physical_target),
                "{op} uses uncoupled qubits"
            );
        }
        for p in op.physical_qubits() {
            assert!(
                op.cycle >= free_at[p as usize],
                "{op} starts while q[{p}] is busy until {}",
                free_at[p as usize]
            );
            free_at[p as usize] = op.end_cycle();
        }

        match &op.op {
            ScheduledOp::Swap => {
                let a = op.physical_control.expect("swap without control");
                let b = op.physical_target;
                qal.swap(a as usize, b as usize);
                for p in [a, b] {
                    if let Some(logical) = qal[p as usize] {
                        laq[logical as usize] = p;
                    }
                }
            }
            ScheduledOp::Gate(gate) => {
                let index = gates
                    .iter()
                    .position(|g| g.uid == gate.uid)
                    .expect("unknown gate uid");
                assert!(!seen[index], "gate {} scheduled twice", gate.uid);
                seen[index] = true;

                assert_eq!(op.physical_target, laq[gate.target as usize], "{op} target");
                assert_eq!(
                    op.physical_control,
                    gate.control.map(|c| laq[c as usize]),
                    "{op} control"
                );

                for q in gate.qubits() {
                    let expected = gates
                        .iter()
                        .enumerate()
                        .filter(|(_, g)| g.qubits().any(|x| x == q))
                        .map(|(i, _)| i)
                        .nth(*next_index.get(&q).unwrap_or(&0))
                        .expect("too many gates on qubit");
                    assert_eq!(expected, index, "gate order broken on logical qubit {q}");
                    *next_index.entry(q).or_default() += 1;
                }
            }
        }
    }

    assert!(seen.iter().all(|&s| s), "not every gate was scheduled");
    assert_eq!(laq, result.inferred_laq, "final layout mismatch");
    let end = result
        .scheduled_gates
        .iter()
        .map(|g| g.end_cycle())
        .max()
        .unwrap_or(0);
    assert_eq!(end, result.cycles, "cycle count mismatch");
    assert_eq!(result.swaps().count() as u32, result.num_swaps);
}

/// `count` two-qubit gates between pseudo-random distinct qubits.
pub fn scrambled_gates(num_qubits: u32, count: u64, seed: u64) -> Vec<GateOp> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move |bound: u32| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) % u64::from(bound)) as u32
    };
    (0..count)
        .map(|uid| {
            let control = next(num_qubits);
            let target = (control + 1 + next(num_qubits - 1)) % num_qubits;
            GateOp::two_qubit(uid, "cx", control, target)
        })
        .collect()
}
