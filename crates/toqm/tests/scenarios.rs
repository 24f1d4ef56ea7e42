//! End-to-end routing scenarios.

mod common;

use std::time::Duration;

use common::{assert_valid_schedule, scrambled_gates};
use toqm::cost::{CXFrontier, CXFull, SimpleCost};
use toqm::expander::{DefaultExpander, GreedyTopK, NoSwaps};
use toqm::filter::{HashFilter, HashFilter2};
use toqm::latency::{Latency1, Latency1_2_6, Latency1_3};
use toqm::node_mod::GreedyMapper;
use toqm::queue::{DefaultQueue, TrimSlowNodes};
use toqm::{
    CouplingMap, GateOp, InitialMapping, InitialSearch, MapperConfig, MapperError,
    OptimalStrategy, OptimizationLevel, ScheduledOp, Strategy, ToqmMapper,
};

fn optimal() -> ToqmMapper {
    ToqmMapper::new(DefaultQueue::new(), DefaultExpander, CXFrontier, Latency1_2_6)
}

/// Every ordering of `0..n`.
fn permutations(n: u32) -> Vec<Vec<u32>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for shorter in permutations(n - 1) {
        for slot in 0..=shorter.len() {
            let mut laq = shorter.clone();
            laq.insert(slot, n - 1);
            out.push(laq);
        }
    }
    out
}

/// Shortest schedule over every fixed initial layout.
fn best_fixed_layout(gates: &[GateOp], coupling: &CouplingMap) -> u32 {
    permutations(coupling.num_qubits())
        .into_iter()
        .map(|laq| {
            let base = MapperConfig {
                initial_mapping: Some(InitialMapping::Laq(laq)),
                ..MapperConfig::default()
            };
            OptimalStrategy::new(false, false)
                .run(gates, coupling.num_qubits(), coupling, &Latency1_2_6, &base)
                .unwrap()
                .cycles
        })
        .min()
        .unwrap()
}

#[test]
fn test_single_edge_needs_no_swap() {
    let gates = [GateOp::two_qubit(0, "cx", 0, 1)];
    let coupling = CouplingMap::linear(2);

    let result = optimal().run(&gates, 2, &coupling).unwrap();
    assert_valid_schedule(&result, &gates, &coupling);
    assert_eq!(result.num_swaps, 0);
    assert_eq!(result.cycles, 2);
    assert_eq!(result.ideal_cycles, 2);
    assert_eq!(result.initial_laq, vec![0, 1]);
    assert_eq!(result.scheduled_gates[0].physical_control, Some(0));
    assert_eq!(result.scheduled_gates[0].physical_target, 1);
}

#[test]
fn test_path_needs_one_swap() {
    let gates = [GateOp::two_qubit(0, "cx", 0, 2)];
    let coupling = CouplingMap::linear(3);

    let result = optimal().run(&gates, 3, &coupling).unwrap();
    assert_valid_schedule(&result, &gates, &coupling);
    assert_eq!(result.num_swaps, 1);
    assert_eq!(result.cycles, 6 + 2);
    assert_eq!(result.ideal_cycles, 2);
    assert!(result.scheduled_gates[0].is_inserted_swap());
    assert_eq!(result.scheduled_gates[1].cycle, 6);
    // Equal-cost swaps resolve to the first candidate edge.
    assert_eq!(result.inferred_laq, vec![1, 0, 2]);
    assert_eq!(result.inferred_qal, vec![Some(1), Some(0), Some(2)]);
}

#[test]
fn test_independent_gates_run_in_parallel() {
    let gates = [
        GateOp::one_qubit(0, "h", 0),
        GateOp::two_qubit(1, "cx", 0, 1),
        GateOp::two_qubit(2, "cx", 2, 3),
        GateOp::one_qubit(3, "x", 3),
    ];
    let coupling = CouplingMap::linear(4);

    let result = optimal().run(&gates, 4, &coupling).unwrap();
    assert_valid_schedule(&result, &gates, &coupling);
    assert_eq!(result.cycles, 3);
    assert_eq!(result.cycles, result.ideal_cycles);
}

#[test]
fn test_no_swaps_on_routable_circuit() {
    let gates = [
        GateOp::two_qubit(0, "cx", 0, 1),
        GateOp::two_qubit(1, "cx", 1, 2),
        GateOp::two_qubit(2, "cx", 2, 3),
        GateOp::one_qubit(3, "h", 0),
    ];
    let coupling = CouplingMap::linear(4);
    let mapper = ToqmMapper::new(DefaultQueue::new(), NoSwaps, CXFrontier, Latency1_2_6);

    let result = mapper.run(&gates, 4, &coupling).unwrap();
    assert_valid_schedule(&result, &gates, &coupling);
    assert_eq!(result.num_swaps, 0);
    assert_eq!(result.cycles, result.ideal_cycles);

    let again = mapper.run(&gates, 4, &coupling).unwrap();
    assert_eq!(again.scheduled_gates, result.scheduled_gates);
}

#[test]
fn test_no_swaps_fails_when_routing_is_needed() {
    let gates = [GateOp::two_qubit(0, "cx", 0, 2)];
    let mapper = ToqmMapper::new(DefaultQueue::new(), NoSwaps, CXFrontier, Latency1_2_6);
    let err = mapper.run(&gates, 3, &CouplingMap::linear(3)).unwrap_err();
    assert!(matches!(err, MapperError::EmptyQueue { .. }));
}

#[test]
fn test_layout_search_finds_swap_free_placement() {
    let gates = [
        GateOp::two_qubit(0, "cx", 0, 2),
        GateOp::two_qubit(1, "cx", 2, 1),
    ];
    let coupling = CouplingMap::linear(3);
    let mut mapper = optimal().with_filter(HashFilter::new());
    mapper.set_initial_search_cycles(-1);

    let result = mapper.run(&gates, 3, &coupling).unwrap();
    assert_valid_schedule(&result, &gates, &coupling);
    assert_eq!(result.num_swaps, 0);
    assert_eq!(result.cycles, 4);
    // Logical 2 has to sit in the middle.
    assert_eq!(result.initial_laq[2], 1);
}

#[test]
fn test_initial_mapping_is_respected() {
    let gates = [GateOp::two_qubit(0, "cx", 0, 1)];
    let coupling = CouplingMap::linear(4);
    let mut mapper = optimal();
    mapper.set_initial_mapping_laq(vec![0, 3]);

    let result = mapper.run(&gates, 2, &coupling).unwrap();
    assert_valid_schedule(&result, &gates, &coupling);
    assert_eq!(result.initial_laq, vec![0, 3]);
    assert_eq!(result.num_swaps, 2);
    assert_eq!(result.initial_qal(), vec![Some(0), None, None, Some(1)]);
}

#[test]
fn test_partial_qal_is_completed() {
    let gates = [GateOp::two_qubit(0, "cx", 0, 1)];
    let coupling = CouplingMap::linear(4);
    let mut mapper = optimal();
    mapper.set_initial_mapping_qal(vec![None, None, Some(1), None]);

    let result = mapper.run(&gates, 2, &coupling).unwrap();
    assert_valid_schedule(&result, &gates, &coupling);
    assert_eq!(result.initial_laq, vec![1, 2]);
    assert_eq!(result.num_swaps, 0);
}

#[test]
fn test_trim_queue_still_completes() {
    let gates = scrambled_gates(6, 12, 7);
    let coupling = CouplingMap::ring(6);
    let mapper = ToqmMapper::new(
        TrimSlowNodes::new(20, 5).unwrap(),
        GreedyTopK::new(2),
        CXFrontier,
        Latency1_2_6,
    )
    .with_node_mod(GreedyMapper);

    let result = mapper.run(&gates, 6, &coupling).unwrap();
    assert_valid_schedule(&result, &gates, &coupling);
    assert!(result.remaining_in_queue <= 20);
}

#[test]
fn test_small_trim_queue_keeps_schedules_whole() {
    let coupling = CouplingMap::linear(6);
    let mut config = MapperConfig::default();
    config.budget.max_popped = Some(200_000);
    let mapper = ToqmMapper::new(
        TrimSlowNodes::new(4, 2).unwrap(),
        DefaultExpander,
        CXFrontier,
        Latency1_2_6,
    )
    .with_config(config);

    for seed in 0..12 {
        let gates = scrambled_gates(6, 8, seed);
        let result = mapper.run(&gates, 6, &coupling).unwrap();
        assert_valid_schedule(&result, &gates, &coupling);
        let routed = result.scheduled_gates.len() - result.num_swaps as usize;
        assert_eq!(routed, gates.len(), "seed {seed}");
    }
}

#[test]
fn test_heuristic_levels_finish_on_grid() {
    let gates = scrambled_gates(9, 30, 0);
    let coupling = CouplingMap::grid(3, 3);
    let mut base = MapperConfig::default();
    base.budget.max_popped = Some(200_000);

    for level in [OptimizationLevel::O1, OptimizationLevel::O2] {
        assert!(!level.uses_optimal(coupling.num_qubits()));
        let result = level
            .run(&gates, 9, &coupling, &Latency1_2_6, &base)
            .unwrap();
        assert!(result.terminal, "{level:?}");
        assert_valid_schedule(&result, &gates, &coupling);
    }
}

#[test]
fn test_layout_search_matches_best_fixed_layout() {
    let line = CouplingMap::linear(4);
    let gates = [
        GateOp::two_qubit(0, "cx", 2, 1),
        GateOp::two_qubit(1, "cx", 2, 1),
        GateOp::two_qubit(2, "cx", 3, 0),
        GateOp::two_qubit(3, "cx", 3, 1),
    ];
    let searched = OptimalStrategy::new(true, false)
        .run(&gates, 4, &line, &Latency1_2_6, &MapperConfig::default())
        .unwrap();
    assert_valid_schedule(&searched, &gates, &line);
    assert_eq!(searched.cycles, 6);
    assert_eq!(best_fixed_layout(&gates, &line), 6);

    for coupling in [CouplingMap::linear(4), CouplingMap::grid(2, 2)] {
        for seed in 0..4 {
            let gates = scrambled_gates(4, 5, seed);
            let searched = OptimalStrategy::new(true, false)
                .run(&gates, 4, &coupling, &Latency1_2_6, &MapperConfig::default())
                .unwrap();
            assert_valid_schedule(&searched, &gates, &coupling);
            assert_eq!(
                searched.cycles,
                best_fixed_layout(&gates, &coupling),
                "seed {seed}"
            );
        }
    }
}

#[test]
fn test_heuristic_keeps_caller_layout() {
    let gates = [GateOp::two_qubit(0, "cx", 0, 1)];
    let coupling = CouplingMap::linear(6);
    let base = MapperConfig {
        initial_mapping: Some(InitialMapping::Laq(vec![0, 5])),
        ..MapperConfig::default()
    };

    let result = OptimizationLevel::O1
        .run(&gates, 2, &coupling, &Latency1_2_6, &base)
        .unwrap();
    assert_valid_schedule(&result, &gates, &coupling);
    assert_eq!(result.initial_laq, vec![0, 5]);
    assert!(result.num_swaps >= 4);
}

#[test]
fn test_results_are_deterministic() {
    let gates = scrambled_gates(5, 6, 3);
    let coupling = CouplingMap::grid(2, 3);
    let mapper = optimal().with_filter(HashFilter::new());

    let first = mapper.run(&gates, 5, &coupling).unwrap();
    let second = mapper.run(&gates, 5, &coupling).unwrap();
    assert_valid_schedule(&first, &gates, &coupling);
    assert_eq!(first, second);
}

#[test]
fn test_parallel_expansion_matches_sequential() {
    let gates = scrambled_gates(5, 6, 11);
    let coupling = CouplingMap::linear(5);
    let mapper = optimal().with_filter(HashFilter::new());
    let parallel = mapper.clone().with_config(MapperConfig {
        parallel_expansion: true,
        ..MapperConfig::default()
    });

    let sequential = mapper.run(&gates, 5, &coupling).unwrap();
    let threaded = parallel.run(&gates, 5, &coupling).unwrap();
    assert_eq!(sequential, threaded);
}

#[test]
fn test_disconnected_device_exhausts_queue() {
    let coupling = CouplingMap::new(4, [(0, 1), (2, 3)]).unwrap();
    let gates = [GateOp::two_qubit(0, "cx", 0, 2)];

    let err = optimal().run(&gates, 4, &coupling).unwrap_err();
    assert!(matches!(err, MapperError::EmptyQueue { popped: 0 }));
    assert!(!err.is_invalid_input());
}

#[test]
fn test_invalid_input_is_rejected() {
    let coupling = CouplingMap::linear(3);
    let mapper = optimal();

    let out_of_range = [GateOp::two_qubit(0, "cx", 0, 5)];
    assert!(matches!(
        mapper.run(&out_of_range, 3, &coupling),
        Err(MapperError::QubitOutOfRange { uid: 0, qubit: 5, .. })
    ));

    let same_operand = [GateOp::two_qubit(4, "cx", 1, 1)];
    assert!(matches!(
        mapper.run(&same_operand, 3, &coupling),
        Err(MapperError::DuplicateOperand { uid: 4, qubit: 1 })
    ));

    let duplicate_uid = [GateOp::one_qubit(1, "h", 0), GateOp::one_qubit(1, "x", 1)];
    assert!(matches!(
        mapper.run(&duplicate_uid, 3, &coupling),
        Err(MapperError::DuplicateGateUid(1))
    ));

    let mut bad_mapping = optimal();
    bad_mapping.set_initial_mapping_laq(vec![0, 0, 1]);
    let err = bad_mapping.run(&[], 3, &coupling).unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn test_zero_time_budget() {
    let gates = scrambled_gates(4, 6, 1);
    let config = MapperConfig {
        budget: toqm::SearchBudget {
            max_popped: None,
            time_limit: Some(Duration::ZERO),
        },
        best_effort: true,
        ..MapperConfig::default()
    };
    let err = optimal()
        .with_config(config)
        .run(&gates, 4, &CouplingMap::linear(4))
        .unwrap_err();
    // Nothing was popped, so there is no partial schedule to return.
    assert!(matches!(err, MapperError::BudgetExhausted { popped: 0 }));
}

#[test]
fn test_best_effort_returns_partial_schedule() {
    let gates = [
        GateOp::two_qubit(0, "cx", 0, 5),
        GateOp::two_qubit(1, "cx", 1, 4),
        GateOp::two_qubit(2, "cx", 2, 5),
    ];
    let coupling = CouplingMap::linear(6);
    let config = MapperConfig {
        budget: toqm::SearchBudget {
            max_popped: Some(3),
            time_limit: None,
        },
        best_effort: true,
        ..MapperConfig::default()
    };

    let result = optimal().with_config(config).run(&gates, 6, &coupling).unwrap();
    assert!(!result.terminal);
    assert_eq!(result.num_popped, 3);
    let committed = result.scheduled_gates.iter().filter(|g| !g.is_inserted_swap()).count();
    assert!(committed < gates.len());
}

#[test]
fn test_filters_keep_optimal_length() {
    let gates = scrambled_gates(4, 5, 9);
    let coupling = CouplingMap::linear(4);
    let plain = optimal().run(&gates, 4, &coupling).unwrap();
    let filtered = optimal()
        .with_filter(HashFilter::new())
        .with_filter(HashFilter2::new())
        .run(&gates, 4, &coupling)
        .unwrap();

    assert_valid_schedule(&filtered, &gates, &coupling);
    assert_eq!(filtered.cycles, plain.cycles);
    assert_eq!(filtered.filter_stats.len(), 2);
    assert!(filtered.filter_stats.contains_key("HashFilter"));
    assert!(filtered.filter_stats.contains_key("HashFilter2"));
    assert!(plain.filter_stats.is_empty());
}

#[test]
fn test_cost_functions_agree_on_validity() {
    let gates = scrambled_gates(4, 4, 2);
    let coupling = CouplingMap::ring(4);
    for result in [
        ToqmMapper::new(DefaultQueue::new(), DefaultExpander, SimpleCost, Latency1)
            .run(&gates, 4, &coupling),
        ToqmMapper::new(DefaultQueue::new(), DefaultExpander, CXFull, Latency1_3)
            .with_filter(HashFilter::new())
            .run(&gates, 4, &coupling),
    ] {
        let result = result.unwrap();
        assert_valid_schedule(&result, &gates, &coupling);
    }
}

#[test]
fn test_retain_popped_keeps_nodes() {
    let gates = scrambled_gates(4, 4, 4);
    let coupling = CouplingMap::linear(4);
    let released = optimal().run(&gates, 4, &coupling).unwrap();

    let mut retaining = optimal();
    retaining.set_retain_popped(true);
    let retained = retaining.run(&gates, 4, &coupling).unwrap();

    assert_eq!(retained.scheduled_gates, released.scheduled_gates);
    assert!(retained.nodes_retained >= released.nodes_retained);
    assert!(retained.nodes_retained >= retained.num_popped);
}

#[test]
fn test_strategies_produce_valid_schedules() {
    let gates = scrambled_gates(6, 10, 13);
    let small = CouplingMap::linear(4);
    let small_gates = scrambled_gates(4, 6, 13);
    let large = CouplingMap::grid(2, 4);
    let base = MapperConfig::default();

    for level in [
        OptimizationLevel::O0,
        OptimizationLevel::O1,
        OptimizationLevel::O2,
        OptimizationLevel::O3,
    ] {
        let result = Strategy::Level(level)
            .run(&small_gates, 4, &small, &Latency1_2_6, &base)
            .unwrap();
        assert_valid_schedule(&result, &small_gates, &small);

        let result = level.run(&gates, 6, &large, &Latency1_2_6, &base).unwrap();
        assert_valid_schedule(&result, &gates, &large);
    }
}

#[test]
fn test_o3_prefers_swap_free_layout() {
    let gates = [
        GateOp::two_qubit(0, "cx", 0, 1),
        GateOp::two_qubit(1, "cx", 1, 2),
        GateOp::two_qubit(2, "cx", 2, 3),
    ];
    let coupling = CouplingMap::star(4);
    let result = OptimizationLevel::O3
        .run(&gates, 4, &coupling, &Latency1_2_6, &MapperConfig::default())
        .unwrap();
    // A path of three gates cannot be laid onto a star without a swap, so
    // the swap-free attempt fails and the optimal search takes over.
    assert_valid_schedule(&result, &gates, &coupling);
    assert!(result.num_swaps >= 1);
    assert!(
        result
            .scheduled_gates
            .iter()
            .any(|g| matches!(g.op, ScheduledOp::Swap))
    );
}

#[test]
fn test_config_round_trips_through_json() {
    let config = MapperConfig {
        initial_search: InitialSearch::Limited(2),
        best_effort: true,
        ..MapperConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: MapperConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
