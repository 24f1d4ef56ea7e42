//! Ready-made mapper configurations.
//!
//! | Strategy | Queue | Expander | Filters | Layout search |
//! |----------|-------|----------|---------|---------------|
//! | [`HeuristicStrategy`] | `TrimSlowNodes` | `GreedyTopK` | none | off (`GreedyMapper` places qubits) |
//! | [`OptimalStrategy`] | `DefaultQueue` | `DefaultExpander` or `NoSwaps` | `HashFilter`, `HashFilter2` | unlimited if requested |
//!
//! [`OptimizationLevel`] picks between the two by device size.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{InitialSearch, MapperConfig};
use crate::coupling::CouplingMap;
use crate::cost::CXFrontier;
use crate::error::{MapperError, MapperResult};
use crate::expander::{DefaultExpander, Expander, GreedyTopK, NoSwaps};
use crate::filter::{HashFilter, HashFilter2};
use crate::gate::GateOp;
use crate::latency::{Latency, Latency1_2_6};
use crate::mapper::ToqmMapper;
use crate::node_mod::GreedyMapper;
use crate::queue::{DefaultQueue, TrimSlowNodes};
use crate::result::ToqmResult;

/// Devices smaller than this are mapped optimally by the presets.
pub const OPTIMAL_QUBIT_LIMIT: u32 = 6;

/// Bounded, incomplete search for large devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicStrategy {
    /// Swap candidates kept per expansion.
    pub top_k: usize,
    /// Queue size after trimming.
    pub queue_target: usize,
    /// Queue size that triggers trimming.
    pub queue_max: usize,
    /// Keep popped nodes until the run ends.
    pub retain_popped: bool,
}

impl HeuristicStrategy {
    /// Create a heuristic strategy.
    pub fn new(top_k: usize, queue_target: usize, queue_max: usize) -> Self {
        Self {
            top_k,
            queue_target,
            queue_max,
            retain_popped: false,
        }
    }

    /// Assemble the mapper. Budget and logging settings come from `base`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] if the queue sizes are
    /// inconsistent.
    pub fn build(&self, latency: &dyn Latency, base: &MapperConfig) -> MapperResult<ToqmMapper> {
        let queue = TrimSlowNodes::new(self.queue_max, self.queue_target)?;
        let config = MapperConfig {
            initial_search: InitialSearch::Disabled,
            retain_popped: self.retain_popped,
            ..base.clone()
        };
        Ok(ToqmMapper::from_boxed(
            Box::new(queue),
            Box::new(GreedyTopK::new(self.top_k)),
            Box::new(CXFrontier),
            latency.clone_box(),
            vec![Box::new(GreedyMapper)],
            Vec::new(),
        )
        .with_config(config))
    }

    /// Build and run.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build) and [`ToqmMapper::run`].
    pub fn run(
        &self,
        gates: &[GateOp],
        num_logical: u32,
        coupling: &CouplingMap,
        latency: &dyn Latency,
        base: &MapperConfig,
    ) -> MapperResult<ToqmResult> {
        self.build(latency, base)?.run(gates, num_logical, coupling)
    }
}

/// Exhaustive search with duplicate pruning; finds a minimum-length
/// schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimalStrategy {
    /// Search over initial layouts as well.
    pub perform_layout: bool,
    /// Never insert swaps. Fails with [`MapperError::EmptyQueue`] unless a
    /// layout exists where every two-qubit gate is already adjacent.
    pub no_swaps: bool,
}

impl OptimalStrategy {
    /// Create an optimal strategy.
    pub fn new(perform_layout: bool, no_swaps: bool) -> Self {
        Self {
            perform_layout,
            no_swaps,
        }
    }

    /// Assemble the mapper. Everything but the layout search comes from
    /// `base`.
    pub fn build(&self, latency: &dyn Latency, base: &MapperConfig) -> ToqmMapper {
        let config = MapperConfig {
            initial_search: if self.perform_layout {
                InitialSearch::Unlimited
            } else {
                InitialSearch::Disabled
            },
            ..base.clone()
        };
        let expander: Box<dyn Expander> = if self.no_swaps {
            Box::new(NoSwaps)
        } else {
            Box::new(DefaultExpander)
        };
        ToqmMapper::from_boxed(
            Box::new(DefaultQueue::new()),
            expander,
            Box::new(CXFrontier),
            latency.clone_box(),
            Vec::new(),
            vec![Box::new(HashFilter::new()), Box::new(HashFilter2::new())],
        )
        .with_config(config)
    }

    /// Build and run.
    ///
    /// # Errors
    ///
    /// See [`ToqmMapper::run`].
    pub fn run(
        &self,
        gates: &[GateOp],
        num_logical: u32,
        coupling: &CouplingMap,
        latency: &dyn Latency,
        base: &MapperConfig,
    ) -> MapperResult<ToqmResult> {
        self.build(latency, base).run(gates, num_logical, coupling)
    }
}

/// Preset strategy selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// Narrowest heuristic search.
    O0,
    /// Optimal on small devices, moderate heuristic otherwise.
    #[default]
    O1,
    /// Optimal on small devices, wide heuristic otherwise.
    O2,
    /// Tries a swap-free layout first on small devices, deep heuristic
    /// otherwise.
    O3,
}

impl OptimizationLevel {
    /// Heuristic settings used on devices with at least
    /// [`OPTIMAL_QUBIT_LIMIT`] qubits.
    pub fn heuristic(self) -> HeuristicStrategy {
        match self {
            Self::O0 => HeuristicStrategy::new(1, 3000, 5000),
            Self::O1 => HeuristicStrategy::new(5, 400, 800),
            Self::O2 => HeuristicStrategy::new(11, 400, 800),
            Self::O3 => HeuristicStrategy::new(3, 3600, 4800),
        }
    }

    /// Whether a device of this size gets the optimal search.
    pub fn uses_optimal(self, num_physical: u32) -> bool {
        self != Self::O0 && num_physical < OPTIMAL_QUBIT_LIMIT
    }

    /// Run the preset.
    ///
    /// The heuristic path always schedules with [`Latency1_2_6`]: with
    /// gate-specific latencies its trimmed queue can fail to reach a complete
    /// schedule. The optimal path uses `latency`.
    ///
    /// # Errors
    ///
    /// See [`ToqmMapper::run`].
    pub fn run(
        self,
        gates: &[GateOp],
        num_logical: u32,
        coupling: &CouplingMap,
        latency: &dyn Latency,
        base: &MapperConfig,
    ) -> MapperResult<ToqmResult> {
        if !self.uses_optimal(coupling.num_qubits()) {
            info!("{:?}: heuristic search with 1/2/6 latencies", self);
            return self.heuristic().run(gates, num_logical, coupling, &Latency1_2_6, base);
        }

        let optimal = OptimalStrategy::new(true, false);
        if self == Self::O3 {
            info!("{:?}: trying a swap-free layout first", self);
            match OptimalStrategy::new(true, true).run(gates, num_logical, coupling, latency, base) {
                Err(MapperError::EmptyQueue { popped }) => {
                    info!("No swap-free layout after {} pops; falling back", popped);
                }
                other => return other,
            }
        }
        info!("{:?}: optimal search", self);
        optimal.run(gates, num_logical, coupling, latency, base)
    }
}

/// Any mapper preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// A fixed heuristic configuration.
    Heuristic(HeuristicStrategy),
    /// A fixed optimal configuration.
    Optimal(OptimalStrategy),
    /// A size-dependent preset.
    Level(OptimizationLevel),
}

impl Strategy {
    /// Run the selected preset.
    ///
    /// # Errors
    ///
    /// See [`ToqmMapper::run`].
    pub fn run(
        &self,
        gates: &[GateOp],
        num_logical: u32,
        coupling: &CouplingMap,
        latency: &dyn Latency,
        base: &MapperConfig,
    ) -> MapperResult<ToqmResult> {
        match self {
            Self::Heuristic(s) => s.run(gates, num_logical, coupling, latency, base),
            Self::Optimal(s) => s.run(gates, num_logical, coupling, latency, base),
            Self::Level(level) => level.run(gates, num_logical, coupling, latency, base),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Level(OptimizationLevel::default())
    }
}
