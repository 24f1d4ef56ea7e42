//! Mapper configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};
use crate::node::LayoutPhase;

/// How much free rearrangement of the initial layout the search may do
/// before the first operation is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialSearch {
    /// Start from the given (or identity) layout as is.
    #[default]
    Disabled,
    /// Allow at most this many free swaps.
    Limited(u32),
    /// Allow any number of free swaps.
    Unlimited,
}

impl InitialSearch {
    /// Convert the host convention: `0` disables, a negative value means
    /// unlimited, a positive value is the free-swap budget.
    pub fn from_cycles(cycles: i64) -> Self {
        match cycles {
            0 => Self::Disabled,
            c if c < 0 => Self::Unlimited,
            c => Self::Limited(u32::try_from(c).unwrap_or(u32::MAX)),
        }
    }

    /// Whether roots start in their layout phase.
    pub fn is_enabled(self) -> bool {
        self != Self::Disabled
    }

    /// Layout phase of a root node.
    pub(crate) fn root_phase(self) -> LayoutPhase {
        match self {
            Self::Disabled => LayoutPhase::Closed,
            Self::Limited(n) => LayoutPhase::Open { budget: Some(n) },
            Self::Unlimited => LayoutPhase::Open { budget: None },
        }
    }
}

/// A caller-supplied initial layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialMapping {
    /// Logical-to-physical: entry `l` is the physical qubit of logical `l`.
    Laq(Vec<u32>),
    /// Physical-to-logical: entry `p` is the logical qubit on physical `p`,
    /// if any. Logical qubits left out are placed by the mapper.
    Qal(Vec<Option<u32>>),
}

/// Limits checked between search iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Stop after this many pops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_popped: Option<u64>,
    /// Stop after this much wall-clock time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<Duration>,
}

impl SearchBudget {
    /// Whether any limit is set.
    pub fn is_bounded(&self) -> bool {
        self.max_popped.is_some() || self.time_limit.is_some()
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Free layout search before the first committed operation.
    pub initial_search: InitialSearch,
    /// Keep every popped node until the run ends.
    pub retain_popped: bool,
    /// Report progress at `info` level instead of `debug`.
    pub verbose: bool,
    /// Pops between progress reports.
    pub progress_interval: u64,
    /// Build successors and roots on the rayon thread pool.
    pub parallel_expansion: bool,
    /// Initial layout; the mapper seeds its own roots when absent.
    pub initial_mapping: Option<InitialMapping>,
    /// Physical qubits the layout may use; all when absent.
    pub physical_subset: Option<Vec<u32>>,
    /// Node and time limits.
    pub budget: SearchBudget,
    /// On budget exhaustion, return the best popped node instead of failing.
    pub best_effort: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            initial_search: InitialSearch::Disabled,
            retain_popped: false,
            verbose: false,
            progress_interval: 10_000,
            parallel_expansion: false,
            initial_mapping: None,
            physical_subset: None,
            budget: SearchBudget::default(),
            best_effort: false,
        }
    }
}

impl MapperConfig {
    /// Check the configuration against a device size.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] for a zero progress interval,
    /// and [`MapperError::PhysicalQubitOutOfRange`] if the subset names a
    /// qubit the device does not have.
    pub fn validate(&self, num_physical: u32) -> MapperResult<()> {
        if self.progress_interval == 0 {
            return Err(MapperError::Configuration(
                "progress_interval must be at least 1".into(),
            ));
        }
        if let Some(subset) = &self.physical_subset {
            if let Some(&qubit) = subset.iter().find(|&&q| q >= num_physical) {
                return Err(MapperError::PhysicalQubitOutOfRange {
                    qubit,
                    num_physical,
                });
            }
        }
        Ok(())
    }
}
