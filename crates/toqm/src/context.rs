//! Read-only state shared by every policy during one search.

use crate::circuit::Circuit;
use crate::coupling::CouplingMap;
use crate::latency::{Latency, LatencyQuery};

/// Everything a policy may consult about the problem being routed.
///
/// The context borrows the prepared circuit, the (possibly subset-restricted)
/// device and the latency model for the duration of one run. It is `Sync`, so
/// parallel expansion shares it across worker threads without locking.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    /// Prepared gate list.
    pub circuit: &'a Circuit,
    /// Device the search routes onto.
    pub coupling: &'a CouplingMap,
    /// Latency model.
    pub latency: &'a dyn Latency,
    /// Physical qubits the layout may use, ascending.
    pub usable: &'a [u32],
    /// Cheapest swap over every coupling edge.
    pub min_swap_latency: u32,
    /// Logical qubits whose initial placement the caller chose, indexed by
    /// logical qubit. Empty when the mapper chose every placement.
    pub fixed: &'a [bool],
    /// Whether successor construction may fan out across threads.
    pub parallel: bool,
}

impl<'a> SearchContext<'a> {
    /// Build a context, deriving the cheapest swap latency from the device.
    pub fn new(
        circuit: &'a Circuit,
        coupling: &'a CouplingMap,
        latency: &'a dyn Latency,
        usable: &'a [u32],
    ) -> Self {
        let min_swap_latency = coupling
            .edges()
            .iter()
            .map(|&(a, b)| latency.latency(&LatencyQuery::swap(a, b)))
            .min()
            .unwrap_or(0);
        Self {
            circuit,
            coupling,
            latency,
            usable,
            min_swap_latency,
            fixed: &[],
            parallel: false,
        }
    }

    /// Mark the logical qubits the caller placed explicitly.
    #[must_use]
    pub fn with_fixed(mut self, fixed: &'a [bool]) -> Self {
        self.fixed = fixed;
        self
    }

    /// Enable or disable parallel successor construction.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of physical qubits on the device.
    #[inline]
    pub fn num_physical(&self) -> u32 {
        self.coupling.num_qubits()
    }

    /// Whether the caller placed `logical` explicitly.
    #[inline]
    pub fn is_fixed(&self, logical: u32) -> bool {
        self.fixed.get(logical as usize).copied().unwrap_or(false)
    }

    /// Whether the layout may place a logical qubit on `physical`.
    #[inline]
    pub fn is_usable(&self, physical: u32) -> bool {
        self.usable.binary_search(&physical).is_ok()
    }
}
