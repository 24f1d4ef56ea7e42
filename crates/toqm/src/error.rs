//! Error types for the mapper.

use thiserror::Error;

/// Errors that can occur while configuring or running the mapper.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MapperError {
    /// A gate references a logical qubit outside `[0, num_logical)`.
    #[error("Gate {uid} references logical qubit {qubit}, but only {num_logical} logical qubits exist")]
    QubitOutOfRange {
        /// Uid of the offending gate.
        uid: u64,
        /// The out-of-range logical qubit.
        qubit: u32,
        /// Number of logical qubits in the problem.
        num_logical: u32,
    },

    /// A coupling edge or mapping references a physical qubit outside the device.
    #[error("Physical qubit {qubit} out of range (device has {num_physical} qubits)")]
    PhysicalQubitOutOfRange {
        /// The out-of-range physical qubit.
        qubit: u32,
        /// Number of physical qubits on the device.
        num_physical: u32,
    },

    /// A two-qubit gate uses the same logical qubit as control and target.
    #[error("Gate {uid} uses logical qubit {qubit} as both control and target")]
    DuplicateOperand {
        /// Uid of the offending gate.
        uid: u64,
        /// The repeated logical qubit.
        qubit: u32,
    },

    /// Two gates share a uid.
    #[error("Duplicate gate uid {0}")]
    DuplicateGateUid(u64),

    /// A coupling edge connects a qubit to itself.
    #[error("Coupling edge ({0}, {0}) is a self loop")]
    SelfLoopEdge(u32),

    /// The circuit needs more qubits than the device offers.
    #[error("Circuit requires {required} logical qubits but only {available} physical qubits are usable")]
    TooManyLogicalQubits {
        /// Logical qubits required.
        required: u32,
        /// Physical qubits available.
        available: u32,
    },

    /// A supplied initial mapping is not an injective assignment.
    #[error("Invalid initial mapping: {0}")]
    InvalidInitialMapping(String),

    /// The queue ran dry before any node reached a complete schedule.
    #[error("Search queue exhausted after {popped} nodes without reaching a complete schedule")]
    EmptyQueue {
        /// Number of nodes popped before exhaustion.
        popped: u64,
    },

    /// The node or time budget ran out and best-effort results were not requested.
    #[error("Search budget exhausted after {popped} nodes")]
    BudgetExhausted {
        /// Number of nodes popped before the budget ran out.
        popped: u64,
    },

    /// The search tree lost a node still needed to rebuild a schedule.
    #[error("Node {missing} on the path to node {node} was freed before the schedule was rebuilt")]
    MissingAncestor {
        /// Node whose history was requested.
        node: u64,
        /// First missing node on its path to the root.
        missing: u64,
    },

    /// Incompatible policy configuration, caught before search starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MapperError {
    /// Whether this error describes malformed input data (as opposed to a
    /// search failure or a configuration problem).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::QubitOutOfRange { .. }
                | Self::PhysicalQubitOutOfRange { .. }
                | Self::DuplicateOperand { .. }
                | Self::DuplicateGateUid(_)
                | Self::SelfLoopEdge(_)
                | Self::TooManyLogicalQubits { .. }
                | Self::InvalidInitialMapping(_)
        )
    }
}

/// Result type for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;
