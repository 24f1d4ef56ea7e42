//! Time-Optimal Qubit Mapping
//!
//! This crate routes and schedules quantum circuits onto hardware with
//! limited connectivity. Two-qubit gates may only run on coupled physical
//! qubits, so the mapper inserts swaps to move logical qubits around and
//! assigns every operation a start cycle, minimizing the total schedule
//! length.
//!
//! # Overview
//!
//! The mapper runs a best-first search over partial schedules. Each search
//! node holds a logical-to-physical assignment, the gates committed so far
//! and the cycle at which every physical qubit becomes free. The search is
//! assembled from interchangeable policies:
//!
//! ```text
//!   gates + coupling map
//!           │
//!           ▼
//!   ┌───────────────┐   pop best   ┌──────────┐
//!   │   NodeQueue   │ ───────────► │ Expander │ ◄── Latency
//!   └───────────────┘              └──────────┘
//!           ▲                           │ children, scored by CostFunc
//!           │     push   ┌────────┐     ▼
//!           └─────────── │ NodeMod│ ◄── Filter
//!                        └────────┘
//! ```
//!
//! The first popped node with no gates left is the result.
//!
//! # Example
//!
//! ```rust
//! use toqm::{CouplingMap, GateOp, ToqmMapper};
//! use toqm::cost::CXFrontier;
//! use toqm::expander::DefaultExpander;
//! use toqm::filter::HashFilter;
//! use toqm::latency::Latency1_2_6;
//! use toqm::queue::DefaultQueue;
//!
//! let gates = vec![
//!     GateOp::one_qubit(0, "h", 0),
//!     GateOp::two_qubit(1, "cx", 0, 1),
//!     GateOp::two_qubit(2, "cx", 0, 2),
//! ];
//!
//! let mapper = ToqmMapper::new(DefaultQueue::new(), DefaultExpander, CXFrontier, Latency1_2_6)
//!     .with_filter(HashFilter::new());
//! let result = mapper.run(&gates, 3, &CouplingMap::linear(3)).unwrap();
//!
//! println!("{result}");
//! assert_eq!(result.num_swaps, 1);
//! ```
//!
//! # Presets
//!
//! [`strategy::OptimizationLevel`] chooses between an exhaustive search for
//! small devices and a bounded heuristic search for large ones:
//!
//! | Level | Small device (< 6 qubits) | Large device |
//! |-------|---------------------------|--------------|
//! | O0 | heuristic, top 1 | heuristic, top 1 |
//! | O1 | optimal with layout search | heuristic, top 5 |
//! | O2 | optimal with layout search | heuristic, top 11 |
//! | O3 | swap-free layout, then optimal | heuristic, top 3 |

pub mod circuit;
pub mod config;
pub mod context;
pub mod cost;
pub mod coupling;
pub mod error;
pub mod expander;
pub mod filter;
pub mod gate;
pub mod latency;
pub mod mapper;
pub mod node;
pub mod node_mod;
pub mod queue;
pub mod result;
pub mod strategy;

mod arena;
mod layout;

pub use config::{InitialMapping, InitialSearch, MapperConfig, SearchBudget};
pub use coupling::CouplingMap;
pub use error::{MapperError, MapperResult};
pub use gate::{GateOp, ScheduledGateOp, ScheduledOp};
pub use latency::{Latency, LatencyDescription};
pub use mapper::ToqmMapper;
pub use result::ToqmResult;
pub use strategy::{HeuristicStrategy, OptimalStrategy, OptimizationLevel, Strategy};
