//! Shared helpers for CLI commands.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use toqm::latency::{Latency1, Latency1_2_6, Latency1_3, Table};
use toqm::{
    CouplingMap, GateOp, InitialMapping, Latency, MapperConfig, OptimalStrategy, OptimizationLevel,
    Strategy,
};

/// A normalized routing problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingProblem {
    /// Logical qubits used by the gates.
    pub num_logical_qubits: u32,
    /// Device connectivity.
    pub coupling_map: CouplingMap,
    /// Gates in program order.
    pub gates: Vec<GateOp>,
    /// Optional starting layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_mapping: Option<InitialMapping>,
    /// Optional engine settings; CLI flags override the budget fields.
    #[serde(default)]
    pub config: MapperConfig,
}

/// Strategy names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Exhaustive search with layout search
    Optimal,
    /// Bounded search (O1 heuristic settings)
    Heuristic,
    O0,
    O1,
    O2,
    O3,
}

impl StrategyArg {
    /// Library strategy for this name.
    pub fn to_strategy(self) -> Strategy {
        match self {
            Self::Optimal => Strategy::Optimal(OptimalStrategy::new(true, false)),
            Self::Heuristic => Strategy::Heuristic(OptimizationLevel::O1.heuristic()),
            Self::O0 => Strategy::Level(OptimizationLevel::O0),
            Self::O1 => Strategy::Level(OptimizationLevel::O1),
            Self::O2 => Strategy::Level(OptimizationLevel::O2),
            Self::O3 => Strategy::Level(OptimizationLevel::O3),
        }
    }
}

/// Load a routing problem from a JSON file.
pub fn load_problem(path: &str) -> Result<RoutingProblem> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid problem file: {path}"))
}

/// Resolve a latency model from a built-in name or a JSON table file.
pub fn load_latency(spec: &str) -> Result<Box<dyn Latency>> {
    match spec.to_lowercase().as_str() {
        "1" => Ok(Box::new(Latency1)),
        "1-2-6" | "1_2_6" => Ok(Box::new(Latency1_2_6)),
        "1-3" | "1_3" => Ok(Box::new(Latency1_3)),
        _ => {
            let file = File::open(spec).with_context(|| {
                format!("Unknown latency '{spec}': expected 1, 1-2-6, 1-3 or a JSON table file")
            })?;
            let table = Table::from_json_reader(BufReader::new(file))
                .with_context(|| format!("Invalid latency table: {spec}"))?;
            Ok(Box::new(table))
        }
    }
}
