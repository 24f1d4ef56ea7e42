//! Route command implementation.

use std::fs;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use toqm::ToqmResult;

use super::common::{StrategyArg, load_latency, load_problem};

/// Options of the route command.
pub struct RouteOptions {
    pub input: String,
    pub output: Option<String>,
    pub strategy: StrategyArg,
    pub latency: String,
    pub max_popped: Option<u64>,
    pub time_limit: Option<f64>,
    pub best_effort: bool,
    pub parallel: bool,
    pub verbose: bool,
}

/// Execute the route command.
pub fn execute(options: &RouteOptions) -> Result<()> {
    eprintln!(
        "{} Routing {} with strategy {:?}",
        style("→").cyan().bold(),
        style(&options.input).green(),
        options.strategy
    );

    let problem = load_problem(&options.input)?;
    let latency = load_latency(&options.latency)?;
    eprintln!(
        "  Loaded: {} gates on {} logical qubits, device with {} qubits",
        problem.gates.len(),
        problem.num_logical_qubits,
        problem.coupling_map.num_qubits()
    );

    let mut config = problem.config.clone();
    if problem.initial_mapping.is_some() {
        config.initial_mapping.clone_from(&problem.initial_mapping);
    }
    if options.max_popped.is_some() {
        config.budget.max_popped = options.max_popped;
    }
    if let Some(seconds) = options.time_limit {
        let limit = Duration::try_from_secs_f64(seconds)
            .with_context(|| format!("Invalid time limit: {seconds}"))?;
        config.budget.time_limit = Some(limit);
    }
    config.best_effort |= options.best_effort;
    config.parallel_expansion |= options.parallel;
    config.verbose |= options.verbose;
    debug!("Mapper configuration: {:?}", config);

    let started = Instant::now();
    let result = options.strategy.to_strategy().run(
        &problem.gates,
        problem.num_logical_qubits,
        &problem.coupling_map,
        latency.as_ref(),
        &config,
    )?;
    let elapsed = started.elapsed();

    print_summary(&result, elapsed);

    let json = serde_json::to_string_pretty(&result)?;
    match &options.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write file: {path}"))?;
            eprintln!("  Output: {}", style(path).green());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn print_summary(result: &ToqmResult, elapsed: Duration) {
    if result.terminal {
        eprintln!("{} Routing complete", style("✓").green().bold());
    } else {
        eprintln!(
            "{} Search budget exhausted; returning a partial schedule",
            style("!").yellow().bold()
        );
    }
    eprintln!(
        "  Cycles: {} (ideal {}), swaps: {}",
        result.cycles, result.ideal_cycles, result.num_swaps
    );
    eprintln!(
        "  Search: {} popped, {} created, {} left in queue, {:.2?}",
        result.num_popped, result.nodes_created, result.remaining_in_queue, elapsed
    );
    for (filter, pruned) in &result.filter_stats {
        eprintln!("  {filter}: {pruned} pruned");
    }
}
