//! TOQM Command-Line Interface
//!
//! Routes normalized circuits onto a device coupling map and prints the
//! resulting schedule.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::StrategyArg;
use commands::{latency, route, version};

/// TOQM - time-optimal qubit mapping
#[derive(Parser)]
#[command(name = "toqm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route and schedule a circuit
    Route {
        /// Problem file (JSON)
        #[arg(short, long)]
        input: String,

        /// Output file for the JSON result (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Search strategy
        #[arg(short, long, value_enum, default_value = "o1")]
        strategy: StrategyArg,

        /// Latency model (1, 1-2-6, 1-3, or a JSON table file). Heuristic presets
        /// always use 1-2-6
        #[arg(short, long, default_value = "1-2-6")]
        latency: String,

        /// Stop after this many popped nodes
        #[arg(long)]
        max_popped: Option<u64>,

        /// Stop after this many seconds
        #[arg(long)]
        time_limit: Option<f64>,

        /// Return the most advanced partial schedule when a limit is hit
        #[arg(long)]
        best_effort: bool,

        /// Build successors on all cores
        #[arg(long)]
        parallel: bool,
    },

    /// Convert gate durations into latency rules
    Latency {
        /// Durations file (JSON list of {type, qubits, duration})
        #[arg(short, long)]
        durations: String,

        /// Cycles assigned to the shortest duration
        #[arg(long, default_value = "2")]
        scale: u32,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Route {
            input,
            output,
            strategy,
            latency,
            max_popped,
            time_limit,
            best_effort,
            parallel,
        } => route::execute(&route::RouteOptions {
            input,
            output,
            strategy,
            latency,
            max_popped,
            time_limit,
            best_effort,
            parallel,
            verbose: cli.verbose > 0,
        }),

        Commands::Latency { durations, scale } => latency::execute(&durations, scale),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
