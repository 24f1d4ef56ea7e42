//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - time-optimal qubit mapping",
        style("TOQM").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  toqm      Routing and scheduling search engine");
    println!("  toqm-cli  Command-line interface");
    println!();
    println!("Strategies: optimal, heuristic, o0, o1, o2, o3");
    println!("Latencies:  1, 1-2-6, 1-3, JSON table");
    println!("License:    {}", style("Apache-2.0").dim());
}
