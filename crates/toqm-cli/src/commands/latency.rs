//! Latency command implementation.

use std::fs;

use anyhow::{Context, Result};
use console::style;

use toqm::latency::{GateDuration, normalize_durations};

/// Execute the latency command.
pub fn execute(durations: &str, scale: u32) -> Result<()> {
    let source = fs::read_to_string(durations)
        .with_context(|| format!("Failed to read file: {durations}"))?;
    let entries: Vec<GateDuration> = serde_json::from_str(&source)
        .with_context(|| format!("Invalid durations file: {durations}"))?;

    let rules = normalize_durations(&entries, scale)?;
    eprintln!(
        "{} {} durations normalized into {} rules",
        style("✓").green().bold(),
        entries.len(),
        rules.len()
    );
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}
