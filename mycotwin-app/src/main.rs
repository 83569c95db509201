use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

mod config;
mod plotting;
mod workflow;

/// Deterministic what-if projections for mushroom grow-room climate,
/// contamination risk and control stability.
#[derive(Parser)]
#[command(name = "mycotwin", version)]
struct Cli {
    /// Facility definition (rooms, devices, substrate) as YAML.
    #[arg(long, default_value = "data/facility.yaml")]
    facility: PathBuf,

    /// Scenario definitions as YAML.
    #[arg(long, default_value = "data/scenarios.yaml")]
    scenarios: PathBuf,

    /// Directory that receives one timestamped run directory per invocation.
    #[arg(long, default_value = "data/runs")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    println!("--- MycoTwin Facility Simulator ---");

    let rooms = config::load_facility(&cli.facility)?;
    let scenario_configs = config::load_scenarios(&cli.scenarios)?;

    let run_dir = cli.output_dir.join(format!(
        "run_{}",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ));
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", run_dir))?;

    workflow::run_all(rooms, scenario_configs, &run_dir)?;

    println!("\nAll scenarios complete. Results are in '{}'", run_dir.display());
    Ok(())
}
