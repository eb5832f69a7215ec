//! Headless entry point: replays a scenario and prints the request log.

use anyhow::{Context, Result};
use clap::Parser;
use mindtrail_app::{Scenario, run_scenario};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mindtrail")]
#[command(about = "Replay a scripted editing session against the MindTrail editor core")]
struct Cli {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Write the report to this file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Only log errors and do not print the report
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    log::info!("Starting MindTrail");

    let scenario = Scenario::load(&cli.scenario)
        .with_context(|| format!("Failed to load scenario {}", cli.scenario.display()))?;
    let report = run_scenario(scenario);
    log::info!(
        "Finished in {:?} after {} steps",
        report.final_state,
        report.steps.len()
    );

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    match &cli.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?,
        None if !cli.quiet => println!("{json}"),
        None => {}
    }
    Ok(())
}
