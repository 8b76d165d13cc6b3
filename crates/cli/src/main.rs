mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fogsim_core::{load_dotenv, SimulationConfig};
use fogsim_sim::{compare_policies, Simulation};

use crate::cli::CliArgs;
use crate::terminal::Terminal;

fn main() -> Result<()> {
    load_dotenv();
    let args = CliArgs::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let mut config = SimulationConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let terminal = Terminal::new();

    if args.compare {
        let reports = compare_policies(&config).context("comparison run failed")?;
        terminal.print_comparison(&reports)?;
        if let Some(path) = &args.out {
            let json =
                serde_json::to_string_pretty(&reports).context("failed to serialize reports")?;
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Reports written to {}", path.display());
        }
        return Ok(());
    }

    let mut sim = Simulation::new(config).context("failed to build simulation")?;
    let report = sim.run();
    terminal.print_report(&report)?;

    if let Some(path) = &args.out {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
