#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Iso Tactics scenarios headlessly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iso_tactics_cli::{run_headless, Scenario, ScenarioConfig};
use iso_tactics_world::query;
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "iso-tactics", version, about = "Headless isometric tactics simulation")]
struct Cli {
    /// Scenario file; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Simulates the scenario and prints where every actor ended up.
    Run {
        /// Frames to simulate, overriding the scenario file.
        #[arg(long)]
        frames: Option<u64>,
    },
    /// Prints the cells an actor can reach.
    Reach {
        /// Index of the actor in the scenario's actor list.
        #[arg(long, default_value_t = 0)]
        actor: usize,
        /// Number of steps the actor may take.
        #[arg(long, default_value_t = 3)]
        budget: u32,
    },
}

/// Entry point for the Iso Tactics command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => ScenarioConfig::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    let mut scenario = Scenario::build(&config);

    match cli.mode {
        Mode::Run { frames } => {
            let frames = frames.unwrap_or(config.simulation.frames);
            let summary = run_headless(&mut scenario, &config, frames)?;
            println!(
                "simulated {} frames, {} events, {} arrivals",
                summary.frames,
                summary.events,
                summary.arrivals.len()
            );
            for actor in query::actors(&scenario.world) {
                let p = actor.position;
                let status = match (actor.moving, actor.queued_waypoints) {
                    (false, _) => String::new(),
                    (true, 0) => " moving".to_owned(),
                    (true, queued) => format!(" moving, {queued} waypoints queued"),
                };
                println!(
                    "actor {}: ({:.2}, {:.2}, {:.2}){status}",
                    actor.id.get(),
                    p.x,
                    p.y,
                    p.z,
                );
            }
        }
        Mode::Reach { actor, budget } => {
            let cells = scenario.mark_reach(actor, budget)?;
            println!("actor {actor} reaches {} cells:", cells.len());
            for cell in cells {
                println!("  ({}, {})", cell.x(), cell.y());
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level}"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
