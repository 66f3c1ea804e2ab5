use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use tidepool::{SimConfig, SimState};

/// Run the tidepool simulation headless and print a JSON summary.
#[derive(Parser, Debug)]
#[command(name = "tidepool", version, about)]
struct Args {
    /// Number of ticks to run
    #[arg(short, long, default_value_t = 5_000)]
    ticks: u64,

    /// Seed for every random stream; overrides the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON parameter block; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log a population line every N ticks (0 disables)
    #[arg(short, long, default_value_t = 500)]
    report_every: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SimConfig::from_json_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut sim = SimState::new(config).context("invalid simulation config")?;
    info!(ticks = args.ticks, seed = sim.config().seed, "starting headless run");

    for _ in 0..args.ticks {
        let report = sim.tick();
        if args.report_every > 0 && report.tick % args.report_every == 0 {
            let calendar = sim.calendar_snapshot();
            info!(
                tick = report.tick,
                season = calendar.season.name(),
                predators = report.counts.predators,
                prey = report.counts.prey,
                eggs = report.counts.eggs,
                plankton = report.counts.plankton,
                crustaceans = report.counts.crustaceans,
                segments = report.counts.algae_segments,
                "population"
            );
        }
        if report.collapsed {
            warn!(tick = report.tick, "population collapsed, stopping early");
            break;
        }
    }

    let summary = serde_json::to_string_pretty(&sim.summary()).context("encoding summary")?;
    println!("{summary}");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
