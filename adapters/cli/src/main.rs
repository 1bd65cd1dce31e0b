#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Crow Defence on autopilot.

mod autopilot;
mod settings;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crow_defence_core::WELCOME_BANNER;
use tracing_subscriber::EnvFilter;

use self::settings::{AutopilotSettings, Settings};

/// Command-line options understood by the autopilot.
#[derive(Debug, Parser)]
#[command(name = "crow-defence", about = "Plays Crow Defence on autopilot")]
struct Args {
    /// TOML file with `[session]` tuning and `[autopilot]` defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for problem and lane generation.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of waves to clear before stopping.
    #[arg(long)]
    waves: Option<u32>,
    /// Deliberately submit a wrong answer every N submits.
    #[arg(long)]
    miss_every: Option<u32>,
    /// Fixed simulation step in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Never answer and let the crows through.
    #[arg(long)]
    no_answer: bool,
}

impl Args {
    fn override_settings(&self, autopilot: &mut AutopilotSettings) {
        if let Some(seed) = self.seed {
            autopilot.seed = Some(seed);
        }
        if let Some(waves) = self.waves {
            autopilot.waves = waves;
        }
        if let Some(miss_every) = self.miss_every {
            autopilot.miss_every = miss_every;
        }
        if let Some(tick_ms) = self.tick_ms {
            autopilot.tick_ms = tick_ms;
        }
        autopilot.no_answer |= self.no_answer;
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

/// Entry point for the Crow Defence command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    args.override_settings(&mut settings.autopilot);
    settings
        .validate()
        .context("invalid command-line settings")?;

    let seed = settings.autopilot.seed.unwrap_or_else(rand::random);
    println!("{WELCOME_BANNER}");
    println!("seed: {seed}");

    let outcome = autopilot::run(&settings, seed);
    let summary = outcome.summary;
    println!(
        "{} after {:.1} s",
        if outcome.game_over {
            "game over"
        } else {
            "autopilot finished"
        },
        outcome.elapsed.as_secs_f32()
    );
    println!("waves cleared: {}", outcome.waves_cleared);
    println!("last wave: {}", summary.wave);
    println!("final score: {}", summary.final_score);
    println!("enemies defeated: {}", summary.enemies_defeated);
    println!("confirmed defeats: {}", summary.confirmed_defeats);
    Ok(())
}
