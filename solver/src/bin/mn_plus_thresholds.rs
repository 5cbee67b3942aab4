//! Table of Berk–Jones Mₙ⁺ thresholds over a range of sample sizes.
//!
//! Usage:
//!   crossprob-mn-plus --alpha 0.05 --n-start 10 --n-end 1000 --n-step 10
//!   crossprob-mn-plus --alpha 0.01 --n-end 5000 --output thresholds.json

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::info;

use crossprob::berk_jones::mn_plus_thresholds;

#[derive(Parser, Debug)]
#[command(name = "crossprob-mn-plus", about = "Level-alpha thresholds of the Berk-Jones Mn+ statistic")]
struct Args {
    #[arg(long, default_value_t = 0.05)]
    alpha: f64,

    #[arg(long, default_value_t = 1)]
    n_start: usize,

    #[arg(long, default_value_t = 100)]
    n_end: usize,

    #[arg(long, default_value_t = 1)]
    n_step: usize,

    /// Write JSON here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    crossprob::env_config::init_tracing();
    let args = Args::parse();
    ensure!(args.n_start >= 1, "--n-start must be at least 1");
    ensure!(args.n_step >= 1, "--n-step must be at least 1");
    ensure!(args.n_end >= args.n_start, "--n-end must not be below --n-start");
    crossprob::env_config::init_rayon_threads();

    let ns: Vec<usize> = (args.n_start..=args.n_end).step_by(args.n_step).collect();
    let start = Instant::now();
    let table = mn_plus_thresholds(args.alpha, &ns)?;
    info!(
        sizes = ns.len(),
        alpha = args.alpha,
        elapsed_s = start.elapsed().as_secs_f64(),
        "thresholds computed"
    );

    let json = serde_json::to_string_pretty(&table)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "thresholds written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
