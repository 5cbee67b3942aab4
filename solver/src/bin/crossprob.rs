//! Command-line front end: crossing probability of a boundary read from a file.
//!
//! Usage:
//!   crossprob ecdf2-mn2017 bounds.txt            # two-sided, FFT
//!   crossprob ecdf2-ks2001 bounds.txt            # two-sided, direct sums
//!   crossprob ecdf1-new bounds.txt               # one-sided, stable block DP
//!   crossprob ecdf1-mns2016 bounds.txt           # one-sided, renewal recursion
//!   crossprob poisson2 --intensity 20 steps.txt  # Poisson process, FFT
//!
//! The file holds the lower bounds on its first line and the upper bounds on
//! its second (see `--format pairs` for one pair per line). One-sided
//! algorithms need exactly one of the two lines to be non-empty.
//!
//! For `poisson2` the two lines hold the step times of the lower and upper
//! boundary functions of the counting process; they may differ in length.
//!
//! Prints the probability that the boundary is crossed, 1 − Pr[no crossing],
//! unless `--noncrossing` or `--json` is given.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use crossprob::one_sided::{one_sided_lower, one_sided_upper};
use crossprob::storage::{read_boundary_file, BoundaryFileFormat, RawBoundaries};
use crossprob::two_sided::{poisson_noncrossing, two_sided_noncrossing};
use crossprob::{OneSidedVariant, TwoSidedAlgorithm};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Algorithm {
    /// Two-sided, O(n³) direct convolutions.
    #[value(name = "ecdf2-ks2001")]
    TwoSidedDirect,
    /// Two-sided, O(n² log n) FFT convolutions.
    #[value(name = "ecdf2-mn2017")]
    TwoSidedFft,
    /// One-sided, renewal recursion (unstable for large n).
    #[value(name = "ecdf1-mns2016")]
    OneSidedReference,
    /// One-sided, blocked Poisson DP.
    #[value(name = "ecdf1-new")]
    OneSidedNew,
    /// Poisson process of rate `--intensity`, two-sided step boundary.
    #[value(name = "poisson2")]
    Poisson,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FileFormat {
    Rows,
    Pairs,
}

impl From<FileFormat> for BoundaryFileFormat {
    fn from(f: FileFormat) -> Self {
        match f {
            FileFormat::Rows => BoundaryFileFormat::Rows,
            FileFormat::Pairs => BoundaryFileFormat::Pairs,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "crossprob",
    about = "Boundary crossing probabilities for the empirical CDF of uniform samples"
)]
struct Args {
    #[arg(value_enum)]
    algorithm: Algorithm,

    /// Boundary file.
    file: PathBuf,

    /// Expected sample size; required when both lines of a two-sided file are empty.
    #[arg(short, long)]
    n: Option<usize>,

    #[arg(long, value_enum, default_value = "rows")]
    format: FileFormat,

    /// Rate of the Poisson process (poisson2 only).
    #[arg(long)]
    intensity: Option<f64>,

    /// Only count paths ending at this value (poisson2 only).
    #[arg(long)]
    endpoint: Option<usize>,

    /// Use direct convolutions instead of the FFT (poisson2 only).
    #[arg(long)]
    direct: bool,

    /// Print the non-crossing probability instead of the crossing probability.
    #[arg(long)]
    noncrossing: bool,

    /// Print both probabilities as JSON.
    #[arg(long)]
    json: bool,
}

fn one_sided(raw: &RawBoundaries, n: Option<usize>, variant: OneSidedVariant) -> Result<(usize, f64)> {
    match (raw.lower.is_empty(), raw.upper.is_empty()) {
        (false, true) => {
            let lower = raw.lower_only(n)?;
            Ok((lower.len(), one_sided_lower(&lower, variant)?))
        }
        (true, false) => {
            let upper = raw.upper_only(n)?;
            Ok((upper.len(), one_sided_upper(&upper, variant)?))
        }
        _ => anyhow::bail!("one-sided algorithms need exactly one non-empty bound line"),
    }
}

fn main() -> Result<()> {
    crossprob::env_config::init_tracing();
    let args = Args::parse();

    let raw = read_boundary_file(&args.file, args.format.into())
        .with_context(|| format!("reading {}", args.file.display()))?;

    let (n, noncrossing) = match args.algorithm {
        Algorithm::TwoSidedDirect | Algorithm::TwoSidedFft => {
            let algorithm = if args.algorithm == Algorithm::TwoSidedFft {
                TwoSidedAlgorithm::Fft
            } else {
                TwoSidedAlgorithm::Direct
            };
            let (lower, upper) = raw.two_sided(args.n)?;
            (lower.len(), two_sided_noncrossing(&lower, &upper, algorithm)?)
        }
        Algorithm::OneSidedReference => one_sided(&raw, args.n, OneSidedVariant::Reference)?,
        Algorithm::OneSidedNew => one_sided(&raw, args.n, OneSidedVariant::New)?,
        Algorithm::Poisson => {
            let intensity = args.intensity.context("poisson2 needs --intensity")?;
            let algorithm = TwoSidedAlgorithm::from_use_fft(!args.direct);
            let p = poisson_noncrossing(intensity, &raw.lower, &raw.upper, algorithm, args.endpoint)?;
            (raw.upper.len(), p)
        }
    };
    info!(n, algorithm = ?args.algorithm, noncrossing, "solved");

    if args.json {
        let out = serde_json::json!({
            "n": n,
            "noncrossing_probability": noncrossing,
            "crossing_probability": 1.0 - noncrossing,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if args.noncrossing {
        println!("{:.20e}", noncrossing);
    } else {
        println!("{:.20e}", 1.0 - noncrossing);
    }
    Ok(())
}
