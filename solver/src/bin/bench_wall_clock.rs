//! Wall-clock performance benchmarks for the non-crossing solvers.
//!
//! Usage:
//!   crossprob-bench --record baseline.json   # Run benchmarks, save baseline
//!   crossprob-bench --check baseline.json    # Run benchmarks, compare against baseline
//!   crossprob-bench                          # Run benchmarks, print results only
//!
//! Every algorithm runs on the stress boundary over a doubling grid of n.
//! Failure threshold: max(mean + 3σ, mean × 1.05).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crossprob::benchmark::{run_timed, speedtest_boundary, BenchRecord};
use crossprob::one_sided::one_sided_lower_with;
use crossprob::storage::{load_bench_records, save_bench_records};
use crossprob::two_sided::two_sided_with;
use crossprob::{OneSidedVariant, TwoSidedAlgorithm, Workspace};

/// The O(n³) direct sweep is skipped above this n.
const DIRECT_MAX_N: usize = 512;

#[derive(Parser, Debug)]
#[command(name = "crossprob-bench", about = "Wall-clock benchmarks for crossprob")]
struct Args {
    /// Save results as the new baseline.
    #[arg(long, value_name = "PATH", conflicts_with = "check")]
    record: Option<PathBuf>,

    /// Compare results against a saved baseline; exit 1 on regression.
    #[arg(long, value_name = "PATH")]
    check: Option<PathBuf>,

    /// Smallest n of the grid.
    #[arg(long, default_value_t = 64)]
    min_n: usize,

    /// Largest n of the grid.
    #[arg(long, default_value_t = 4096)]
    max_n: usize,

    /// Timed iterations per cell (after one warm-up call).
    #[arg(long, default_value_t = 5)]
    iterations: usize,
}

// ── Benchmark runner ───────────────────────────────────────────────────────

fn print_record(r: &BenchRecord) {
    let label = format!("{} n={}", r.name, r.n);
    if r.mean_ms >= 1.0 {
        println!(
            "  {:<32} {:>8.1} ms  (σ={:.1}, p95={:.1}, threshold={:.1})  p={:.12}",
            label, r.mean_ms, r.std_ms, r.p95_ms, r.threshold_ms, r.value
        );
    } else {
        // Sub-millisecond: show in microseconds
        println!(
            "  {:<32} {:>8.0} μs  (σ={:.0}, p95={:.0}, threshold={:.0})  p={:.12}",
            label,
            r.mean_ms * 1000.0,
            r.std_ms * 1000.0,
            r.p95_ms * 1000.0,
            r.threshold_ms * 1000.0,
            r.value
        );
    }
}

fn grid(min_n: usize, max_n: usize) -> Vec<usize> {
    let mut ns = Vec::new();
    let mut n = min_n.max(1);
    while n <= max_n {
        ns.push(n);
        n *= 2;
    }
    ns
}

fn run_all(args: &Args) -> Result<Vec<BenchRecord>> {
    let mut ws = Workspace::new();
    let mut records = Vec::new();

    for n in grid(args.min_n, args.max_n) {
        let (lower, upper) = speedtest_boundary(n);
        println!("n = {n}");

        let mut cells: Vec<(&str, TwoSidedAlgorithm)> = vec![("two_sided_fft", TwoSidedAlgorithm::Fft)];
        if n <= DIRECT_MAX_N {
            cells.push(("two_sided_direct", TwoSidedAlgorithm::Direct));
        }
        for (name, algorithm) in cells {
            let mut failure = None;
            let record = run_timed(name, n, args.iterations, || {
                two_sided_with(&mut ws, &lower, &upper, algorithm).unwrap_or_else(|e| {
                    failure = Some(e);
                    f64::NAN
                })
            });
            if let Some(e) = failure {
                return Err(e).with_context(|| format!("{name} at n = {n}"));
            }
            print_record(&record);
            records.push(record);
        }

        for (name, variant) in [
            ("one_sided_new", OneSidedVariant::New),
            ("one_sided_reference", OneSidedVariant::Reference),
        ] {
            let mut failure = None;
            let record = run_timed(name, n, args.iterations, || {
                one_sided_lower_with(&mut ws, &lower, variant).unwrap_or_else(|e| {
                    failure = Some(e);
                    f64::NAN
                })
            });
            if let Some(e) = failure {
                return Err(e).with_context(|| format!("{name} at n = {n}"));
            }
            print_record(&record);
            records.push(record);
        }
        println!();
    }
    Ok(records)
}

// ── Baseline comparison ────────────────────────────────────────────────────

fn check_baseline(results: &[BenchRecord], baseline: &[BenchRecord]) -> bool {
    println!(
        "\n  {:<32} {:>10} {:>10} {:>10}  {}",
        "Benchmark", "Measured", "Threshold", "Baseline", "Status"
    );
    println!("  {}", "-".repeat(85));

    let mut all_pass = true;
    for result in results {
        let label = format!("{} n={}", result.name, result.n);
        match baseline
            .iter()
            .find(|e| e.name == result.name && e.n == result.n)
        {
            Some(entry) => {
                let pass = result.mean_ms <= entry.threshold_ms;
                if !pass {
                    all_pass = false;
                }
                println!(
                    "  {:<32} {:>8.2} ms {:>8.2} ms {:>8.2} ms  {}",
                    label,
                    result.mean_ms,
                    entry.threshold_ms,
                    entry.mean_ms,
                    if pass { "PASS" } else { "FAIL" }
                );
            }
            None => println!(
                "  {:<32} {:>8.2} ms {:>10} {:>10}  SKIP (no baseline)",
                label, result.mean_ms, "-", "-"
            ),
        }
    }
    all_pass
}

// ── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<ExitCode> {
    crossprob::env_config::init_tracing();
    let args = Args::parse();
    info!(min_n = args.min_n, max_n = args.max_n, iterations = args.iterations, "starting benchmarks");

    println!("crossprob wall-clock benchmarks");
    println!();
    let results = run_all(&args)?;

    if let Some(path) = &args.record {
        save_bench_records(path, &results)
            .with_context(|| format!("saving baseline to {}", path.display()))?;
        println!("Baseline saved to {}", path.display());
    } else if let Some(path) = &args.check {
        let baseline = load_bench_records(path).with_context(|| {
            format!("no usable baseline at {}; run with --record first", path.display())
        })?;
        let pass = check_baseline(&results, &baseline);
        println!();
        if pass {
            println!("ALL BENCHMARKS PASSED");
        } else {
            println!("BENCHMARK REGRESSION DETECTED");
            return Ok(ExitCode::FAILURE);
        }
    } else {
        println!("Done. Use --record PATH to save a baseline, --check PATH to compare.");
    }
    Ok(ExitCode::SUCCESS)
}
