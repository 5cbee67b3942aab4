//! Shared environment configuration for all crossprob binaries.
//!
//! Consolidates `CROSSPROB_LOG`, `RAYON_NUM_THREADS`, `CROSSPROB_PORT` and
//! `CROSSPROB_MAX_N` reads.

use tracing_subscriber::EnvFilter;

use crate::constants::{DEFAULT_MAX_REQUEST_N, DEFAULT_PORT};

/// Install the global `tracing` subscriber. The filter comes from
/// `CROSSPROB_LOG`, then `RUST_LOG`, defaulting to `info`. Output goes to
/// stderr so that stdout stays machine-readable.
pub fn init_tracing() {
    let filter = std::env::var("CROSSPROB_LOG")
        .ok()
        .and_then(|s| EnvFilter::try_new(s).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    // Keep an already-installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`, default: all cores).
/// Builds the rayon global thread pool, tolerating one that already exists.
/// Returns the thread count.
pub fn init_rayon_threads() -> usize {
    let requested = std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse::<usize>().ok());
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = requested {
        builder = builder.num_threads(n);
    }
    if builder.build_global().is_err() {
        tracing::debug!("rayon global pool already initialized");
    }
    let num_threads = rayon::current_num_threads();
    tracing::info!(num_threads, "rayon threads");
    num_threads
}

/// Read `CROSSPROB_PORT` (default 9100).
pub fn server_port() -> u16 {
    std::env::var("CROSSPROB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Read `CROSSPROB_MAX_N` (default 200 000): the largest n the server accepts.
pub fn max_request_n() -> usize {
    std::env::var("CROSSPROB_MAX_N")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_REQUEST_N)
}
