//! Wall-clock timing of solver calls.
//!
//! [`run_timed`] runs a closure once for warm-up and then `iterations` times,
//! keeping the last returned probability alongside the timing summary so that
//! a regression in speed and a change in value show up in the same record.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Timing summary for one (algorithm, n) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchRecord {
    pub name: String,
    pub n: usize,
    pub iterations: usize,
    pub mean_ms: f64,
    pub std_ms: f64,
    pub p95_ms: f64,
    /// max(mean + 3σ, 1.05·mean): slower runs count as regressions.
    pub threshold_ms: f64,
    /// Probability returned by the last timed call.
    pub value: f64,
}

/// The classic stress boundary: `lower[i] = (i+1)/(2(n+1))`,
/// `upper[i] = min(2(i+1)/(n+1), 1)`.
pub fn speedtest_boundary(n: usize) -> (Vec<f64>, Vec<f64>) {
    let denom = (n + 1) as f64;
    let lower = (0..n).map(|i| (i + 1) as f64 / (2.0 * denom)).collect();
    let upper = (0..n)
        .map(|i| (2.0 * (i + 1) as f64 / denom).min(1.0))
        .collect();
    (lower, upper)
}

pub fn run_timed<F>(name: &str, n: usize, iterations: usize, mut f: F) -> BenchRecord
where
    F: FnMut() -> f64,
{
    let iterations = iterations.max(1);
    let mut value = f();

    let mut times = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let start = Instant::now();
        value = f();
        times.push(start.elapsed().as_secs_f64() * 1000.0);
    }

    let count = times.len() as f64;
    let mean = times.iter().sum::<f64>() / count;
    let variance = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / count;
    let std = variance.sqrt();

    let mut sorted = times;
    sorted.sort_by(f64::total_cmp);
    let p95_idx = ((count * 0.95) as usize).min(sorted.len() - 1);

    BenchRecord {
        name: name.to_string(),
        n,
        iterations,
        mean_ms: mean,
        std_ms: std,
        p95_ms: sorted[p95_idx],
        threshold_ms: (mean + 3.0 * std).max(mean * 1.05),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speedtest_boundary_shape() {
        let (lower, upper) = speedtest_boundary(4);
        assert_eq!(lower, vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(upper, vec![0.4, 0.8, 1.0, 1.0]);
    }

    #[test]
    fn test_run_timed_keeps_value() {
        let mut calls = 0;
        let record = run_timed("count", 7, 4, || {
            calls += 1;
            calls as f64
        });
        assert_eq!(calls, 5);
        assert_eq!(record.value, 5.0);
        assert_eq!(record.iterations, 4);
        assert!(record.threshold_ms >= record.mean_ms);
    }
}
