//! Berk–Jones Mₙ⁺ statistic: exact distribution and level-α thresholds.
//!
//! For a sorted sample X₍₁₎ ≤ … ≤ X₍ₙ₎ of uniforms, each order statistic has
//! CDF `Fᵢ = Beta(i, n−i+1)`, so `Fᵢ(X₍ᵢ₎)` is a p-value for "X₍ᵢ₎ is too
//! small". The statistic is their minimum:
//!
//! ```text
//! Mₙ⁺ = minᵢ Fᵢ(X₍ᵢ₎)
//! Pr[Mₙ⁺ ≥ x] = Pr[X₍ᵢ₎ ≥ Fᵢ⁻¹(x) ∀i]
//! ```
//!
//! The right-hand side is a one-sided lower non-crossing probability, computed
//! with the stable block DP. Thresholds are found by bisection on x.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF};
use tracing::{debug, warn};

use crate::constants::{THRESHOLD_MAX_STEPS, THRESHOLD_TOLERANCE};
use crate::error::{CrossprobError, Result};
use crate::one_sided::one_sided_lower_with;
use crate::types::{OneSidedVariant, Workspace};

fn order_statistic_distribution(i: usize, n: usize) -> Result<Beta> {
    if i == 0 || i > n {
        return Err(CrossprobError::InvalidParameter(format!(
            "order statistic index {i} outside 1..={n}"
        )));
    }
    Beta::new(i as f64, (n - i + 1) as f64)
        .map_err(|e| CrossprobError::InvalidParameter(e.to_string()))
}

fn check_unit(name: &str, x: f64) -> Result<()> {
    if !x.is_finite() || !(0.0..=1.0).contains(&x) {
        return Err(CrossprobError::InvalidParameter(format!(
            "{name} = {x} must lie in [0, 1]"
        )));
    }
    Ok(())
}

fn check_n(n: usize) -> Result<()> {
    if n == 0 {
        return Err(CrossprobError::EmptyBoundary);
    }
    Ok(())
}

/// Pr[U₍ᵢ₎ ≤ x] for the i-th of n uniform order statistics (1-based i).
pub fn order_statistic_cdf(i: usize, n: usize, x: f64) -> Result<f64> {
    check_unit("x", x)?;
    Ok(order_statistic_distribution(i, n)?.cdf(x))
}

/// Mₙ⁺ of a sample of values in [0, 1]. The sample need not be sorted.
pub fn mn_plus_statistic(samples: &[f64]) -> Result<f64> {
    if samples.is_empty() {
        return Err(CrossprobError::EmptyBoundary);
    }
    for &x in samples {
        check_unit("sample", x)?;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let mut statistic = f64::INFINITY;
    for (i, &x) in sorted.iter().enumerate() {
        statistic = statistic.min(order_statistic_distribution(i + 1, n)?.cdf(x));
    }
    Ok(statistic)
}

/// Lower bounds `bᵢ = Fᵢ⁻¹(x)` such that Mₙ⁺ ≥ x iff X₍ᵢ₎ ≥ bᵢ for all i.
pub fn mn_plus_bounds(n: usize, x: f64) -> Result<Vec<f64>> {
    check_n(n)?;
    check_unit("x", x)?;
    if x == 0.0 {
        return Ok(vec![0.0; n]);
    }
    if x == 1.0 {
        return Ok(vec![1.0; n]);
    }
    (1..=n)
        .map(|i| {
            let b = order_statistic_distribution(i, n)?.inverse_cdf(x);
            Ok(b.clamp(0.0, 1.0))
        })
        .collect()
}

/// Pr[Mₙ⁺ < x].
pub fn mn_plus_cdf(n: usize, x: f64) -> Result<f64> {
    let mut ws = Workspace::new();
    mn_plus_cdf_with(&mut ws, n, x)
}

/// [`mn_plus_cdf`] reusing the buffers of `ws`.
pub fn mn_plus_cdf_with(ws: &mut Workspace, n: usize, x: f64) -> Result<f64> {
    let bounds = mn_plus_bounds(n, x)?;
    let noncrossing = one_sided_lower_with(ws, &bounds, OneSidedVariant::New)?;
    Ok(1.0 - noncrossing)
}

/// Outcome of a threshold search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MnPlusThreshold {
    pub n: usize,
    pub alpha: f64,
    /// x with Pr[Mₙ⁺ < x] ≈ alpha.
    pub threshold: f64,
    /// Pr[Mₙ⁺ < threshold] as computed.
    pub achieved: f64,
    pub relative_error: f64,
    pub steps: usize,
}

/// Level-`alpha` threshold of Mₙ⁺ by bisection on [0, 1].
pub fn mn_plus_threshold(n: usize, alpha: f64) -> Result<MnPlusThreshold> {
    let mut ws = Workspace::new();
    mn_plus_threshold_with(&mut ws, n, alpha)
}

/// [`mn_plus_threshold`] reusing the buffers of `ws`.
pub fn mn_plus_threshold_with(
    ws: &mut Workspace,
    n: usize,
    alpha: f64,
) -> Result<MnPlusThreshold> {
    check_n(n)?;
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(CrossprobError::InvalidParameter(format!(
            "alpha = {alpha} must lie in (0, 1)"
        )));
    }

    let (mut low, mut high) = (0.0f64, 1.0f64);
    let mut steps = 0;
    while steps < THRESHOLD_MAX_STEPS {
        let mid = 0.5 * (low + high);
        if mid <= low || mid >= high {
            break;
        }
        if mn_plus_cdf_with(ws, n, mid)? < alpha {
            low = mid;
        } else {
            high = mid;
        }
        steps += 1;
    }

    let threshold = 0.5 * (low + high);
    let achieved = mn_plus_cdf_with(ws, n, threshold)?;
    let relative_error = (achieved - alpha).abs() / alpha;
    if relative_error > THRESHOLD_TOLERANCE {
        warn!(n, alpha, threshold, achieved, relative_error, "threshold search is inexact");
    } else {
        debug!(n, alpha, threshold, steps, "threshold found");
    }
    Ok(MnPlusThreshold {
        n,
        alpha,
        threshold,
        achieved,
        relative_error,
        steps,
    })
}

/// Thresholds for many sample sizes, one workspace per rayon worker.
pub fn mn_plus_thresholds(alpha: f64, ns: &[usize]) -> Result<Vec<MnPlusThreshold>> {
    ns.par_iter()
        .map_init(Workspace::new, |ws, &n| mn_plus_threshold_with(ws, n, alpha))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_statistic_cdf() {
        // X(1) of 2 uniforms: 1 − (1 − x)²
        let p = order_statistic_cdf(1, 2, 0.1).unwrap();
        assert!((p - 0.19).abs() < 1e-12, "p={p}");
        assert!(order_statistic_cdf(0, 2, 0.1).is_err());
        assert!(order_statistic_cdf(3, 2, 0.1).is_err());
        assert!(order_statistic_cdf(1, 2, 1.5).is_err());
    }

    #[test]
    fn test_statistic_of_small_sample() {
        let m = mn_plus_statistic(&[0.9, 0.1]).unwrap();
        assert!((m - 0.19).abs() < 1e-12, "m={m}");
        let m = mn_plus_statistic(&[0.5]).unwrap();
        assert!((m - 0.5).abs() < 1e-12);
        assert!(mn_plus_statistic(&[]).is_err());
        assert!(mn_plus_statistic(&[0.2, f64::NAN]).is_err());
    }

    #[test]
    fn test_bounds_are_monotone_and_invert_cdf() {
        let n = 20;
        let x = 0.01;
        let bounds = mn_plus_bounds(n, x).unwrap();
        assert_eq!(bounds.len(), n);
        for w in bounds.windows(2) {
            assert!(w[0] <= w[1]);
        }
        for (i, &b) in bounds.iter().enumerate() {
            let back = order_statistic_cdf(i + 1, n, b).unwrap();
            assert!((back - x).abs() < 1e-8, "i={i}: {back}");
        }
        assert_eq!(mn_plus_bounds(3, 0.0).unwrap(), vec![0.0; 3]);
        assert_eq!(mn_plus_bounds(3, 1.0).unwrap(), vec![1.0; 3]);
    }

    #[test]
    fn test_cdf_endpoints_and_range() {
        assert_eq!(mn_plus_cdf(10, 0.0).unwrap(), 0.0);
        assert_eq!(mn_plus_cdf(10, 1.0).unwrap(), 1.0);
        // the minimum of n uniform p-values is stochastically smaller than one of them
        let p = mn_plus_cdf(10, 0.05).unwrap();
        assert!(p >= 0.05 && p < 1.0, "p={p}");
    }

    #[test]
    fn test_single_sample_threshold_is_alpha() {
        let t = mn_plus_threshold(1, 0.05).unwrap();
        assert!((t.threshold - 0.05).abs() < 1e-8, "{t:?}");
        assert!(t.relative_error < 1e-8);
    }

    #[test]
    fn test_threshold_hits_level() {
        let t = mn_plus_threshold(50, 0.05).unwrap();
        assert!(t.threshold > 0.0 && t.threshold < 0.05, "{t:?}");
        assert!(t.relative_error < 1e-9, "{t:?}");
    }

    #[test]
    fn test_parallel_sweep_matches_serial() {
        let ns = [1usize, 5, 12];
        let parallel = mn_plus_thresholds(0.1, &ns).unwrap();
        for (t, &n) in parallel.iter().zip(&ns) {
            let serial = mn_plus_threshold(n, 0.1).unwrap();
            assert_eq!(t, &serial);
        }
        assert!(mn_plus_thresholds(1.5, &ns).is_err());
    }
}
