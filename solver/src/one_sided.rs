//! One-sided non-crossing probabilities.
//!
//! Both variants solve the upper problem `X₍ᵢ₊₁₎ ≤ B[i]`, i.e. for a Poisson
//! process of intensity n, `N(B[i]) ≥ i+1` for every i. The lower problem
//! `X₍ᵢ₊₁₎ ≥ b[i]` is the same problem for the mirrored sample 1 − X, with
//! `B[k] = 1 − b[n−1−k]`.
//!
//! | Variant | Method | Cost | Numerics |
//! |---------|--------|------|----------|
//! | [`OneSidedVariant::New`] | blocked Poisson DP | O(n²) | stable for n up to several 10⁵ |
//! | [`OneSidedVariant::Reference`] | first-passage renewal recursion | O(n²) | alternating sums, degrades with n |

use tracing::{debug, warn};

use crate::boundary::{reflect, Boundary, Feasibility};
use crate::constants::{block_size, REFERENCE_STABLE_MAX_N};
use crate::error::Result;
use crate::types::{OneSidedVariant, Workspace};

/// Pr[X₍ᵢ₊₁₎ ≥ lower[i] for all i].
pub fn one_sided_lower(lower: &[f64], variant: OneSidedVariant) -> Result<f64> {
    let mut ws = Workspace::new();
    one_sided_lower_with(&mut ws, lower, variant)
}

/// Pr[X₍ᵢ₊₁₎ ≤ upper[i] for all i].
pub fn one_sided_upper(upper: &[f64], variant: OneSidedVariant) -> Result<f64> {
    let mut ws = Workspace::new();
    one_sided_upper_with(&mut ws, upper, variant)
}

/// [`one_sided_lower`] reusing the buffers of `ws`.
pub fn one_sided_lower_with(
    ws: &mut Workspace,
    lower: &[f64],
    variant: OneSidedVariant,
) -> Result<f64> {
    let boundary = Boundary::lower_only(lower)?;
    match boundary.classify() {
        Feasibility::Permissive => return Ok(1.0),
        Feasibility::Infeasible => return Ok(0.0),
        Feasibility::General => {}
    }
    Ok(solve_upper(ws, &reflect(boundary.lower()), variant))
}

/// [`one_sided_upper`] reusing the buffers of `ws`.
pub fn one_sided_upper_with(
    ws: &mut Workspace,
    upper: &[f64],
    variant: OneSidedVariant,
) -> Result<f64> {
    let boundary = Boundary::upper_only(upper)?;
    match boundary.classify() {
        Feasibility::Permissive => return Ok(1.0),
        Feasibility::Infeasible => return Ok(0.0),
        Feasibility::General => {}
    }
    Ok(solve_upper(ws, boundary.upper(), variant))
}

/// `bounds` is nondecreasing, inside [0, 1] and not degenerate.
fn solve_upper(ws: &mut Workspace, bounds: &[f64], variant: OneSidedVariant) -> f64 {
    debug!(n = bounds.len(), variant = variant.name(), "one-sided solve");
    match variant {
        OneSidedVariant::New => block_dp(ws, bounds).clamp(0.0, 1.0),
        OneSidedVariant::Reference => {
            if bounds.len() > REFERENCE_STABLE_MAX_N {
                warn!(
                    n = bounds.len(),
                    limit = REFERENCE_STABLE_MAX_N,
                    "reference one-sided variant is numerically unreliable at this size"
                );
            }
            renewal_recursion(ws, bounds)
        }
    }
}

/// Blocked Poisson DP.
///
/// The column holds Pr[N(t) = k, no crossing yet] for k = 0..=n. Bounds are
/// consumed in blocks `start..=last` of at most ⌊√n⌋+1 indices:
///
/// 1. One convolution advances the column from the previous block end to
///    `B[last]`, ignoring crossings inside the block. Counts ≤ `last` at
///    `B[last]` are crossings and are dropped.
/// 2. Paths counted at step 1 that crossed at some `B[i]`, i < last, but
///    recovered by `B[last]` must be removed. A narrow DP over counts
///    `start..=last` finds the first-exit mass at each `B[i]`; its forward
///    image (Poisson weights from `B[i]` to `B[last]`) is subtracted.
///
/// Subtractions only touch probability mass that was added within the same
/// block, which keeps cancellation bounded.
fn block_dp(ws: &mut Workspace, bounds: &[f64]) -> f64 {
    let n = bounds.len();
    let intensity = n as f64;
    let jump = block_size(n);
    ws.prepare(n);
    let Workspace {
        columns,
        mini,
        scratch,
        kernel,
        pmf,
        convolver,
    } = ws;

    columns.src_mut()[0] = 1.0;
    let mut start = 0usize;
    let mut prev_location = 0.0;

    while start < n {
        let last = (start + jump - 1).min(n - 1);
        let location = bounds[last];
        let block_len = last - start + 1;
        let len = n + 1 - start;

        pmf.fill_into(intensity * (location - prev_location), &mut kernel[..len]);
        let (src, dest) = columns.split();
        convolver.convolve_same_size(&kernel[..len], &src[start..], &mut scratch[..len]);
        dest[..=last].fill(0.0);
        dest[last + 1..].copy_from_slice(&scratch[block_len..len]);

        // counts start..=last at the previous block end, before any crossing
        mini.reset(block_len);
        mini.src_mut().copy_from_slice(&src[start..=last]);

        let mut mini_location = prev_location;
        for i in start..last {
            let offset = i - start;
            let size = last - i + 1;
            pmf.fill_into(intensity * (bounds[i] - mini_location), &mut kernel[..size]);
            {
                let (mini_src, mini_dest) = mini.split();
                convolver.convolve_same_size(
                    &kernel[..size],
                    &mini_src[offset..],
                    &mut mini_dest[offset..offset + size],
                );
                let exit_mass = mini_dest[offset];
                if exit_mass != 0.0 {
                    let lambda = intensity * (location - bounds[i]);
                    for j in last + 1..=n {
                        dest[j] -= exit_mass * pmf.evaluate(lambda, j - i);
                    }
                }
                mini_dest[offset] = 0.0;
                mini_src[offset] = 0.0;
            }
            mini.flip();
            mini_location = bounds[i];
        }

        columns.flip();
        prev_location = location;
        start = last + 1;
    }

    // from B[n−1] to 1 only the count n survives
    let tail = pmf.evaluate(intensity * (1.0 - prev_location), 0);
    let survived = columns.src()[n] * tail;
    survived / pmf.evaluate(intensity, n)
}

/// First-passage renewal recursion.
///
/// With `q[i]` = Pr[the first crossing happens at `B[i]`], Poissonized:
///
/// ```text
/// q[i] = P(n·B[i], i) − Σ_{j<i} q[j]·P(n·(B[i] − B[j]), i − j)
/// Pr[no crossing] = (P(n, n) − Σ_j q[j]·P(n·(1 − B[j]), n − j)) / P(n, n)
/// ```
///
/// where P(λ, k) is the Poisson pmf. The result is returned as computed.
fn renewal_recursion(ws: &mut Workspace, bounds: &[f64]) -> f64 {
    let n = bounds.len();
    let intensity = n as f64;
    ws.prepare(n);
    let Workspace { scratch, pmf, .. } = ws;
    let first_passage = &mut scratch[..n];

    for i in 0..n {
        let mut q = pmf.evaluate(intensity * bounds[i], i);
        for j in 0..i {
            q -= first_passage[j] * pmf.evaluate(intensity * (bounds[i] - bounds[j]), i - j);
        }
        first_passage[i] = q;
    }

    let total = pmf.evaluate(intensity, n);
    let mut survived = total;
    for j in 0..n {
        survived -= first_passage[j] * pmf.evaluate(intensity * (1.0 - bounds[j]), n - j);
    }
    survived / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::two_sided::two_sided;

    const VARIANTS: [OneSidedVariant; 2] = [OneSidedVariant::New, OneSidedVariant::Reference];

    fn assert_close(got: f64, want: f64, tol: f64) {
        assert!(
            (got - want).abs() <= tol * want.abs().max(1e-300),
            "got {got}, want {want}"
        );
    }

    /// Daniels: Pr[X₍ᵢ₎ ≥ i/(nλ) ∀i] = 1 − 1/λ for every n.
    fn daniels_lower(n: usize, lambda: f64) -> Vec<f64> {
        (1..=n).map(|i| i as f64 / (n as f64 * lambda)).collect()
    }

    #[test]
    fn test_single_sample() {
        for variant in VARIANTS {
            assert_close(one_sided_upper(&[0.3], variant).unwrap(), 0.3, 1e-12);
            assert_close(one_sided_lower(&[0.3], variant).unwrap(), 0.7, 1e-12);
        }
    }

    #[test]
    fn test_daniels_formula() {
        for variant in VARIANTS {
            for &n in &[1usize, 2, 7, 40, 250] {
                let p = one_sided_lower(&daniels_lower(n, 1.6), variant).unwrap();
                assert_close(p, 1.0 - 1.0 / 1.6, 1e-9);
            }
        }
    }

    #[test]
    fn test_daniels_formula_large_n() {
        let p = one_sided_lower(&daniels_lower(3000, 4.0), OneSidedVariant::New).unwrap();
        assert_close(p, 0.75, 1e-9);
    }

    #[test]
    fn test_variants_agree() {
        let n = 300usize;
        let upper: Vec<f64> = (0..n)
            .map(|i| ((i as f64 + 0.5) / n as f64 + 0.05).min(1.0))
            .collect();
        let new = one_sided_upper(&upper, OneSidedVariant::New).unwrap();
        let reference = one_sided_upper(&upper, OneSidedVariant::Reference).unwrap();
        assert!(new > 0.0 && new < 1.0);
        assert_close(reference, new, 1e-9);
    }

    #[test]
    fn test_upper_matches_two_sided_with_zero_lower() {
        let upper = [0.25, 0.4, 0.7, 0.8, 0.95];
        let two = two_sided(&[0.0; 5], &upper, false).unwrap();
        for variant in VARIANTS {
            assert_close(one_sided_upper(&upper, variant).unwrap(), two, 1e-10);
        }
        let lower = [0.05, 0.1, 0.4, 0.6, 0.65];
        let two = two_sided(&lower, &[1.0; 5], false).unwrap();
        for variant in VARIANTS {
            assert_close(one_sided_lower(&lower, variant).unwrap(), two, 1e-10);
        }
    }

    #[test]
    fn test_mirror_symmetry() {
        let lower = [0.01, 0.2, 0.21, 0.5, 0.55, 0.9];
        for variant in VARIANTS {
            let a = one_sided_lower(&lower, variant).unwrap();
            let b = one_sided_upper(&reflect(&lower), variant).unwrap();
            assert_close(a, b, 1e-12);
        }
    }

    #[test]
    fn test_fast_paths() {
        for variant in VARIANTS {
            assert_eq!(one_sided_upper(&[1.0; 4], variant).unwrap(), 1.0);
            assert_eq!(one_sided_upper(&[0.0, 0.5, 1.0], variant).unwrap(), 0.0);
            assert_eq!(one_sided_lower(&[0.0; 4], variant).unwrap(), 1.0);
            assert_eq!(one_sided_lower(&[0.0, 0.5, 1.0], variant).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_invalid_input() {
        assert!(one_sided_upper(&[], OneSidedVariant::New).is_err());
        assert!(one_sided_lower(&[0.1, f64::NAN], OneSidedVariant::Reference).is_err());
        assert!(one_sided_lower(&[0.1, 1.2], OneSidedVariant::New).is_err());
    }

    #[test]
    fn test_tightening_never_increases_probability() {
        let n = 120usize;
        let base: Vec<f64> = (0..n).map(|i| (i as f64 + 1.0) / (n as f64 * 1.3)).collect();
        let p0 = one_sided_lower(&base, OneSidedVariant::New).unwrap();
        let mut tighter = base.clone();
        tighter[60] += 0.05;
        let p1 = one_sided_lower(&tighter, OneSidedVariant::New).unwrap();
        assert!(p1 <= p0 + 1e-12, "{p1} > {p0}");
    }

    #[test]
    #[cfg_attr(debug_assertions, ignore)]
    fn test_new_variant_large_n_is_finite() {
        let n = 20_000usize;
        let p = one_sided_lower(&daniels_lower(n, 2.0), OneSidedVariant::New).unwrap();
        assert_close(p, 0.5, 1e-7);
    }
}
