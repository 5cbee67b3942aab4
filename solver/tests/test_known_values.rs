//! Closed-form checks: boundaries whose non-crossing probability is known exactly.

use crossprob::berk_jones::order_statistic_cdf;
use crossprob::one_sided::{one_sided_lower, one_sided_upper};
use crossprob::two_sided::two_sided;
use crossprob::OneSidedVariant;

const VARIANTS: [OneSidedVariant; 2] = [OneSidedVariant::New, OneSidedVariant::Reference];

fn assert_rel(got: f64, want: f64, tol: f64, what: &str) {
    assert!(
        (got - want).abs() <= tol * want.abs(),
        "{what}: got {got:.15e}, want {want:.15e}"
    );
}

fn ln_binomial(n: usize, k: usize) -> f64 {
    (1..=k).map(|j| ((n - k + j) as f64 / j as f64).ln()).sum()
}

/// Birnbaum–Tingey: Pr[D⁺ₙ ≥ d] = d Σ_{j=0}^{⌊n(1−d)⌋} C(n,j) (1−d−j/n)^{n−j} (d+j/n)^{j−1}.
fn birnbaum_tingey_exceedance(n: usize, d: f64) -> f64 {
    let nf = n as f64;
    let top = (nf * (1.0 - d)).floor() as usize;
    let sum: f64 = (0..=top)
        .map(|j| {
            let jf = j as f64;
            let a = 1.0 - d - jf / nf;
            if a <= 0.0 {
                return 0.0;
            }
            let b = d + jf / nf;
            let ln_term = ln_binomial(n, j) + (n - j) as f64 * a.ln() + (jf - 1.0) * b.ln();
            ln_term.exp()
        })
        .sum();
    d * sum
}

/// D⁺ₙ = maxᵢ (i/n − X₍ᵢ₎) < d  iff  X₍ᵢ₎ > i/n − d.
fn d_plus_lower(n: usize, d: f64) -> Vec<f64> {
    (1..=n).map(|i| (i as f64 / n as f64 - d).max(0.0)).collect()
}

/// D⁻ₙ = maxᵢ (X₍ᵢ₎ − (i−1)/n) < d  iff  X₍ᵢ₎ < (i−1)/n + d.
fn d_minus_upper(n: usize, d: f64) -> Vec<f64> {
    (1..=n)
        .map(|i| ((i - 1) as f64 / n as f64 + d).min(1.0))
        .collect()
}

// ── Two-sided ────────────────────────────────────────────────────────

#[test]
fn two_sided_single_sample_is_window_length() {
    for &(lo, hi) in &[(0.0, 0.25), (0.1, 0.9), (0.6, 0.61)] {
        for use_fft in [false, true] {
            let p = two_sided(&[lo], &[hi], use_fft).unwrap();
            assert_rel(p, hi - lo, 1e-12, "n=1");
        }
    }
}

#[test]
fn two_sided_extremes_window() {
    // a ≤ X₍₁₎ and X₍ₙ₎ ≤ c: (c − a)ⁿ
    let n = 12;
    let mut lower = vec![0.0; n];
    let mut upper = vec![1.0; n];
    lower[0] = 0.1;
    upper[n - 1] = 0.85;
    for use_fft in [false, true] {
        let p = two_sided(&lower, &upper, use_fft).unwrap();
        assert_rel(p, 0.75f64.powi(n as i32), 1e-11, "extremes window");
    }
}

#[test]
fn kolmogorov_small_d_formula() {
    // for 1/(2n) ≤ d ≤ 1/n: Pr[Dₙ < d] = n! (2d − 1/n)ⁿ
    for &(n, d) in &[(2usize, 0.4), (5, 0.15), (10, 0.07)] {
        let nf = n as f64;
        let lower: Vec<f64> = (1..=n).map(|i| i as f64 / nf - d).collect();
        let upper: Vec<f64> = (1..=n).map(|i| (i - 1) as f64 / nf + d).collect();
        let factorial: f64 = (1..=n).map(|i| i as f64).product();
        let want = factorial * (2.0 * d - 1.0 / nf).powi(n as i32);
        for use_fft in [false, true] {
            let p = two_sided(&lower, &upper, use_fft).unwrap();
            assert_rel(p, want, 1e-9, &format!("n={n} d={d}"));
        }
    }
}

#[test]
fn two_samples_inclusion_exclusion_closed_form() {
    // 0 ≤ X₍₁₎ ≤ 0.7 and 0.15 ≤ X₍₂₎ ≤ 1. The two failure events are disjoint:
    // 1 − Pr[X₍₁₎ > 0.7] − Pr[X₍₂₎ < 0.15] = 1 − 0.3² − 0.15²
    let p = two_sided(&[0.0, 0.15], &[0.7, 1.0], true).unwrap();
    assert_rel(p, 0.8875, 1e-12, "n=2");
}

#[test]
fn one_sided_d_plus_matches_birnbaum_tingey() {
    for &(n, d) in &[(10usize, 0.2), (50, 0.1), (200, 0.05)] {
        let want = 1.0 - birnbaum_tingey_exceedance(n, d);
        for variant in VARIANTS {
            let p = one_sided_lower(&d_plus_lower(n, d), variant).unwrap();
            assert_rel(p, want, 1e-9, &format!("{variant:?} n={n} d={d}"));
        }
        let p = two_sided(&d_plus_lower(n, d), &vec![1.0; n], n >= 80).unwrap();
        assert_rel(p, want, 1e-9, &format!("two-sided n={n} d={d}"));
    }
}

#[test]
fn d_plus_and_d_minus_have_the_same_law() {
    let (n, d) = (10, 0.2);
    for variant in VARIANTS {
        let plus = one_sided_lower(&d_plus_lower(n, d), variant).unwrap();
        let minus = one_sided_upper(&d_minus_upper(n, d), variant).unwrap();
        assert_rel(plus, minus, 1e-12, &format!("{variant:?}"));
    }
}

// ── One-sided ────────────────────────────────────────────────────────

#[test]
fn maximum_below_level() {
    // only the last bound binds after normalization: uⁿ
    for variant in VARIANTS {
        let p = one_sided_upper(&[1.0, 1.0, 1.0, 0.6], variant).unwrap();
        assert_rel(p, 0.6f64.powi(4), 1e-12, "max");
        let p = one_sided_lower(&[0.3, 0.0, 0.0], variant).unwrap();
        assert_rel(p, 0.7f64.powi(3), 1e-12, "min");
    }
}

#[test]
fn single_index_bound_is_beta_cdf() {
    let n = 25;
    for i in [1usize, 7, 13, 18] {
        let mut upper = vec![1.0; n];
        upper[i - 1] = 0.4;
        let want = order_statistic_cdf(i, n, 0.4).unwrap();
        for variant in VARIANTS {
            let p = one_sided_upper(&upper, variant).unwrap();
            assert_rel(p, want, 1e-10, &format!("{variant:?} i={i}"));
        }
    }
}

#[test]
fn daniels_holds_at_moderate_n() {
    // Pr[X₍ᵢ₎ ≥ i/(nλ) ∀i] = 1 − 1/λ
    let n = 5000;
    let lower: Vec<f64> = (1..=n).map(|i| i as f64 / (n as f64 * 1.25)).collect();
    let p = one_sided_lower(&lower, OneSidedVariant::New).unwrap();
    assert_rel(p, 0.2, 1e-9, "daniels n=5000");
}
