//! Poisson probability mass function, evaluated in the log domain.
//!
//! Pr[Pois(λ) = k] = exp(k·ln λ − λ − ln k!). Exponentiating last keeps the
//! value finite for any (λ, k) the solvers produce: results that are too small
//! to represent underflow to 0.0 instead of turning into NaN.
//!
//! [`PoissonPmf`] caches ln k! in a table sized to the largest k requested, so
//! the DP inner loops only pay for one `exp` per entry.

use statrs::function::gamma::ln_gamma;

use crate::error::{CrossprobError, Result};

/// ln k! (exactly 0 for k ≤ 1).
pub fn ln_factorial(k: usize) -> f64 {
    if k < 2 {
        0.0
    } else {
        ln_gamma(k as f64 + 1.0)
    }
}

/// Pr[Pois(lambda) = k]. Rejects negative or non-finite rates.
pub fn poisson_pmf(lambda: f64, k: usize) -> Result<f64> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(CrossprobError::InvalidRate(lambda));
    }
    Ok(pmf_from_ln_factorial(lambda, k, ln_factorial(k)))
}

#[inline(always)]
fn pmf_from_ln_factorial(lambda: f64, k: usize, ln_k_factorial: f64) -> f64 {
    if lambda == 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    (k as f64 * lambda.ln() - lambda - ln_k_factorial).exp()
}

/// Cached ln k! table.
#[derive(Debug, Default, Clone)]
pub struct PoissonPmf {
    ln_factorials: Vec<f64>,
}

impl PoissonPmf {
    /// Grow the ln k! table so that every k ≤ `max_k` is a lookup.
    pub fn reserve(&mut self, max_k: usize) {
        let have = self.ln_factorials.len();
        if have > max_k {
            return;
        }
        self.ln_factorials.reserve(max_k + 1 - have);
        for k in have..=max_k {
            self.ln_factorials.push(ln_factorial(k));
        }
    }

    /// Pr[Pois(lambda) = k]. `lambda` must already be known to be finite and
    /// non-negative; k beyond the table falls back to lnΓ.
    #[inline]
    pub fn evaluate(&self, lambda: f64, k: usize) -> f64 {
        debug_assert!(lambda.is_finite() && lambda >= 0.0, "lambda={lambda}");
        let ln_k_factorial = match self.ln_factorials.get(k) {
            Some(&v) => v,
            None => ln_factorial(k),
        };
        pmf_from_ln_factorial(lambda, k, ln_k_factorial)
    }

    /// Write Pr[Pois(lambda) = k] for k = 0..out.len() into `out`.
    pub fn fill_into(&self, lambda: f64, out: &mut [f64]) {
        if lambda == 0.0 {
            out.fill(0.0);
            if let Some(first) = out.first_mut() {
                *first = 1.0;
            }
            return;
        }
        let ln_lambda = lambda.ln();
        for (k, slot) in out.iter_mut().enumerate() {
            let ln_k_factorial = match self.ln_factorials.get(k) {
                Some(&v) => v,
                None => ln_factorial(k),
            };
            *slot = (k as f64 * ln_lambda - lambda - ln_k_factorial).exp();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_match_closed_form() {
        let lambda: f64 = 2.5;
        let expected = [
            (-lambda).exp(),
            lambda * (-lambda).exp(),
            lambda * lambda / 2.0 * (-lambda).exp(),
            lambda.powi(3) / 6.0 * (-lambda).exp(),
        ];
        for (k, &e) in expected.iter().enumerate() {
            let p = poisson_pmf(lambda, k).unwrap();
            assert!((p - e).abs() < 1e-14, "k={k}: {p} vs {e}");
        }
    }

    #[test]
    fn test_zero_rate_is_point_mass() {
        assert_eq!(poisson_pmf(0.0, 0).unwrap(), 1.0);
        assert_eq!(poisson_pmf(0.0, 1).unwrap(), 0.0);
        assert_eq!(poisson_pmf(0.0, 1000).unwrap(), 0.0);
        let mut out = [0.5; 4];
        PoissonPmf::default().fill_into(0.0, &mut out);
        assert_eq!(out, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_invalid_rate() {
        assert!(matches!(
            poisson_pmf(-1.0, 0),
            Err(CrossprobError::InvalidRate(_))
        ));
        assert!(poisson_pmf(f64::NAN, 3).is_err());
        assert!(poisson_pmf(f64::INFINITY, 3).is_err());
    }

    #[test]
    fn test_underflow_is_zero_not_nan() {
        let p = poisson_pmf(1e6, 0).unwrap();
        assert_eq!(p, 0.0);
        let p = poisson_pmf(1e-300, 500).unwrap();
        assert_eq!(p, 0.0);
    }

    #[test]
    fn test_mass_sums_to_one() {
        let mut table = PoissonPmf::default();
        table.reserve(599);
        let mut out = vec![0.0; 600];
        for &lambda in &[0.3, 7.0, 120.0] {
            table.fill_into(lambda, &mut out);
            let total: f64 = out.iter().sum();
            assert!((total - 1.0).abs() < 1e-12, "lambda={lambda}: sum={total}");
        }
    }

    #[test]
    fn test_table_matches_free_function() {
        let mut table = PoissonPmf::default();
        table.reserve(50);
        for k in [0usize, 1, 17, 50, 80] {
            let a = table.evaluate(33.3, k);
            let b = poisson_pmf(33.3, k).unwrap();
            assert!((a - b).abs() <= 1e-15 * b.max(1e-300), "k={k}");
        }
    }

    #[test]
    fn test_mode_at_large_rate() {
        // Stirling: Pr[Pois(n) = n] ≈ 1/sqrt(2πn)
        let n = 100_000usize;
        let p = poisson_pmf(n as f64, n).unwrap();
        let approx = 1.0 / (2.0 * std::f64::consts::PI * n as f64).sqrt();
        assert!((p / approx - 1.0).abs() < 1e-5, "p={p}");
    }
}
