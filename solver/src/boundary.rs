//! Boundary validation and normalization.
//!
//! A boundary constrains the order statistics of n uniforms:
//! `lower[i] ≤ X₍ᵢ₊₁₎ ≤ upper[i]`. Because order statistics are sorted, the
//! constraint set is unchanged when each sequence is replaced by its monotone
//! envelope (running max of `lower`, reverse running min of `upper`), which is
//! what the solvers consume.

use crate::error::{CrossprobError, Result};

/// Result of classifying a normalized boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    /// No constraint at all: the probability is exactly 1.
    Permissive,
    /// Some `lower[i] ≥ upper[i]`: the probability is exactly 0.
    Infeasible,
    General,
}

/// Reject empty, non-finite or out-of-range input.
pub fn validate_bound(side: &'static str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(CrossprobError::EmptyBoundary);
    }
    validate_steps(side, values)
}

/// Reject non-finite or out-of-range times. An empty sequence is accepted.
pub fn validate_steps(side: &'static str, values: &[f64]) -> Result<()> {
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(CrossprobError::NonFinite { side, index, value });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(CrossprobError::OutOfRange { side, index, value });
        }
    }
    Ok(())
}

/// [`validate_bound`] on both sides plus a length check.
pub fn validate_pair(lower: &[f64], upper: &[f64]) -> Result<()> {
    if lower.is_empty() || upper.is_empty() {
        return Err(CrossprobError::EmptyBoundary);
    }
    if lower.len() != upper.len() {
        return Err(CrossprobError::LengthMismatch {
            lower: lower.len(),
            upper: upper.len(),
        });
    }
    validate_bound("lower", lower)?;
    validate_bound("upper", upper)
}

/// Running maximum: the tightest nondecreasing sequence implied by `lower`.
pub fn lower_envelope(lower: &[f64]) -> Vec<f64> {
    let mut running = 0.0f64;
    lower
        .iter()
        .map(|&b| {
            running = running.max(b);
            running
        })
        .collect()
}

/// Reverse running minimum: the tightest nondecreasing sequence implied by `upper`.
pub fn upper_envelope(upper: &[f64]) -> Vec<f64> {
    let mut out = upper.to_vec();
    for i in (0..out.len().saturating_sub(1)).rev() {
        out[i] = out[i].min(out[i + 1]);
    }
    out
}

/// Mirror a bound through x ↦ 1 − x: `out[k] = 1 − bound[n−1−k]`.
///
/// A lower bound on X₍ᵢ₎ becomes an upper bound on the order statistics of
/// 1 − X, and vice versa.
pub fn reflect(bound: &[f64]) -> Vec<f64> {
    bound.iter().rev().map(|&x| 1.0 - x).collect()
}

/// Mirror a two-sided boundary; the result has the same non-crossing probability.
pub fn reflect_pair(lower: &[f64], upper: &[f64]) -> (Vec<f64>, Vec<f64>) {
    (reflect(upper), reflect(lower))
}

/// A validated boundary in monotone-envelope form.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Boundary {
    pub fn two_sided(lower: &[f64], upper: &[f64]) -> Result<Self> {
        validate_pair(lower, upper)?;
        Ok(Self {
            lower: lower_envelope(lower),
            upper: upper_envelope(upper),
        })
    }

    /// Lower bounds only; the upper side is fixed at 1.
    pub fn lower_only(lower: &[f64]) -> Result<Self> {
        validate_bound("lower", lower)?;
        Ok(Self {
            lower: lower_envelope(lower),
            upper: vec![1.0; lower.len()],
        })
    }

    /// Upper bounds only; the lower side is fixed at 0.
    pub fn upper_only(upper: &[f64]) -> Result<Self> {
        validate_bound("upper", upper)?;
        Ok(Self {
            lower: vec![0.0; upper.len()],
            upper: upper_envelope(upper),
        })
    }

    pub fn n(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn classify(&self) -> Feasibility {
        if self
            .lower
            .iter()
            .zip(&self.upper)
            .any(|(&lo, &hi)| lo >= hi)
        {
            return Feasibility::Infeasible;
        }
        if self.lower.iter().all(|&lo| lo <= 0.0) && self.upper.iter().all(|&hi| hi >= 1.0) {
            return Feasibility::Permissive;
        }
        Feasibility::General
    }
}

/// Step times of a two-sided boundary on the counting path N(t) of a Poisson
/// process on [0, 1].
///
/// `lower_steps[i]` is the time by which N must have reached i+1, and
/// `upper_steps[i]` the time from which N may reach i+1. N never exceeds
/// `upper_steps.len()`. The two sequences may differ in length. Both are held
/// in monotone-envelope form, which leaves the event unchanged since N is
/// nondecreasing.
#[derive(Debug, Clone, PartialEq)]
pub struct StepBoundary {
    lower_steps: Vec<f64>,
    upper_steps: Vec<f64>,
}

impl StepBoundary {
    pub fn new(lower_steps: &[f64], upper_steps: &[f64]) -> Result<Self> {
        validate_steps("lower_steps", lower_steps)?;
        validate_steps("upper_steps", upper_steps)?;
        Ok(Self {
            lower_steps: upper_envelope(lower_steps),
            upper_steps: lower_envelope(upper_steps),
        })
    }

    pub fn lower_steps(&self) -> &[f64] {
        &self.lower_steps
    }

    pub fn upper_steps(&self) -> &[f64] {
        &self.upper_steps
    }

    /// Largest count the path may take.
    pub fn max_count(&self) -> usize {
        self.upper_steps.len()
    }

    /// True when no path can satisfy both sides: a required count is never
    /// admissible, or must be reached no later than it becomes admissible.
    pub fn crosses(&self) -> bool {
        self.lower_steps.len() > self.upper_steps.len()
            || self
                .lower_steps
                .iter()
                .zip(&self.upper_steps)
                .any(|(&must, &may)| must <= may)
    }
}
