//! # crossprob: exact non-crossing probabilities for uniform order statistics
//!
//! Given n i.i.d. Uniform[0,1] samples with order statistics X₍₁₎ ≤ … ≤ X₍ₙ₎
//! and per-index bounds, computes
//!
//! ```text
//! Pr[lower[i] ≤ X₍ᵢ₊₁₎ ≤ upper[i] for all i]
//! ```
//!
//! exactly (up to floating-point error). Equivalently: the probability that the
//! empirical CDF stays between two boundary functions. This is the quantity
//! behind Kolmogorov–Smirnov type tests and exact Berk–Jones p-values.
//!
//! ## Algorithm overview
//!
//! All solvers replace the sample by a Poisson process of intensity n and
//! propagate the count distribution through the boundary events; the final
//! mass at count n divided by Pr[Pois(n) = n] is the answer for exactly n
//! samples.
//!
//! | Problem | Entry point | Rust module | Cost |
//! |---------|-------------|-------------|------|
//! | two-sided, direct sums | [`two_sided::two_sided`]`(.., false)` | [`two_sided`] | O(n³) |
//! | two-sided, FFT | [`two_sided::two_sided`]`(.., true)` | [`two_sided`] + [`convolution`] | O(n² log n) |
//! | one-sided, stable | [`one_sided::one_sided_lower`] / [`one_sided::one_sided_upper`] with [`types::OneSidedVariant::New`] | [`one_sided`] | O(n²) |
//! | one-sided, renewal recursion | same, with [`types::OneSidedVariant::Reference`] | [`one_sided`] | O(n²) |
//! | Poisson process, any rate | [`two_sided::poisson_noncrossing`] | [`two_sided`] | as two-sided |
//!
//! Boundaries are validated and reduced to their monotone envelope by
//! [`boundary`]; degenerate boundaries resolve to exactly 0 or 1 without
//! running a solver.
//!
//! ## Around the engine
//!
//! - [`berk_jones`]: the Mₙ⁺ statistic, its exact CDF and level-α thresholds.
//! - [`storage`]: boundary files and persisted benchmark records.
//! - [`server`]: stateless HTTP endpoints.
//! - [`benchmark`]: wall-clock timing used by `crossprob-bench`.

#![allow(clippy::needless_range_loop)]

pub mod benchmark;
pub mod berk_jones;
pub mod boundary;
pub mod constants;
pub mod convolution;
pub mod env_config;
pub mod error;
pub mod one_sided;
pub mod poisson;
pub mod server;
pub mod storage;
pub mod two_sided;
pub mod types;

pub use error::{CrossprobError, Result};
pub use one_sided::{one_sided_lower, one_sided_upper};
pub use two_sided::{poisson_noncrossing, two_sided};
pub use types::{OneSidedVariant, TwoSidedAlgorithm, Workspace};
