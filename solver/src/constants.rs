//! Numeric constants shared by the solvers and the application layer.
//!
//! - FFT transform lengths are rounded up to [`FFT_LENGTH_ROUNDING`].
//! - Convolutions shorter than [`FFT_MIN_LENGTH`] use the direct loop.
//! - The one-sided block DP advances [`block_size`]`(n)` bounds per FFT step.

/// Transform lengths are padded to a multiple of this value so that the
/// planner sees a small set of sizes with friendly factorizations.
pub const FFT_LENGTH_ROUNDING: usize = 128;

/// Below this input length the direct O(n²) loop beats the transform.
pub const FFT_MIN_LENGTH: usize = 80;

/// Largest n for which the renewal-recursion one-sided variant is known to
/// stay accurate. Above it the result is still returned, with a warning.
pub const REFERENCE_STABLE_MAX_N: usize = 30_000;

/// Maximum number of halvings in the Mn+ threshold bisection.
pub const THRESHOLD_MAX_STEPS: usize = 110;

/// Relative error above which a threshold search is reported as inexact.
pub const THRESHOLD_TOLERANCE: f64 = 1e-11;

/// Default port for `crossprob-server`.
pub const DEFAULT_PORT: u16 = 9100;

/// Default upper limit on n accepted by the HTTP adapter.
pub const DEFAULT_MAX_REQUEST_N: usize = 200_000;

/// Number of bounds processed per block by the one-sided block DP: ⌊√n⌋ + 1.
#[inline(always)]
pub fn block_size(n: usize) -> usize {
    (n as f64).sqrt() as usize + 1
}
