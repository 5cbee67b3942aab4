//! Linear convolution of real sequences, direct or via FFT.
//!
//! The DP solvers only ever need the first `len` outputs of a convolution of
//! two length-`len` prefixes ([`FftConvolver::convolve_same_size`]); the full
//! linear convolution is exposed for completeness.
//!
//! ## FFT path
//!
//! Both real inputs are packed into one complex signal `z = a + i·b`, so a
//! product needs one forward and one inverse transform:
//!
//! ```text
//! A[k] = (Z[k] + conj(Z[-k])) / 2
//! B[k] = (Z[k] - conj(Z[-k])) / 2i
//! A[k]·B[k] = (Z[k]² - conj(Z[-k])²) / 4i
//! ```
//!
//! Each input is rescaled to unit max-magnitude before packing so that a small
//! operand is not drowned by the rounding noise of a large one. Transform
//! lengths are rounded up to a multiple of [`FFT_LENGTH_ROUNDING`]; inputs
//! shorter than [`FFT_MIN_LENGTH`] take the direct loop.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::constants::{FFT_LENGTH_ROUNDING, FFT_MIN_LENGTH};

/// Full linear convolution, O(|a|·|b|). Empty if either input is empty.
pub fn convolve_naive(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `out[j] = Σ_{k≤j} a[k]·b[j−k]` for `j < out.len()`.
///
/// Both inputs must be at least `out.len()` long.
pub fn convolve_same_size_naive(a: &[f64], b: &[f64], out: &mut [f64]) {
    let len = out.len();
    debug_assert!(a.len() >= len && b.len() >= len);
    for j in 0..len {
        let mut acc = 0.0;
        for k in 0..=j {
            acc += a[k] * b[j - k];
        }
        out[j] = acc;
    }
}

#[inline]
fn padded_length(linear_len: usize) -> usize {
    linear_len.div_ceil(FFT_LENGTH_ROUNDING) * FFT_LENGTH_ROUNDING
}

fn max_magnitude(v: &[f64]) -> f64 {
    v.iter().fold(0.0f64, |m, &x| m.max(x.abs()))
}

/// FFT convolver with cached plans and buffers.
///
/// Plans are cached by the planner per transform length; the complex and
/// scratch buffers grow to the largest request and are reused. Nothing in the
/// cache affects the values of later results.
pub struct FftConvolver {
    planner: FftPlanner<f64>,
    signal: Vec<Complex<f64>>,
    product: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl Default for FftConvolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FftConvolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftConvolver")
            .field("buffer_len", &self.signal.len())
            .finish()
    }
}

impl FftConvolver {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            signal: Vec::new(),
            product: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Full linear convolution of length |a|+|b|−1 (empty if either is empty).
    pub fn convolve(&mut self, a: &[f64], b: &[f64]) -> Vec<f64> {
        if a.is_empty() || b.is_empty() {
            return Vec::new();
        }
        if a.len().min(b.len()) < FFT_MIN_LENGTH {
            return convolve_naive(a, b);
        }
        let mut out = vec![0.0; a.len() + b.len() - 1];
        self.transform_product(a, b, &mut out);
        out
    }

    /// The first `out.len()` outputs of the convolution of
    /// `a[..out.len()]` and `b[..out.len()]`.
    pub fn convolve_same_size(&mut self, a: &[f64], b: &[f64], out: &mut [f64]) {
        let len = out.len();
        debug_assert!(a.len() >= len && b.len() >= len);
        if len < FFT_MIN_LENGTH {
            convolve_same_size_naive(a, b, out);
            return;
        }
        self.transform_product(&a[..len], &b[..len], out);
    }

    /// Writes the first `out.len()` terms of `a * b` computed by FFT.
    fn transform_product(&mut self, a: &[f64], b: &[f64], out: &mut [f64]) {
        let scale_a = max_magnitude(a);
        let scale_b = max_magnitude(b);
        if scale_a == 0.0 || scale_b == 0.0 {
            out.fill(0.0);
            return;
        }

        let fft_len = padded_length(a.len() + b.len() - 1);
        let forward = self.planner.plan_fft_forward(fft_len);
        let inverse = self.planner.plan_fft_inverse(fft_len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        if self.scratch.len() < scratch_len {
            self.scratch.resize(scratch_len, Complex::default());
        }

        let zero = Complex::new(0.0, 0.0);
        self.signal.clear();
        self.signal.resize(fft_len, zero);
        let (inv_a, inv_b) = (1.0 / scale_a, 1.0 / scale_b);
        for (z, &x) in self.signal.iter_mut().zip(a) {
            z.re = x * inv_a;
        }
        for (z, &y) in self.signal.iter_mut().zip(b) {
            z.im = y * inv_b;
        }

        forward.process_with_scratch(&mut self.signal, &mut self.scratch[..scratch_len]);

        // 1/(4i) = -i/4
        let quarter_over_i = Complex::new(0.0, -0.25);
        self.product.clear();
        self.product.resize(fft_len, zero);
        for k in 0..fft_len {
            let zk = self.signal[k];
            let zm = self.signal[(fft_len - k) % fft_len].conj();
            self.product[k] = (zk * zk - zm * zm) * quarter_over_i;
        }

        inverse.process_with_scratch(&mut self.product, &mut self.scratch[..scratch_len]);

        let rescale = scale_a * scale_b / fft_len as f64;
        for (slot, z) in out.iter_mut().zip(&self.product) {
            *slot = z.re * rescale;
        }
    }
}
