//! Core data structures: algorithm selectors, DP columns and the per-thread workspace.
//!
//! The central type is [`Workspace`], which owns every buffer a solve needs:
//! two ping-pong DP columns, the block-local minibuffer of the one-sided
//! solver, the Poisson table and the FFT convolver. A top-level call builds a
//! fresh one; batch drivers keep one per worker thread and pass it to the
//! `*_with` entry points. Nothing is shared between threads.

use serde::{Deserialize, Serialize};

use crate::convolution::FftConvolver;
use crate::poisson::PoissonPmf;

/// Two-sided solver algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoSidedAlgorithm {
    /// Explicit convolution sums, O(n³).
    Direct,
    /// FFT convolutions, O(n² log n).
    Fft,
}

impl TwoSidedAlgorithm {
    pub fn from_use_fft(use_fft: bool) -> Self {
        if use_fft {
            TwoSidedAlgorithm::Fft
        } else {
            TwoSidedAlgorithm::Direct
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TwoSidedAlgorithm::Direct => "direct",
            TwoSidedAlgorithm::Fft => "fft",
        }
    }
}

/// One-sided solver variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneSidedVariant {
    /// Renewal recursion over first-passage probabilities. Loses precision for large n.
    Reference,
    /// Blocked Poisson DP, stable into the hundreds of thousands.
    New,
}

impl OneSidedVariant {
    pub fn name(self) -> &'static str {
        match self {
            OneSidedVariant::Reference => "reference",
            OneSidedVariant::New => "new",
        }
    }
}

/// Two equally sized buffers used alternately as source and destination.
#[derive(Debug, Default, Clone)]
pub struct PingPong {
    buffers: [Vec<f64>; 2],
    src_index: usize,
}

impl PingPong {
    /// Resize both buffers to `len` and zero them.
    pub fn reset(&mut self, len: usize) {
        for buf in &mut self.buffers {
            buf.clear();
            buf.resize(len, 0.0);
        }
        self.src_index = 0;
    }

    pub fn len(&self) -> usize {
        self.buffers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn src(&self) -> &[f64] {
        &self.buffers[self.src_index]
    }

    pub fn src_mut(&mut self) -> &mut [f64] {
        &mut self.buffers[self.src_index]
    }

    pub fn dest_mut(&mut self) -> &mut [f64] {
        &mut self.buffers[1 - self.src_index]
    }

    /// Source for reading and destination for writing at the same time.
    pub fn split(&mut self) -> (&mut [f64], &mut [f64]) {
        let [first, second] = &mut self.buffers;
        if self.src_index == 0 {
            (first.as_mut_slice(), second.as_mut_slice())
        } else {
            (second.as_mut_slice(), first.as_mut_slice())
        }
    }

    /// Make the destination the new source.
    pub fn flip(&mut self) {
        self.src_index = 1 - self.src_index;
    }
}

/// Buffers for one solve at a time. Reusing a workspace never changes results.
#[derive(Debug, Default)]
pub struct Workspace {
    pub(crate) columns: PingPong,
    pub(crate) mini: PingPong,
    pub(crate) scratch: Vec<f64>,
    pub(crate) kernel: Vec<f64>,
    pub(crate) pmf: PoissonPmf,
    pub(crate) convolver: FftConvolver,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the columns for sample size `n` and clear every buffer.
    pub(crate) fn prepare(&mut self, n: usize) {
        self.columns.reset(n + 1);
        self.mini.reset(0);
        self.scratch.clear();
        self.scratch.resize(n + 1, 0.0);
        self.kernel.clear();
        self.kernel.resize(n + 1, 0.0);
        self.pmf.reserve(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_pong_flip() {
        let mut pp = PingPong::default();
        pp.reset(3);
        pp.src_mut()[0] = 1.0;
        {
            let (src, dest) = pp.split();
            dest[1] = src[0] + 1.0;
        }
        pp.flip();
        assert_eq!(pp.src(), &[0.0, 2.0, 0.0]);
        assert_eq!(pp.dest_mut(), &[1.0, 0.0, 0.0]);
        pp.reset(2);
        assert_eq!(pp.src(), &[0.0, 0.0]);
        assert_eq!(pp.len(), 2);
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(TwoSidedAlgorithm::from_use_fft(true), TwoSidedAlgorithm::Fft);
        assert_eq!(TwoSidedAlgorithm::Direct.name(), "direct");
        assert_eq!(OneSidedVariant::New.name(), "new");
        let v: OneSidedVariant = serde_json::from_str("\"reference\"").unwrap();
        assert_eq!(v, OneSidedVariant::Reference);
    }
}
