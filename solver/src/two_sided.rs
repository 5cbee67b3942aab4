//! Two-sided non-crossing probability by Poissonized event sweep.
//!
//! Replace the n uniforms by a Poisson process of intensity n on [0, 1].
//! The constraint `lower[i] ≤ X₍ᵢ₊₁₎ ≤ upper[i]` says that at time t the count
//! N(t) must lie in a band `[floor(t), ceiling(t)]`:
//!
//! - passing `lower[i]` raises the ceiling to i+1 (the (i+1)-th point may now arrive),
//! - passing `upper[i]` raises the floor to i+1 (it must have arrived).
//!
//! The DP column holds Pr[N(t) = k, no violation so far] for k in the band.
//! Between consecutive events the column is convolved with the Poisson(n·Δt)
//! kernel, restricted to the band. At t = 1 the mass at k = n, divided by
//! Pr[Pois(n) = n], is the non-crossing probability of the uniform sample.
//!
//! [`poisson_noncrossing`] exposes the same sweep for a Poisson process of any
//! rate, returning the mass of the whole final column or of one count.
//!
//! [`TwoSidedAlgorithm::Direct`] evaluates each convolution with the explicit
//! double loop (O(n³) total); [`TwoSidedAlgorithm::Fft`] uses the FFT
//! convolver (O(n² log n)).

use tracing::debug;

use crate::boundary::{Boundary, Feasibility, StepBoundary};
use crate::convolution::convolve_same_size_naive;
use crate::error::{CrossprobError, Result};
use crate::types::{TwoSidedAlgorithm, Workspace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    /// A lower bound was passed: one more arrival becomes admissible.
    RaiseCeiling,
    /// An upper bound was passed: one more arrival becomes mandatory.
    RaiseFloor,
    End,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    location: f64,
    kind: EventKind,
}

/// Ceiling raises, then floor raises, stably sorted by location, followed by
/// the end point. On ties a ceiling raise precedes a floor raise.
fn sweep_events(ceiling_steps: &[f64], floor_steps: &[f64]) -> Vec<Event> {
    let mut events: Vec<Event> = ceiling_steps
        .iter()
        .map(|&location| Event {
            location,
            kind: EventKind::RaiseCeiling,
        })
        .chain(floor_steps.iter().map(|&location| Event {
            location,
            kind: EventKind::RaiseFloor,
        }))
        .collect();
    events.sort_by(|a, b| a.location.total_cmp(&b.location));
    events.push(Event {
        location: 1.0,
        kind: EventKind::End,
    });
    events
}

/// Pr[lower[i] ≤ X₍ᵢ₊₁₎ ≤ upper[i] for all i], selecting the algorithm by flag.
pub fn two_sided(lower: &[f64], upper: &[f64], use_fft: bool) -> Result<f64> {
    two_sided_noncrossing(lower, upper, TwoSidedAlgorithm::from_use_fft(use_fft))
}

/// Pr[lower[i] ≤ X₍ᵢ₊₁₎ ≤ upper[i] for all i].
pub fn two_sided_noncrossing(
    lower: &[f64],
    upper: &[f64],
    algorithm: TwoSidedAlgorithm,
) -> Result<f64> {
    let mut ws = Workspace::new();
    two_sided_with(&mut ws, lower, upper, algorithm)
}

/// Same as [`two_sided_noncrossing`], reusing the buffers of `ws`.
pub fn two_sided_with(
    ws: &mut Workspace,
    lower: &[f64],
    upper: &[f64],
    algorithm: TwoSidedAlgorithm,
) -> Result<f64> {
    let boundary = Boundary::two_sided(lower, upper)?;
    match boundary.classify() {
        Feasibility::Permissive => return Ok(1.0),
        Feasibility::Infeasible => return Ok(0.0),
        Feasibility::General => {}
    }
    Ok(solve_boundary(ws, &boundary, algorithm).clamp(0.0, 1.0))
}

/// Pr[g(t) ≤ N(t) ≤ h(t) for all t ∈ [0, 1]] for a Poisson process N of rate
/// `intensity`, with g and h given by their step times (see [`StepBoundary`]).
///
/// With `endpoint = Some(k)` the paths must also finish at N(1) = k; a k that
/// the boundary rules out gives 0.
pub fn poisson_noncrossing(
    intensity: f64,
    lower_steps: &[f64],
    upper_steps: &[f64],
    algorithm: TwoSidedAlgorithm,
    endpoint: Option<usize>,
) -> Result<f64> {
    let mut ws = Workspace::new();
    poisson_noncrossing_with(&mut ws, intensity, lower_steps, upper_steps, algorithm, endpoint)
}

/// Same as [`poisson_noncrossing`], reusing the buffers of `ws`.
pub fn poisson_noncrossing_with(
    ws: &mut Workspace,
    intensity: f64,
    lower_steps: &[f64],
    upper_steps: &[f64],
    algorithm: TwoSidedAlgorithm,
    endpoint: Option<usize>,
) -> Result<f64> {
    if !intensity.is_finite() || intensity < 0.0 {
        return Err(CrossprobError::InvalidRate(intensity));
    }
    let steps = StepBoundary::new(lower_steps, upper_steps)?;
    if steps.crosses() {
        return Ok(0.0);
    }
    let (floor, ceiling) = sweep(ws, intensity, steps.upper_steps(), steps.lower_steps(), algorithm);
    let column = &ws.columns.src()[floor..=ceiling];
    let p = match endpoint {
        None => column.iter().sum::<f64>(),
        Some(k) if (floor..=ceiling).contains(&k) => column[k - floor],
        Some(_) => 0.0,
    };
    Ok(p.clamp(0.0, 1.0))
}

/// Runs the sweep on a normalized boundary. Returns the unclamped probability.
pub(crate) fn solve_boundary(
    ws: &mut Workspace,
    boundary: &Boundary,
    algorithm: TwoSidedAlgorithm,
) -> f64 {
    // X₍ᵢ₊₁₎ ≥ lower[i] delays the (i+1)-th arrival, X₍ᵢ₊₁₎ ≤ upper[i] forces it.
    let n = boundary.n();
    let intensity = n as f64;
    let (floor, _) = sweep(ws, intensity, boundary.lower(), boundary.upper(), algorithm);
    debug_assert_eq!(floor, n);
    ws.columns.src()[n] / ws.pmf.evaluate(intensity, n)
}

/// Propagates Pr[N(t) = k, no violation so far] from t = 0 to t = 1.
///
/// `ceiling_steps[i]` admits count i+1 and `floor_steps[i]` requires it. On
/// return the final column is `ws.columns.src()` and the returned
/// `(floor, ceiling)` is its live band.
fn sweep(
    ws: &mut Workspace,
    intensity: f64,
    ceiling_steps: &[f64],
    floor_steps: &[f64],
    algorithm: TwoSidedAlgorithm,
) -> (usize, usize) {
    let max_count = ceiling_steps.len();
    let events = sweep_events(ceiling_steps, floor_steps);
    debug!(
        max_count,
        intensity,
        algorithm = algorithm.name(),
        events = events.len(),
        "two-sided sweep"
    );

    ws.prepare(max_count);
    let Workspace {
        columns,
        kernel,
        pmf,
        convolver,
        ..
    } = ws;

    columns.src_mut()[0] = 1.0;
    let mut floor = 0usize;
    let mut ceiling = 0usize;
    let mut prev_location = 0.0;

    for event in &events {
        let size = ceiling - floor + 1;
        let lambda = intensity * (event.location - prev_location);
        let kernel = &mut kernel[..size];
        pmf.fill_into(lambda, kernel);

        let (src, dest) = columns.split();
        let band_src = &src[floor..floor + size];
        let band_dest = &mut dest[floor..floor + size];
        match algorithm {
            TwoSidedAlgorithm::Direct => convolve_same_size_naive(kernel, band_src, band_dest),
            TwoSidedAlgorithm::Fft => convolver.convolve_same_size(kernel, band_src, band_dest),
        }

        match event.kind {
            EventKind::RaiseCeiling => {
                ceiling += 1;
                dest[ceiling] = 0.0;
            }
            EventKind::RaiseFloor => {
                dest[floor] = 0.0;
                floor += 1;
            }
            EventKind::End => {}
        }
        prev_location = event.location;
        columns.flip();
    }

    (floor, ceiling)
}
