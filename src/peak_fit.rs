//! # Sub-sample peak location
//!
//! Locates the maximum of a sampled real signal with sub-sample precision by fitting
//! a parabola through the three samples that bracket the discrete maximum.
//!
//! This is used to re-anchor the waveform time axis so that `t = 0` coincides with
//! the peak of the (2,2) amplitude (the merger).
//!
//! ## Algorithm
//!
//! 1. Find the index `i` of the largest sample.
//! 2. Take the three samples `i-1, i, i+1` (shifted inwards when `i` sits on a boundary).
//! 3. Solve the 3×3 Vandermonde system for `f(τ) = a τ² + b τ + c`, with `τ = t - t[i]`
//!    to keep the system well conditioned.
//! 4. Return the vertex `(t[i] - b / 2a, c - b² / 4a)`.
//!
//! If the fitted parabola is not concave (flat or convex triplet), or its vertex falls
//! outside the three-sample window, the discrete maximum is returned unchanged.

use nalgebra::{Matrix3, Vector3};

use crate::ecc_errors::EccError;

/// Estimate the time and value of the maximum of `values` sampled at `t`.
///
/// Arguments
/// -----------------
/// * `t` – Sample times, same length as `values`.
/// * `values` – Sampled signal.
///
/// Return
/// ----------
/// * `Ok((t_peak, value_peak))` – Vertex of the local parabola, or the discrete maximum
///   when fewer than three samples exist or the triplet is not concave.
/// * `Err(EccError::InvalidWaveform)` if the inputs are empty or of different lengths.
/// * `Err(EccError::PeakFitFailed)` if the Vandermonde system is singular (repeated times).
pub fn peak_via_quadratic_fit(t: &[f64], values: &[f64]) -> Result<(f64, f64), EccError> {
    if t.is_empty() || t.len() != values.len() {
        return Err(EccError::InvalidWaveform(format!(
            "peak fit needs non-empty arrays of equal length (got {} times, {} values)",
            t.len(),
            values.len()
        )));
    }

    let idx = argmax(values);
    if t.len() < 3 {
        return Ok((t[idx], values[idx]));
    }

    // Center the window on idx, shifted inwards at the edges
    let start = idx.saturating_sub(1).min(t.len() - 3);
    let t0 = t[idx];

    let tau = Vector3::new(t[start] - t0, t[start + 1] - t0, t[start + 2] - t0);
    let f = Vector3::new(values[start], values[start + 1], values[start + 2]);

    let vandermonde = Matrix3::new(
        tau[0] * tau[0],
        tau[0],
        1.0,
        tau[1] * tau[1],
        tau[1],
        1.0,
        tau[2] * tau[2],
        tau[2],
        1.0,
    );

    let coeffs = vandermonde.lu().solve(&f).ok_or_else(|| {
        EccError::PeakFitFailed(format!("singular system around index {idx}"))
    })?;
    let (a, b, c) = (coeffs[0], coeffs[1], coeffs[2]);

    if a >= 0.0 || !a.is_finite() {
        return Ok((t0, values[idx]));
    }

    let tau_peak = -b / (2.0 * a);
    // A nearly flat triplet can put the vertex far outside the window
    if !(tau[0]..=tau[2]).contains(&tau_peak) {
        return Ok((t0, values[idx]));
    }
    let value_peak = c - b * b / (4.0 * a);
    Ok((t0 + tau_peak, value_peak))
}

/// Index of the largest finite value (first one on ties).
pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
            if v > best_v {
                (i, v)
            } else {
                (best_i, best_v)
            }
        })
        .0
}
