//! Numerical helpers over sampled sequences: phase unwrapping and finite-difference
//! derivatives on non-uniform grids.

use std::f64::consts::PI;

use crate::constants::DPI;

/// Unwrap a phase sequence by adding multiples of 2π wherever two consecutive samples
/// jump by more than π.
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phase.len());
    let Some(&first) = phase.first() else {
        return out;
    };
    out.push(first);

    let mut correction = 0.0;
    for w in phase.windows(2) {
        let d = w[1] - w[0];
        let mut dd = (d + PI).rem_euclid(DPI) - PI;
        if dd == -PI && d > 0.0 {
            dd = PI;
        }
        if d.abs() >= PI {
            correction += dd - d;
        }
        out.push(w[1] + correction);
    }
    out
}

/// Derivative of `f` with respect to `t`.
///
/// Second-order accurate central differences in the interior (valid on non-uniform
/// grids) and first-order one-sided differences at both ends.
///
/// Return
/// ----------
/// * A vector of the same length as `f`; all zeros when fewer than two samples exist.
pub fn gradient(f: &[f64], t: &[f64]) -> Vec<f64> {
    let n = f.len().min(t.len());
    if n < 2 {
        return vec![0.0; n];
    }

    let mut out = vec![0.0; n];
    out[0] = (f[1] - f[0]) / (t[1] - t[0]);
    out[n - 1] = (f[n - 1] - f[n - 2]) / (t[n - 1] - t[n - 2]);

    for i in 1..n - 1 {
        let hs = t[i] - t[i - 1];
        let hd = t[i + 1] - t[i];
        out[i] = (hs * hs * f[i + 1] + (hd * hd - hs * hs) * f[i] - hd * hd * f[i - 1])
            / (hs * hd * (hd + hs));
    }
    out
}

/// Index of the sample closest to `target`.
pub(crate) fn argmin_abs_diff(values: &[f64], target: f64) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best_i, best_d), (i, &v)| {
            let d = (v - target).abs();
            if d < best_d {
                (i, d)
            } else {
                (best_i, best_d)
            }
        })
        .0
}
