//! # Eccentricity measurement results
//!
//! [`EccMeasurement`] is returned by
//! [`EccDefinition::measure_ecc`](crate::ecc_definition::EccDefinition::measure_ecc). It carries
//! the aligned output triple `(tref_out, ecc_ref, mean_ano_ref)` and, in a
//! [`MeasurementContext`], every intermediate product of the call (extrema locations,
//! interpolants, interpolated frequencies, separation and curve checks) so that plotting or
//! triage tools can reuse them without recomputation.
//!
//! A measurement is computed fresh by each call; nothing is cached on the estimator.

use std::fmt;

use crate::diagnostics::Diagnostic;
use crate::spline::InterpolatingSpline;

/// Interpolant through the extrema of one kind, with the indices it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremaInterpolant {
    pub spline: InterpolatingSpline,
    /// Indices into the waveform time grid, after the merger-proximity cut.
    pub indices: Vec<usize>,
}

/// Output of the extrema separation check.
///
/// Fields
/// -----------------
/// * `orb_phase_diff` – Orbital phase elapsed between consecutive extrema.
/// * `orb_phase_diff_ratio` – Ratio of each difference to the previous one, left-padded with
///   `0` so that it has the same length as `orb_phase_diff`.
/// * `diagnostics` – Findings raised by the check.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtremaSeparation {
    pub orb_phase_diff: Vec<f64>,
    pub orb_phase_diff_ratio: Vec<f64>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Output of the monotonicity/convexity check of `ecc(t)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurveCheck {
    pub t_for_ecc_test: Vec<f64>,
    pub decc_dt: Vec<f64>,
    /// Only present when convexity was checked.
    pub d2ecc_dt: Option<Vec<f64>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Intermediate products of one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementContext {
    pub peaks: ExtremaInterpolant,
    pub troughs: ExtremaInterpolant,
    /// Lower bound of the valid window, `max(first peak time, first trough time)`.
    pub t_min: f64,
    /// Upper bound (excluded) of the valid window, `min(last peak time, last trough time)`.
    pub t_max: f64,
    pub omega_peak_at_tref_out: Vec<f64>,
    pub omega_trough_at_tref_out: Vec<f64>,
    pub peaks_separation: ExtremaSeparation,
    pub troughs_separation: ExtremaSeparation,
    /// Absent when a single reference time was measured.
    pub curve_check: Option<CurveCheck>,
}

/// Eccentricity and mean anomaly at the reference times that fell in the valid window.
///
/// Fields
/// -----------------
/// * `tref_out` – Reference times kept, in input order.
/// * `ecc_ref` – Eccentricity at `tref_out`.
/// * `mean_ano_ref` – Mean anomaly in `[0, 2π)` at `tref_out`.
/// * `context` – Intermediate products, see [`MeasurementContext`].
/// * `diagnostics` – Every non-fatal finding of the call, in the order raised.
#[derive(Debug, Clone, PartialEq)]
pub struct EccMeasurement {
    pub tref_out: Vec<f64>,
    pub ecc_ref: Vec<f64>,
    pub mean_ano_ref: Vec<f64>,
    pub context: MeasurementContext,
    pub diagnostics: Vec<Diagnostic>,
}

impl EccMeasurement {
    /// Number of measured reference times.
    pub fn len(&self) -> usize {
        self.tref_out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tref_out.is_empty()
    }

    /// `(tref, ecc, mean_ano)` when exactly one reference time was measured.
    pub fn scalar(&self) -> Option<(f64, f64, f64)> {
        match (
            self.tref_out.as_slice(),
            self.ecc_ref.as_slice(),
            self.mean_ano_ref.as_slice(),
        ) {
            ([t], [e], [m]) => Some((*t, *e, *m)),
            _ => None,
        }
    }

    /// True when a diagnostic with the given code was raised.
    pub fn has_diagnostic(&self, code: &str) -> bool {
        crate::diagnostics::has_code(&self.diagnostics, code)
    }
}

impl fmt::Display for EccMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>16} {:>12} {:>12}",
            "tref", "ecc", "mean_ano"
        )?;
        for ((t, e), m) in self
            .tref_out
            .iter()
            .zip(&self.ecc_ref)
            .zip(&self.mean_ano_ref)
        {
            writeln!(f, "{t:>16.4} {e:>12.6} {m:>12.6}")?;
        }
        if !self.diagnostics.is_empty() {
            writeln!(f, "diagnostics:")?;
            for d in &self.diagnostics {
                writeln!(f, "  [{}] {d}", d.code())?;
            }
        }
        Ok(())
    }
}
