//! # Eccentricity and mean anomaly from waveform extrema
//!
//! This module implements the measurement pipeline around [`EccDefinition`]:
//!
//! 1. **Extraction** (at construction) – amplitude, phase and frequency of the (2,2) mode on a
//!    merger-origin time grid, see [`ModeData`].
//! 2. **Extrema interpolants** – the injected [`ExtremaFinder`] locates the periastron-like
//!    maxima (`ω_p`) and apastron-like minima (`ω_a`) of the frequency proxy; extrema within
//!    `num_orbits_to_exclude_before_merger` orbits of the merger are dropped, and an
//!    interpolating spline is fitted through `(t, ω22)` at the remaining ones.
//! 3. **Valid window** – `t_min = max(t_peaks[0], t_troughs[0])`,
//!    `t_max = min(t_peaks[-1], t_troughs[-1])`; reference times are kept in `[t_min, t_max)`.
//! 4. **Eccentricity** – `e = (√ω_p − √ω_a) / (√ω_p + √ω_a)` (arXiv:2101.11798, eq. 4).
//! 5. **Mean anomaly** – grows linearly from 0 to 2π between consecutive periastra
//!    (arXiv:2101.11798, eq. 7).
//! 6. **Checks** – extrema separation (orbital phase between extrema) and monotonicity of
//!    `ecc(t)`; both report [`Diagnostic`]s and never alter the numbers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gw_eccentricity::ecc_definition::EccDefinition;
//! use gw_eccentricity::extrema::ExtremaMethod;
//! use gw_eccentricity::params::{ExtraParams, InterpParams};
//! use gw_eccentricity::waveform::WaveformBundle;
//!
//! # let bundle: WaveformBundle = unimplemented!();
//! let ecc_def = EccDefinition::new(
//!     &bundle,
//!     ExtremaMethod::Frequency,
//!     InterpParams::default(),
//!     ExtraParams::default(),
//! )?;
//! let measurement = ecc_def.measure_ecc(&[-5000.0, -4000.0, -3000.0])?;
//! for d in &measurement.diagnostics {
//!     eprintln!("[{}] {d}", d.code());
//! }
//! # Ok::<(), gw_eccentricity::ecc_errors::EccError>(())
//! ```
//!
//! ## See also
//!
//! * [`EccMeasurement`] – output triple and intermediate products.
//! * [`ExtraParams`], [`InterpParams`] – configuration.

use std::f64::consts::PI;

use tracing::debug;

use crate::constants::{
    DPI, ECC_TEST_DT, ECC_TEST_MAX_LEN, MAX_ORB_PHASE_DIFF_FACTOR, MIN_ORB_PHASE_DIFF,
    PHASE22_PER_ORBIT,
};
use crate::diagnostics::Diagnostic;
use crate::ecc_errors::EccError;
use crate::ecc_result::{
    CurveCheck, EccMeasurement, ExtremaInterpolant, ExtremaSeparation, MeasurementContext,
};
use crate::extrema::{ExtremaFinder, ExtremaKind};
use crate::params::{ExtraParams, InterpParams};
use crate::spline::{Extrapolation, InterpolatingSpline};
use crate::waveform::signal::argmin_abs_diff;
use crate::waveform::{ModeData, WaveformBundle};

/// Eccentricity estimator for one waveform.
///
/// Built once per waveform; immutable afterwards. Every call to [`Self::measure_ecc`]
/// recomputes its intermediate products and returns them on the result, so repeated
/// calls with the same input give identical output and the estimator can be shared
/// read-only across threads.
#[derive(Debug)]
pub struct EccDefinition {
    data: ModeData,
    finder: Box<dyn ExtremaFinder>,
    interp_params: InterpParams,
    extra_params: ExtraParams,
}

impl EccDefinition {
    /// Build an estimator from a waveform bundle and an extrema strategy.
    ///
    /// Arguments
    /// -----------------
    /// * `bundle` – Waveform (and optional quasicircular counterpart).
    /// * `finder` – Extrema strategy, e.g. an [`ExtremaMethod`](crate::extrema::ExtremaMethod).
    /// * `interp_params` – Settings of the extrema interpolants.
    /// * `extra_params` – Pipeline settings.
    ///
    /// Return
    /// ----------
    /// * `Err(EccError::InvalidConfiguration)` for invalid parameters (e.g. a negative
    ///   `num_orbits_to_exclude_before_merger`).
    /// * `Err(EccError::MissingZeroEccWaveform)` if `finder` needs residuals and the bundle
    ///   has no quasicircular counterpart.
    /// * Any waveform validation or extraction error.
    pub fn new(
        bundle: &WaveformBundle,
        finder: impl ExtremaFinder + 'static,
        interp_params: InterpParams,
        extra_params: ExtraParams,
    ) -> Result<Self, EccError> {
        interp_params.validate()?;
        extra_params.validate()?;
        finder.check_params(&extra_params.extrema_finding)?;

        if finder.requires_zeroecc() && !bundle.has_zeroecc() {
            return Err(EccError::MissingZeroEccWaveform(finder.name().to_string()));
        }

        let data = ModeData::from_bundle(bundle)?;
        debug!(method = finder.name(), "eccentricity estimator ready");

        Ok(EccDefinition {
            data,
            finder: Box::new(finder),
            interp_params,
            extra_params,
        })
    }

    /// Derived waveform quantities.
    pub fn data(&self) -> &ModeData {
        &self.data
    }

    pub fn interp_params(&self) -> &InterpParams {
        &self.interp_params
    }

    pub fn extra_params(&self) -> &ExtraParams {
        &self.extra_params
    }

    /// Name of the injected extrema strategy.
    pub fn method_name(&self) -> &str {
        self.finder.name()
    }

    /// Raw extrema of `kind` from the injected strategy, checked against the contract
    /// (valid, strictly increasing indices).
    pub fn find_extrema(&self, kind: ExtremaKind) -> Result<Vec<usize>, EccError> {
        let idx = self
            .finder
            .find_extrema(&self.data, kind, &self.extra_params.extrema_finding)?;

        let n = self.data.t().len();
        if let Some(&bad) = idx.iter().find(|&&i| i >= n) {
            return Err(EccError::InvalidExtrema(
                self.finder.name().to_string(),
                format!("index {bad} out of range for {n} samples"),
            ));
        }
        if idx.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EccError::InvalidExtrema(
                self.finder.name().to_string(),
                "indices are not strictly increasing".into(),
            ));
        }
        Ok(idx)
    }

    /// Index of the last sample kept when `n_orbits` orbits before merger are excluded.
    ///
    /// The merger is the sample closest to `t = 0`; one orbit is 4π of (2,2) phase.
    fn last_index_before_merger(&self, n_orbits: f64) -> usize {
        let merger_idx = argmin_abs_diff(self.data.t(), 0.0);
        let target = self.data.phase22()[merger_idx] - PHASE22_PER_ORBIT * n_orbits;
        argmin_abs_diff(self.data.phase22(), target)
    }

    /// Interpolant of `ω22` through the extrema of `kind`.
    ///
    /// Extrema later than `num_orbits_to_exclude_before_merger` orbits before merger are
    /// dropped first (when that setting is not `None`).
    ///
    /// Return
    /// ----------
    /// * `Ok(ExtremaInterpolant)` – spline and the indices it was built from.
    /// * `Err(EccError::InsufficientExtrema)` – fewer than two extrema remain.
    /// * Spline construction errors (bad weights, boundary box, non-finite values).
    pub fn interp_extrema(&self, kind: ExtremaKind) -> Result<ExtremaInterpolant, EccError> {
        let mut indices = self.find_extrema(kind)?;
        let n_found = indices.len();

        if let Some(n_orbits) = self.extra_params.num_orbits_to_exclude_before_merger {
            let cut = self.last_index_before_merger(n_orbits);
            indices.retain(|&i| i <= cut);
        }
        debug!(
            %kind,
            found = n_found,
            kept = indices.len(),
            "extrema after merger-proximity cut"
        );

        if indices.len() < 2 {
            return Err(EccError::InsufficientExtrema {
                kind,
                found: indices.len(),
            });
        }

        let t = self.data.t();
        let omega = self.data.omega22();
        let t_ext: Vec<f64> = indices.iter().map(|&i| t[i]).collect();
        let omega_ext: Vec<f64> = indices.iter().map(|&i| omega[i]).collect();
        let spline = InterpolatingSpline::new(&t_ext, &omega_ext, &self.interp_params)?;

        Ok(ExtremaInterpolant { spline, indices })
    }

    /// Check the orbital phase elapsed between consecutive extrema.
    ///
    /// Orbital phase is half the (2,2) phase. Raises
    /// * [`Diagnostic::ExtremaTooClose`] if a difference is below `min_orb_phase_diff`
    ///   (a spurious extremum may have been picked up),
    /// * [`Diagnostic::PhaseShiftCloserToPi`] if a difference is closer to π than to 2π,
    /// * [`Diagnostic::ExtremaTooFar`] if a difference exceeds `max_orb_phase_diff_factor`
    ///   times the previous one (an extremum may have been missed).
    ///
    /// Arguments
    /// -----------------
    /// * `indices` – Extrema indices.
    /// * `kind` – Used to label the diagnostics.
    /// * `max_orb_phase_diff_factor` – Usually [`MAX_ORB_PHASE_DIFF_FACTOR`] (1.5).
    /// * `min_orb_phase_diff` – Usually [`MIN_ORB_PHASE_DIFF`] (π).
    pub fn check_extrema_separation(
        &self,
        indices: &[usize],
        kind: ExtremaKind,
        max_orb_phase_diff_factor: f64,
        min_orb_phase_diff: f64,
    ) -> ExtremaSeparation {
        let phase22 = self.data.phase22();
        let t = self.data.t();

        let orb_phase_diff: Vec<f64> = indices
            .windows(2)
            .map(|w| (phase22[w[1]] - phase22[w[0]]) / 2.0)
            .collect();
        // Times of the later extremum of each pair
        let t_at_extrema: Vec<f64> = indices.iter().skip(1).map(|&i| t[i]).collect();

        let mut diagnostics = Vec::new();

        let too_close_times: Vec<f64> = orb_phase_diff
            .iter()
            .zip(&t_at_extrema)
            .filter(|(&d, _)| d < min_orb_phase_diff)
            .map(|(_, &ti)| ti)
            .collect();
        if !too_close_times.is_empty() {
            let min_diff = orb_phase_diff.iter().copied().fold(f64::INFINITY, f64::min);
            diagnostics.push(
                Diagnostic::ExtremaTooClose {
                    kind,
                    min_orb_phase_diff: min_diff,
                    times: too_close_times,
                }
                .emit(),
            );
        }

        if orb_phase_diff
            .iter()
            .any(|&d| (d - PI).abs() < (d - DPI).abs())
        {
            diagnostics.push(Diagnostic::PhaseShiftCloserToPi { kind }.emit());
        }

        let mut orb_phase_diff_ratio = Vec::with_capacity(orb_phase_diff.len());
        if !orb_phase_diff.is_empty() {
            orb_phase_diff_ratio.push(0.0);
            orb_phase_diff_ratio.extend(orb_phase_diff.windows(2).map(|w| w[1] / w[0]));
        }

        let too_far_times: Vec<f64> = orb_phase_diff_ratio
            .iter()
            .zip(&t_at_extrema)
            .filter(|(&r, _)| r > max_orb_phase_diff_factor)
            .map(|(_, &ti)| ti)
            .collect();
        if !too_far_times.is_empty() {
            let max_diff = orb_phase_diff
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            diagnostics.push(
                Diagnostic::ExtremaTooFar {
                    kind,
                    max_orb_phase_diff: max_diff,
                    times: too_far_times,
                }
                .emit(),
            );
        }

        ExtremaSeparation {
            orb_phase_diff,
            orb_phase_diff_ratio,
            diagnostics,
        }
    }

    /// Measure eccentricity and mean anomaly at the reference times `tref_in`.
    ///
    /// Only the reference times in `[t_min, t_max)` are measured, where
    /// `t_min = max(t_peaks[0], t_troughs[0])` and `t_max = min(t_peaks[-1], t_troughs[-1])`:
    /// this keeps both frequency interpolants inside their domain, and `t_max` itself is
    /// excluded because the mean anomaly needs a periastron strictly after the reference time.
    /// When more than one time is measured, they must be strictly increasing.
    ///
    /// Arguments
    /// -----------------
    /// * `tref_in` – Requested reference times (merger at `t = 0`).
    ///
    /// Return
    /// ----------
    /// * `Ok(EccMeasurement)` with `tref_out ⊂ tref_in`.
    /// * `Err(EccError::InsufficientExtrema)` – fewer than two peaks or troughs.
    /// * `Err(EccError::ReferenceTimeAfterWindow)` – nothing kept and the last requested
    ///   time is after `t_max`.
    /// * `Err(EccError::ReferenceTimeBeforeWindow)` – nothing kept and the first requested
    ///   time is before `t_min`.
    /// * `Err(EccError::NoValidReferenceTime)` – nothing kept otherwise.
    /// * `Err(EccError::ReferenceTimeNotBracketed)` – a kept time is not between two peaks.
    pub fn measure_ecc(&self, tref_in: &[f64]) -> Result<EccMeasurement, EccError> {
        let peaks = self.interp_extrema(ExtremaKind::Maxima)?;
        let troughs = self.interp_extrema(ExtremaKind::Minima)?;

        let t = self.data.t();
        let t_peaks: Vec<f64> = peaks.indices.iter().map(|&i| t[i]).collect();
        let t_troughs: Vec<f64> = troughs.indices.iter().map(|&i| t[i]).collect();

        // Both sets hold at least two elements at this point
        let t_max = t_peaks[t_peaks.len() - 1].min(t_troughs[t_troughs.len() - 1]);
        let t_min = t_peaks[0].max(t_troughs[0]);
        debug!(t_min, t_max, "valid reference time window");

        let tref_out: Vec<f64> = tref_in
            .iter()
            .copied()
            .filter(|&x| x >= t_min && x < t_max)
            .collect();

        if tref_out.is_empty() {
            return Err(match (tref_in.first(), tref_in.last()) {
                (_, Some(&last)) if last > t_max => EccError::ReferenceTimeAfterWindow { t_max },
                (Some(&first), _) if first < t_min => {
                    EccError::ReferenceTimeBeforeWindow { t_min }
                }
                _ => EccError::NoValidReferenceTime,
            });
        }

        let peaks_separation = self.check_extrema_separation(
            &peaks.indices,
            ExtremaKind::Maxima,
            MAX_ORB_PHASE_DIFF_FACTOR,
            MIN_ORB_PHASE_DIFF,
        );
        let troughs_separation = self.check_extrema_separation(
            &troughs.indices,
            ExtremaKind::Minima,
            MAX_ORB_PHASE_DIFF_FACTOR,
            MIN_ORB_PHASE_DIFF,
        );

        if tref_out[0] < t_peaks[0] || tref_out[tref_out.len() - 1] >= t_peaks[t_peaks.len() - 1]
        {
            return Err(EccError::ReferenceTimeNotBracketed);
        }

        let omega_peak_at_tref_out = peaks.spline.evaluate_many(&tref_out)?;
        let omega_trough_at_tref_out = troughs.spline.evaluate_many(&tref_out)?;

        let ecc_ref: Vec<f64> = omega_peak_at_tref_out
            .iter()
            .zip(&omega_trough_at_tref_out)
            .map(|(&wp, &wa)| eccentricity_from_omegas(wp, wa))
            .collect();

        let mean_ano_ref = tref_out
            .iter()
            .map(|&time| mean_anomaly(time, &t_peaks).ok_or(EccError::ReferenceTimeNotBracketed))
            .collect::<Result<Vec<f64>, EccError>>()?;

        let mut diagnostics = Vec::new();
        diagnostics.extend(peaks_separation.diagnostics.iter().cloned());
        diagnostics.extend(troughs_separation.diagnostics.iter().cloned());

        let negative_times: Vec<f64> = tref_out
            .iter()
            .zip(&ecc_ref)
            .filter(|(_, &e)| e < 0.0)
            .map(|(&ti, _)| ti)
            .collect();
        if !negative_times.is_empty() {
            diagnostics.push(
                Diagnostic::NegativeEccentricity {
                    times: negative_times,
                }
                .emit(),
            );
        }

        let curve_check = if tref_out.len() > 1 {
            let check = self.check_monotonicity_and_convexity(&tref_out, &ecc_ref, false, None)?;
            diagnostics.extend(check.diagnostics.iter().cloned());
            Some(check)
        } else {
            None
        };

        Ok(EccMeasurement {
            tref_out,
            ecc_ref,
            mean_ano_ref,
            context: MeasurementContext {
                peaks,
                troughs,
                t_min,
                t_max,
                omega_peak_at_tref_out,
                omega_trough_at_tref_out,
                peaks_separation,
                troughs_separation,
                curve_check,
            },
            diagnostics,
        })
    }

    /// Measure at a single reference time and return `(tref, ecc, mean_ano)`.
    pub fn measure_ecc_at(&self, tref: f64) -> Result<(f64, f64, f64), EccError> {
        let m = self.measure_ecc(&[tref])?;
        // A single in-window time always yields exactly one measurement
        debug_assert_eq!(m.tref_out.len(), 1);
        Ok((m.tref_out[0], m.ecc_ref[0], m.mean_ano_ref[0]))
    }

    /// Check that `ecc(t)` decreases (and optionally that it is concave down).
    ///
    /// A cubic interpolating spline is fitted through `(tref_out, ecc_ref)` and its
    /// derivatives are sampled on `t_for_ecc_test`, or, when `None`, on a grid of step
    /// [`ECC_TEST_DT`] from `tref_out[0]` up to (excluding) `tref_out[-1]`.
    ///
    /// Diagnostics
    /// -----------------
    /// * [`Diagnostic::OversizedTestGrid`] – default grid longer than [`ECC_TEST_MAX_LEN`]
    ///   (only with `debug` enabled).
    /// * [`Diagnostic::NonMonotonicEccentricity`] – some `d ecc / dt > 0`.
    /// * [`Diagnostic::ConcaveEccentricity`] – some `d² ecc / dt² > 0` (with `check_convexity`).
    ///
    /// Return
    /// ----------
    /// * `Ok(CurveCheck)` with the sampled derivatives.
    /// * Spline construction errors (fewer than two points, times not strictly increasing).
    pub fn check_monotonicity_and_convexity(
        &self,
        tref_out: &[f64],
        ecc_ref: &[f64],
        check_convexity: bool,
        t_for_ecc_test: Option<&[f64]>,
    ) -> Result<CurveCheck, EccError> {
        let spline =
            InterpolatingSpline::with_degree(tref_out, ecc_ref, 3, Extrapolation::Extrapolate)?;

        let mut diagnostics = Vec::new();
        let t_for_ecc_test = match t_for_ecc_test {
            Some(grid) => grid.to_vec(),
            None => {
                let start = tref_out[0];
                let stop = tref_out[tref_out.len() - 1];
                let len = ((stop - start) / ECC_TEST_DT).ceil().max(0.0) as usize;
                if self.extra_params.debug && len > ECC_TEST_MAX_LEN {
                    diagnostics.push(Diagnostic::OversizedTestGrid { len }.emit());
                }
                (0..len).map(|i| start + i as f64 * ECC_TEST_DT).collect()
            }
        };

        let decc_dt = spline.derivative_many(&t_for_ecc_test, 1)?;
        if decc_dt.iter().any(|&d| d > 0.0) {
            diagnostics.push(Diagnostic::NonMonotonicEccentricity.emit());
        }

        let d2ecc_dt = if check_convexity {
            let d2 = spline.derivative_many(&t_for_ecc_test, 2)?;
            if d2.iter().any(|&d| d > 0.0) {
                diagnostics.push(Diagnostic::ConcaveEccentricity.emit());
            }
            Some(d2)
        } else {
            None
        };

        Ok(CurveCheck {
            t_for_ecc_test,
            decc_dt,
            d2ecc_dt,
            diagnostics,
        })
    }
}

/// Eccentricity from the frequencies interpolated through periastra (`omega_p`) and
/// apastra (`omega_a`) at the same time.
///
/// `0` when both are equal; in `(0, 1)` when `omega_p > omega_a > 0`; negative when the
/// extrema are mislabelled (`omega_p < omega_a`).
pub fn eccentricity_from_omegas(omega_p: f64, omega_a: f64) -> f64 {
    let (sp, sa) = (omega_p.sqrt(), omega_a.sqrt());
    (sp - sa) / (sp + sa)
}

/// Mean anomaly at `time`, growing linearly from 0 at a periastron to 2π at the next one.
///
/// Arguments
/// -----------------
/// * `time` – Reference time.
/// * `t_peaks` – Increasing periastron times.
///
/// Return
/// ----------
/// * `None` if no periastron is at or before `time`, or none strictly follows it.
pub fn mean_anomaly(time: f64, t_peaks: &[f64]) -> Option<f64> {
    let n_before = t_peaks.partition_point(|&tp| tp <= time);
    let idx_last = n_before.checked_sub(1)?;
    let t_last = t_peaks[idx_last];
    let t_next = *t_peaks.get(idx_last + 1)?;
    Some(DPI * (time - t_last) / (t_next - t_last))
}
