//! # Waveform data and (2,2)-mode derived quantities
//!
//! This module holds the input container ([`WaveformBundle`]) and the quantities derived
//! from it at estimator construction ([`ModeData`]).
//!
//! ## Derived quantities
//!
//! From the complex (2,2) mode `h22(t)`:
//!
//! - `amp22 = |h22|`
//! - `phase22 = -unwrap(arg h22)` (negated so that the frequency is positive for the
//!   usual `h22 ∝ e^{-iφ}` convention)
//! - `omega22 = d phase22 / dt`
//!
//! The time axis is shifted so that `t = 0` sits on the amplitude peak, located to
//! sub-sample precision with [`peak_via_quadratic_fit`]. Every "time before merger"
//! computation downstream relies on this origin.
//!
//! ## Quasicircular counterpart
//!
//! When the bundle carries `t_zeroecc`/`hlm_zeroecc`, the same derivation is applied to it
//! independently (including its own merger re-origin). Its amplitude and frequency are then
//! interpolated onto the primary grid and subtracted, giving the residual amplitude and
//! frequency used by the residual extrema methods.
//!
//! ## See also
//!
//! * [`ExtremaFinder`](crate::extrema::ExtremaFinder) – consumes [`ModeData`] to locate extrema.
//! * [`EccDefinition`](crate::ecc_definition::EccDefinition) – builds a [`ModeData`] at construction.

pub mod signal;

use num_complex::Complex64;
use tracing::debug;

use crate::constants::{ModeDict, MODE_22};
use crate::ecc_errors::EccError;
use crate::peak_fit::peak_via_quadratic_fit;
use crate::spline::{Extrapolation, InterpolatingSpline};
use signal::{gradient, unwrap_phase};

/// Minimum number of samples of a usable waveform.
const MIN_SAMPLES: usize = 3;

/// In-memory waveform: a time grid and the complex modes sampled on it, with an optional
/// quasicircular counterpart on its own grid.
///
/// Fields
/// -----------------
/// * `t` – Strictly increasing sample times.
/// * `hlm` – Mode samples keyed by `(l, m)`, each aligned with `t`. Must contain `(2, 2)`.
/// * `t_zeroecc`, `hlm_zeroecc` – Optional quasicircular counterpart, same contract.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformBundle {
    pub t: Vec<f64>,
    pub hlm: ModeDict,
    pub t_zeroecc: Option<Vec<f64>>,
    pub hlm_zeroecc: Option<ModeDict>,
}

impl WaveformBundle {
    /// Build a bundle without quasicircular counterpart.
    pub fn new(t: Vec<f64>, hlm: ModeDict) -> Self {
        WaveformBundle {
            t,
            hlm,
            t_zeroecc: None,
            hlm_zeroecc: None,
        }
    }

    /// Attach the quasicircular counterpart.
    pub fn with_zeroecc(mut self, t_zeroecc: Vec<f64>, hlm_zeroecc: ModeDict) -> Self {
        self.t_zeroecc = Some(t_zeroecc);
        self.hlm_zeroecc = Some(hlm_zeroecc);
        self
    }

    /// True when both halves of the quasicircular counterpart are present.
    pub fn has_zeroecc(&self) -> bool {
        self.t_zeroecc.is_some() && self.hlm_zeroecc.is_some()
    }

    /// Check the shape contract of the primary waveform and of the counterpart, if any.
    ///
    /// Return
    /// ----------
    /// * `Err(EccError::InvalidWaveform)` for a grid shorter than 3 samples, a non strictly
    ///   increasing grid, a mode not aligned with its grid, or only one half of the
    ///   quasicircular counterpart.
    /// * `Err(EccError::MissingMode(2, 2))` when the (2,2) mode is absent.
    pub fn validate(&self) -> Result<(), EccError> {
        validate_grid(&self.t, &self.hlm, "t")?;
        match (&self.t_zeroecc, &self.hlm_zeroecc) {
            (Some(t), Some(hlm)) => validate_grid(t, hlm, "t_zeroecc"),
            (None, None) => Ok(()),
            _ => Err(EccError::InvalidWaveform(
                "t_zeroecc and hlm_zeroecc must be given together".into(),
            )),
        }
    }
}

fn validate_grid(t: &[f64], hlm: &ModeDict, label: &str) -> Result<(), EccError> {
    if t.len() < MIN_SAMPLES {
        return Err(EccError::InvalidWaveform(format!(
            "{label} needs at least {MIN_SAMPLES} samples, got {}",
            t.len()
        )));
    }
    if t
        .windows(2)
        .any(|w| w[1].partial_cmp(&w[0]) != Some(std::cmp::Ordering::Greater))
    {
        return Err(EccError::InvalidWaveform(format!(
            "{label} must be strictly increasing"
        )));
    }
    if !hlm.contains_key(&MODE_22) {
        return Err(EccError::MissingMode(MODE_22.0, MODE_22.1));
    }
    for ((l, m), mode) in hlm {
        if mode.len() != t.len() {
            return Err(EccError::InvalidWaveform(format!(
                "mode ({l}, {m}) has {} samples but {label} has {}",
                mode.len(),
                t.len()
            )));
        }
    }
    Ok(())
}

/// Amplitude, phase and frequency of one (2,2) mode on its merger-origin grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeQuantities {
    /// Time grid shifted so that the amplitude peak is at `t = 0`.
    pub t: Vec<f64>,
    /// Time of the amplitude peak on the input grid (the applied shift).
    pub t_merger_input: f64,
    pub amp22: Vec<f64>,
    pub phase22: Vec<f64>,
    pub omega22: Vec<f64>,
}

impl ModeQuantities {
    /// Derive amplitude, unwrapped negated phase and frequency from `h22` sampled on `t`.
    pub fn from_h22(t: &[f64], h22: &[Complex64]) -> Result<Self, EccError> {
        let amp22: Vec<f64> = h22.iter().map(|h| h.norm()).collect();
        let (t_peak, _) = peak_via_quadratic_fit(t, &amp22)?;
        let t_shifted: Vec<f64> = t.iter().map(|ti| ti - t_peak).collect();

        let phase22: Vec<f64> = unwrap_phase(&h22.iter().map(|h| h.arg()).collect::<Vec<_>>())
            .into_iter()
            .map(|p| -p)
            .collect();
        let omega22 = gradient(&phase22, &t_shifted);

        Ok(ModeQuantities {
            t: t_shifted,
            t_merger_input: t_peak,
            amp22,
            phase22,
            omega22,
        })
    }
}

/// Quasicircular counterpart and residuals with respect to it.
///
/// Fields
/// -----------------
/// * `zeroecc` – Quantities of the quasicircular (2,2) mode on its own merger-origin grid.
/// * `amp22_zeroecc_interp`, `omega22_zeroecc_interp` – Quasicircular amplitude and
///   frequency interpolated onto the primary grid.
/// * `res_amp22`, `res_omega22` – Primary minus interpolated quasicircular values.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualData {
    pub zeroecc: ModeQuantities,
    pub amp22_zeroecc_interp: Vec<f64>,
    pub omega22_zeroecc_interp: Vec<f64>,
    pub res_amp22: Vec<f64>,
    pub res_omega22: Vec<f64>,
}

/// Every quantity the extrema finders and the estimator read from the waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeData {
    pub mode: ModeQuantities,
    pub residual: Option<ResidualData>,
}

impl ModeData {
    /// Run the extraction on a validated bundle.
    ///
    /// Arguments
    /// -----------------
    /// * `bundle` – Input waveform; validated here.
    ///
    /// Return
    /// ----------
    /// * `Ok(ModeData)` with residuals when the bundle carries a quasicircular counterpart.
    /// * Any validation or peak-fit error.
    pub fn from_bundle(bundle: &WaveformBundle) -> Result<Self, EccError> {
        bundle.validate()?;

        let h22 = bundle
            .hlm
            .get(&MODE_22)
            .ok_or(EccError::MissingMode(MODE_22.0, MODE_22.1))?;
        let mode = ModeQuantities::from_h22(&bundle.t, h22)?;
        debug!(
            n_samples = mode.t.len(),
            t_merger = mode.t_merger_input,
            "extracted (2,2) amplitude, phase and frequency"
        );

        let residual = match (&bundle.t_zeroecc, &bundle.hlm_zeroecc) {
            (Some(t_zeroecc), Some(hlm_zeroecc)) => {
                let h22_zeroecc = hlm_zeroecc
                    .get(&MODE_22)
                    .ok_or(EccError::MissingMode(MODE_22.0, MODE_22.1))?;
                Some(compute_residuals(&mode, t_zeroecc, h22_zeroecc)?)
            }
            _ => None,
        };

        Ok(ModeData { mode, residual })
    }

    pub fn t(&self) -> &[f64] {
        &self.mode.t
    }

    pub fn amp22(&self) -> &[f64] {
        &self.mode.amp22
    }

    pub fn phase22(&self) -> &[f64] {
        &self.mode.phase22
    }

    pub fn omega22(&self) -> &[f64] {
        &self.mode.omega22
    }

    /// Residual amplitude, if a quasicircular counterpart was provided.
    pub fn res_amp22(&self) -> Option<&[f64]> {
        self.residual.as_ref().map(|r| r.res_amp22.as_slice())
    }

    /// Residual frequency, if a quasicircular counterpart was provided.
    pub fn res_omega22(&self) -> Option<&[f64]> {
        self.residual.as_ref().map(|r| r.res_omega22.as_slice())
    }
}

fn compute_residuals(
    mode: &ModeQuantities,
    t_zeroecc: &[f64],
    h22_zeroecc: &[Complex64],
) -> Result<ResidualData, EccError> {
    let zeroecc = ModeQuantities::from_h22(t_zeroecc, h22_zeroecc)?;

    let amp_spline =
        InterpolatingSpline::with_degree(&zeroecc.t, &zeroecc.amp22, 3, Extrapolation::Extrapolate)?;
    let omega_spline = InterpolatingSpline::with_degree(
        &zeroecc.t,
        &zeroecc.omega22,
        3,
        Extrapolation::Extrapolate,
    )?;

    let amp22_zeroecc_interp = amp_spline.evaluate_many(&mode.t)?;
    let omega22_zeroecc_interp = omega_spline.evaluate_many(&mode.t)?;

    let res_amp22 = mode
        .amp22
        .iter()
        .zip(&amp22_zeroecc_interp)
        .map(|(a, a0)| a - a0)
        .collect();
    let res_omega22 = mode
        .omega22
        .iter()
        .zip(&omega22_zeroecc_interp)
        .map(|(w, w0)| w - w0)
        .collect();

    Ok(ResidualData {
        zeroecc,
        amp22_zeroecc_interp,
        omega22_zeroecc_interp,
        res_amp22,
        res_omega22,
    })
}
