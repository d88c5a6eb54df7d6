//! # Extrema location
//!
//! The measurement pipeline only needs a *capability*: given the derived waveform
//! quantities, return the sample indices of the periastron-like maxima or the
//! apastron-like minima of some monotonic-proxy signal. That capability is the
//! [`ExtremaFinder`] trait; the strategy is chosen when the estimator is built and
//! injected into it.
//!
//! ## Contract
//!
//! [`ExtremaFinder::find_extrema`] returns indices that are
//! - valid indices into the waveform time grid,
//! - strictly increasing,
//! - deterministic for a given `kind` and input.
//!
//! ## Built-in strategies
//!
//! [`ExtremaMethod`] is a flat set of variants, each running the generic detector
//! [`find_peaks`] on a different proxy:
//!
//! | Variant             | Proxy signal     | Needs quasicircular counterpart |
//! |---------------------|------------------|---------------------------------|
//! | `Amplitude`         | `amp22`          | no                              |
//! | `Frequency`         | `omega22`        | no                              |
//! | `ResidualAmplitude` | `res_amp22`      | yes                             |
//! | `ResidualFrequency` | `res_omega22`    | yes                             |
//!
//! Minima are found as maxima of the negated proxy.

mod peaks;

pub use peaks::find_peaks;

use std::fmt;
use std::str::FromStr;

use crate::ecc_errors::EccError;
use crate::params::{ExtremaFindingParams, PeakFinderParams};
use crate::waveform::ModeData;

/// Which kind of extremum to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtremaKind {
    /// Local maxima of the proxy (periastron passages, "peaks").
    Maxima,
    /// Local minima of the proxy (apastron passages, "troughs").
    Minima,
}

impl ExtremaKind {
    /// Plural noun used in diagnostics ("peaks" / "troughs").
    pub fn label(&self) -> &'static str {
        match self {
            ExtremaKind::Maxima => "peaks",
            ExtremaKind::Minima => "troughs",
        }
    }
}

impl fmt::Display for ExtremaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtremaKind::Maxima => write!(f, "maxima"),
            ExtremaKind::Minima => write!(f, "minima"),
        }
    }
}

impl FromStr for ExtremaKind {
    type Err = EccError;

    /// Accepts `maxima`/`peaks` and `minima`/`troughs`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maxima" | "peaks" => Ok(ExtremaKind::Maxima),
            "minima" | "troughs" => Ok(ExtremaKind::Minima),
            other => Err(EccError::InvalidConfiguration(format!(
                "extrema type must be one of 'maxima', 'peaks', 'minima' or 'troughs', got '{other}'"
            ))),
        }
    }
}

/// Strategy locating the extrema used to build the frequency interpolants.
pub trait ExtremaFinder: fmt::Debug + Send + Sync {
    /// Indices of the extrema of `kind` on the time grid of `data`.
    ///
    /// Arguments
    /// -----------------
    /// * `data` – Derived waveform quantities.
    /// * `kind` – Maxima or minima.
    /// * `params` – Strategy settings, forwarded untouched from
    ///   [`ExtraParams::extrema_finding`](crate::params::ExtraParams::extrema_finding).
    ///   Their schema is up to the strategy.
    ///
    /// Return
    /// ----------
    /// * Strictly increasing indices into `data.t()`.
    fn find_extrema(
        &self,
        data: &ModeData,
        kind: ExtremaKind,
        params: &ExtremaFindingParams,
    ) -> Result<Vec<usize>, EccError>;

    /// Short name of the strategy, used in logs and errors.
    fn name(&self) -> &str;

    /// Whether the strategy reads the residual quantities.
    fn requires_zeroecc(&self) -> bool {
        false
    }

    /// Reject settings the strategy cannot use; called once when the estimator is built.
    fn check_params(&self, _params: &ExtremaFindingParams) -> Result<(), EccError> {
        Ok(())
    }
}

/// Built-in extrema strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtremaMethod {
    Amplitude,
    Frequency,
    ResidualAmplitude,
    ResidualFrequency,
}

impl ExtremaMethod {
    fn proxy<'a>(&self, data: &'a ModeData) -> Result<&'a [f64], EccError> {
        let missing = || EccError::MissingZeroEccWaveform(self.name().to_string());
        match self {
            ExtremaMethod::Amplitude => Ok(data.amp22()),
            ExtremaMethod::Frequency => Ok(data.omega22()),
            ExtremaMethod::ResidualAmplitude => data.res_amp22().ok_or_else(missing),
            ExtremaMethod::ResidualFrequency => data.res_omega22().ok_or_else(missing),
        }
    }
}

impl ExtremaFinder for ExtremaMethod {
    fn find_extrema(
        &self,
        data: &ModeData,
        kind: ExtremaKind,
        params: &ExtremaFindingParams,
    ) -> Result<Vec<usize>, EccError> {
        let peak_params = PeakFinderParams::from_map(params)?;
        let proxy = self.proxy(data)?;
        let extrema = match kind {
            ExtremaKind::Maxima => find_peaks(proxy, &peak_params),
            ExtremaKind::Minima => {
                let negated: Vec<f64> = proxy.iter().map(|v| -v).collect();
                find_peaks(&negated, &peak_params)
            }
        };
        Ok(extrema)
    }

    fn name(&self) -> &str {
        match self {
            ExtremaMethod::Amplitude => "Amplitude",
            ExtremaMethod::Frequency => "Frequency",
            ExtremaMethod::ResidualAmplitude => "ResidualAmplitude",
            ExtremaMethod::ResidualFrequency => "ResidualFrequency",
        }
    }

    fn requires_zeroecc(&self) -> bool {
        matches!(
            self,
            ExtremaMethod::ResidualAmplitude | ExtremaMethod::ResidualFrequency
        )
    }

    /// The built-in strategies only understand [`PeakFinderParams`] keys.
    fn check_params(&self, params: &ExtremaFindingParams) -> Result<(), EccError> {
        PeakFinderParams::from_map(params).map(|_| ())
    }
}

impl FromStr for ExtremaMethod {
    type Err = EccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Amplitude" => Ok(ExtremaMethod::Amplitude),
            "Frequency" => Ok(ExtremaMethod::Frequency),
            "ResidualAmplitude" => Ok(ExtremaMethod::ResidualAmplitude),
            "ResidualFrequency" => Ok(ExtremaMethod::ResidualFrequency),
            other => Err(EccError::InvalidConfiguration(format!(
                "unknown extrema method '{other}', expected one of Amplitude, Frequency, ResidualAmplitude, ResidualFrequency"
            ))),
        }
    }
}

#[cfg(test)]
mod extrema_test {
    use super::*;
    use crate::constants::{ModeDict, MODE_22};
    use crate::waveform::WaveformBundle;
    use num_complex::Complex64;

    fn modulated_data() -> ModeData {
        // Amplitude and frequency both oscillate with period 50
        let t: Vec<f64> = (0..1000).map(|i| i as f64 * 0.5).collect();
        let mut phase = 0.0;
        let mut h22 = Vec::with_capacity(t.len());
        for (i, &ti) in t.iter().enumerate() {
            if i > 0 {
                phase += 0.5 * (0.2 + 0.02 * (DPI_TEST * ti / 50.0).cos());
            }
            let amp = 1.0 + 0.1 * (DPI_TEST * ti / 50.0).cos() + 1e-3 * ti;
            h22.push(Complex64::from_polar(amp, -phase));
        }
        ModeData::from_bundle(&WaveformBundle::new(t, ModeDict::from([(MODE_22, h22)]))).unwrap()
    }

    const DPI_TEST: f64 = 2.0 * std::f64::consts::PI;

    #[test]
    fn test_kind_parsing_and_display() {
        assert_eq!("peaks".parse::<ExtremaKind>().unwrap(), ExtremaKind::Maxima);
        assert_eq!("maxima".parse::<ExtremaKind>().unwrap(), ExtremaKind::Maxima);
        assert_eq!("troughs".parse::<ExtremaKind>().unwrap(), ExtremaKind::Minima);
        assert!("saddle".parse::<ExtremaKind>().is_err());
        assert_eq!(ExtremaKind::Minima.to_string(), "minima");
        assert_eq!(ExtremaKind::Maxima.label(), "peaks");
    }

    #[test]
    fn test_frequency_and_amplitude_extrema_spacing() {
        let data = modulated_data();
        for method in [ExtremaMethod::Frequency, ExtremaMethod::Amplitude] {
            for kind in [ExtremaKind::Maxima, ExtremaKind::Minima] {
                let idx = method
                    .find_extrema(&data, kind, &ExtremaFindingParams::new())
                    .unwrap();
                assert!(idx.len() >= 8, "{method:?} {kind} found {}", idx.len());
                assert!(idx.windows(2).all(|w| w[1] > w[0]));
                for w in idx.windows(2) {
                    let dt = data.t()[w[1]] - data.t()[w[0]];
                    assert!((dt - 50.0).abs() < 1.5, "{method:?} {kind}: spacing {dt}");
                }
            }
        }
    }

    #[test]
    fn test_residual_methods_need_counterpart() {
        let data = modulated_data();
        let err = ExtremaMethod::ResidualAmplitude
            .find_extrema(&data, ExtremaKind::Maxima, &ExtremaFindingParams::new())
            .unwrap_err();
        assert_eq!(
            err,
            EccError::MissingZeroEccWaveform("ResidualAmplitude".into())
        );
        assert!(ExtremaMethod::ResidualFrequency.requires_zeroecc());
        assert!(!ExtremaMethod::Frequency.requires_zeroecc());
    }

    #[test]
    fn test_builtin_reads_its_settings_from_the_mapping() {
        let data = modulated_data();
        let all = ExtremaMethod::Frequency
            .find_extrema(&data, ExtremaKind::Maxima, &ExtremaFindingParams::new())
            .unwrap();

        // Extrema are 100 samples apart; a 150-sample distance keeps every other one
        let sparse = PeakFinderParams {
            distance: Some(150),
            ..Default::default()
        }
        .to_map();
        assert!(ExtremaMethod::Frequency.check_params(&sparse).is_ok());
        let kept = ExtremaMethod::Frequency
            .find_extrema(&data, ExtremaKind::Maxima, &sparse)
            .unwrap();
        assert!(kept.len() < all.len());
        assert!(kept.windows(2).all(|w| w[1] - w[0] >= 150));

        let mut foreign = ExtremaFindingParams::new();
        foreign.insert("wlen".into(), 20.into());
        assert!(matches!(
            ExtremaMethod::Amplitude.check_params(&foreign),
            Err(EccError::InvalidConfiguration(_))
        ));
        assert!(ExtremaMethod::Amplitude
            .find_extrema(&data, ExtremaKind::Maxima, &foreign)
            .is_err());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!(
            "ResidualFrequency".parse::<ExtremaMethod>().unwrap(),
            ExtremaMethod::ResidualFrequency
        );
        assert!("Bogus".parse::<ExtremaMethod>().is_err());
    }
}
