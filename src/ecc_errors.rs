//! # Error type
//!
//! Every fallible operation in the crate returns [`EccError`]. Configuration
//! problems (builders, JSON loading, strategy settings) surface as
//! [`EccError::InvalidConfiguration`]; `serde_json` failures are folded into it
//! through the `From` impl so `?` works on deserialization.
//!
//! Non-fatal conditions found while measuring are not errors: they are reported as
//! [`Diagnostic`](crate::diagnostics::Diagnostic) values on the measurement.
//!
//! `PartialEq` is written by hand because several variants carry `f64` payloads;
//! equality is exact on those fields.

use thiserror::Error;

use crate::extrema::ExtremaKind;

#[derive(Error, Debug, Clone)]
pub enum EccError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid waveform data: {0}")]
    InvalidWaveform(String),

    #[error("Mode ({0}, {1}) not found in the waveform data")]
    MissingMode(i32, i32),

    #[error("Extrema method `{0}` needs the quasicircular waveform (t_zeroecc, hlm_zeroecc)")]
    MissingZeroEccWaveform(String),

    #[error("Extrema finder `{0}` returned invalid indices: {1}")]
    InvalidExtrema(String, String),

    #[error("Sufficient number of {kind} are not found (found {found}). Can not create an interpolator.")]
    InsufficientExtrema { kind: ExtremaKind, found: usize },

    #[error(
        "tref_in is later than t_max={t_max}, which corresponds to min(last periastron time, last apastron time)."
    )]
    ReferenceTimeAfterWindow { t_max: f64 },

    #[error(
        "tref_in is earlier than t_min={t_min}, which corresponds to max(first periastron time, first apastron time)."
    )]
    ReferenceTimeBeforeWindow { t_min: f64 },

    #[error(
        "tref_out is empty. This can happen if the waveform has insufficient identifiable periastrons/apastrons."
    )]
    NoValidReferenceTime,

    #[error("Reference time must be within two peaks.")]
    ReferenceTimeNotBracketed,

    #[error("Evaluation at t={t} is outside the interpolation range [{lower}, {upper}]")]
    OutOfInterpolationRange { t: f64, lower: f64, upper: f64 },

    #[error("Spline construction failed: {0}")]
    SplineConstruction(String),

    #[error("Non-finite value found in {0}")]
    NonFiniteInput(String),

    #[error("Quadratic peak fit failed: {0}")]
    PeakFitFailed(String),
}

impl From<serde_json::Error> for EccError {
    fn from(err: serde_json::Error) -> Self {
        EccError::InvalidConfiguration(err.to_string())
    }
}

impl PartialEq for EccError {
    fn eq(&self, other: &Self) -> bool {
        use EccError::*;
        match (self, other) {
            (InvalidConfiguration(a), InvalidConfiguration(b)) => a == b,
            (InvalidWaveform(a), InvalidWaveform(b)) => a == b,
            (MissingMode(l1, m1), MissingMode(l2, m2)) => l1 == l2 && m1 == m2,
            (MissingZeroEccWaveform(a), MissingZeroEccWaveform(b)) => a == b,
            (InvalidExtrema(n1, m1), InvalidExtrema(n2, m2)) => n1 == n2 && m1 == m2,
            (
                InsufficientExtrema { kind: k1, found: f1 },
                InsufficientExtrema { kind: k2, found: f2 },
            ) => k1 == k2 && f1 == f2,
            (ReferenceTimeAfterWindow { t_max: a }, ReferenceTimeAfterWindow { t_max: b }) => {
                a == b
            }
            (ReferenceTimeBeforeWindow { t_min: a }, ReferenceTimeBeforeWindow { t_min: b }) => {
                a == b
            }
            (
                OutOfInterpolationRange {
                    t: t1,
                    lower: l1,
                    upper: u1,
                },
                OutOfInterpolationRange {
                    t: t2,
                    lower: l2,
                    upper: u2,
                },
            ) => t1 == t2 && l1 == l2 && u1 == u2,
            (SplineConstruction(a), SplineConstruction(b)) => a == b,
            (NonFiniteInput(a), NonFiniteInput(b)) => a == b,
            (PeakFitFailed(a), PeakFitFailed(b)) => a == b,

            // Unit variants
            (NoValidReferenceTime, NoValidReferenceTime) => true,
            (ReferenceTimeNotBracketed, ReferenceTimeNotBracketed) => true,

            _ => false,
        }
    }
}

#[cfg(test)]
mod ecc_errors_test {
    use super::*;

    #[test]
    fn test_json_error_becomes_configuration_error() {
        let json_err = serde_json::from_str::<u32>("\"three\"").unwrap_err();
        let msg = json_err.to_string();
        let err: EccError = json_err.into();
        assert_eq!(err, EccError::InvalidConfiguration(msg.clone()));
        assert_eq!(err.to_string(), format!("Invalid configuration: {msg}"));
    }

    #[test]
    fn test_messages_and_equality() {
        let err = EccError::InsufficientExtrema {
            kind: ExtremaKind::Minima,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Sufficient number of minima are not found (found 1). Can not create an interpolator."
        );
        assert_ne!(
            err,
            EccError::InsufficientExtrema {
                kind: ExtremaKind::Maxima,
                found: 1,
            }
        );
        assert_eq!(
            EccError::ReferenceTimeAfterWindow { t_max: -12.5 },
            EccError::ReferenceTimeAfterWindow { t_max: -12.5 }
        );
        assert_ne!(EccError::NoValidReferenceTime, EccError::ReferenceTimeNotBracketed);
    }
}
