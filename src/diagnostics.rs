//! # Data-quality diagnostics
//!
//! Non-fatal findings of the measurement pipeline. They never change the returned
//! numbers; they are collected on the result so callers can assert on them, and each one
//! is mirrored to the `tracing` warn level when it is raised.
//!
//! | Code                     | Raised by                  | Meaning                                        |
//! |--------------------------|----------------------------|------------------------------------------------|
//! | `extrema_too_close`      | extrema separation check   | orbital phase between extrema `< π`            |
//! | `phase_shift_closer_to_pi` | extrema separation check | a phase gap closer to `π` than to `2π`         |
//! | `extrema_too_far`        | extrema separation check   | a phase gap `> 1.5×` the previous one          |
//! | `non_monotonic_ecc`      | curve validator            | `d ecc / dt > 0` somewhere                     |
//! | `concave_ecc`            | curve validator            | `d² ecc / dt² > 0` somewhere                   |
//! | `oversized_test_grid`    | curve validator            | resampling grid longer than 1e6 points         |
//! | `negative_ecc`           | estimator                  | `ω_p < ω_a` at some reference time             |

use std::fmt;
use tracing::warn;

use crate::extrema::ExtremaKind;

/// One non-fatal finding.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// At least one pair of consecutive extrema is closer than the minimum orbital phase.
    ExtremaTooClose {
        kind: ExtremaKind,
        min_orb_phase_diff: f64,
        times: Vec<f64>,
    },
    /// At least one orbital phase gap is closer to π than to 2π.
    PhaseShiftCloserToPi { kind: ExtremaKind },
    /// At least one orbital phase gap grew by more than the allowed factor.
    ExtremaTooFar {
        kind: ExtremaKind,
        max_orb_phase_diff: f64,
        times: Vec<f64>,
    },
    /// The eccentricity increases somewhere in the checked range.
    NonMonotonicEccentricity,
    /// The second derivative of the eccentricity is positive somewhere.
    ConcaveEccentricity,
    /// The resampling grid of the curve validator is very long.
    OversizedTestGrid { len: usize },
    /// The formula produced negative eccentricities (peak frequency below trough frequency).
    NegativeEccentricity { times: Vec<f64> },
}

impl Diagnostic {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::ExtremaTooClose { .. } => "extrema_too_close",
            Diagnostic::PhaseShiftCloserToPi { .. } => "phase_shift_closer_to_pi",
            Diagnostic::ExtremaTooFar { .. } => "extrema_too_far",
            Diagnostic::NonMonotonicEccentricity => "non_monotonic_ecc",
            Diagnostic::ConcaveEccentricity => "concave_ecc",
            Diagnostic::OversizedTestGrid { .. } => "oversized_test_grid",
            Diagnostic::NegativeEccentricity { .. } => "negative_ecc",
        }
    }

    /// Log the diagnostic at warn level and hand it back.
    pub(crate) fn emit(self) -> Self {
        warn!(code = self.code(), "{self}");
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ExtremaTooClose {
                kind,
                min_orb_phase_diff,
                times,
            } => write!(
                f,
                "At least a pair of {} are too close. Minimum orbital phase diff is {min_orb_phase_diff}. Times of occurrences are {times:?}",
                kind.label()
            ),
            Diagnostic::PhaseShiftCloserToPi { kind } => write!(
                f,
                "Phase shift closer to pi than 2 pi detected between {}.",
                kind.label()
            ),
            Diagnostic::ExtremaTooFar {
                kind,
                max_orb_phase_diff,
                times,
            } => write!(
                f,
                "At least a pair of {} are too far. Maximum orbital phase diff is {max_orb_phase_diff}. Times of occurrences are {times:?}",
                kind.label()
            ),
            Diagnostic::NonMonotonicEccentricity => write!(f, "Ecc(t) is non monotonic."),
            Diagnostic::ConcaveEccentricity => write!(f, "Ecc(t) is concave."),
            Diagnostic::OversizedTestGrid { len } => {
                write!(f, "time array t_for_ecc_test is too long. Length is {len}")
            }
            Diagnostic::NegativeEccentricity { times } => write!(
                f,
                "Negative eccentricity found: omega at peaks is below omega at troughs at times {times:?}"
            ),
        }
    }
}

/// True when any diagnostic in `diagnostics` carries `code`.
pub fn has_code(diagnostics: &[Diagnostic], code: &str) -> bool {
    diagnostics.iter().any(|d| d.code() == code)
}
