//! # Measurement parameters
//!
//! This module defines the two configuration structures accepted by
//! [`EccDefinition::new`](crate::ecc_definition::EccDefinition::new), together with their
//! builders:
//!
//! - [`InterpParams`] – settings of the interpolating splines built through the extrema
//!   (degree, boundary box, weights, extrapolation policy, finiteness check).
//! - [`ExtraParams`] – pipeline settings: how many orbits before merger are discarded when
//!   collecting extrema, the parameters forwarded to the extrema finder, and the debug flag.
//! - [`PeakFinderParams`] – tunables of the built-in local-extrema detector
//!   ([`find_peaks`](crate::extrema::find_peaks)), read by the built-in strategies out of
//!   the opaque `extrema_finding` mapping.
//!
//! ## Validation
//!
//! Every structure is validated once, when it is built (`builder().….build()`) or loaded
//! from JSON (`from_json`). JSON loading rejects unknown top-level keys; the error message
//! lists the allowed ones. The content of `extrema_finding` belongs to the extrema strategy
//! and is only checked by it.
//!
//! ## Example
//!
//! ```rust
//! use gw_eccentricity::params::{ExtraParams, InterpParams};
//! use gw_eccentricity::spline::Extrapolation;
//!
//! let interp = InterpParams::builder()
//!     .degree(3)
//!     .extrapolation(Extrapolation::Raise)
//!     .build()
//!     .unwrap();
//!
//! let extra = ExtraParams::from_json(r#"{"num_orbits_to_exclude_before_merger": 2.0}"#).unwrap();
//! assert_eq!(extra.num_orbits_to_exclude_before_merger, Some(2.0));
//! assert!(extra.debug);
//! # let _ = interp;
//! ```
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering::{Equal, Greater};
use std::fmt;

use crate::ecc_errors::EccError;
use crate::spline::Extrapolation;

/// Return true iff x >= 0.0 and comparable (i.e., not NaN).
#[inline]
fn ge0(x: f64) -> bool {
    matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
}

/// Settings of the interpolating splines through the extrema.
///
/// Fields
/// -----------------
/// * `weights` – Optional per-point weights, checked against the points when a spline is
///   built (same length, finite, strictly positive). They do not change an interpolating fit.
/// * `bbox` – Boundary box `(lower, upper)` of the spline domain; `None` means the data range.
/// * `degree` – Spline degree, `1` or `3`.
/// * `extrapolation` – Policy outside the domain, see [`Extrapolation`].
/// * `check_finite` – Reject NaN/inf inputs when building a spline.
///
/// Defaults
/// -----------------
/// * `weights`: `None`
/// * `bbox`: `(None, None)`
/// * `degree`: 3
/// * `extrapolation`: [`Extrapolation::Raise`]
/// * `check_finite`: `false`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpParams {
    pub weights: Option<Vec<f64>>,
    pub bbox: (Option<f64>, Option<f64>),
    pub degree: usize,
    pub extrapolation: Extrapolation,
    pub check_finite: bool,
}

impl Default for InterpParams {
    fn default() -> Self {
        InterpParams {
            weights: None,
            bbox: (None, None),
            degree: 3,
            extrapolation: Extrapolation::Raise,
            check_finite: false,
        }
    }
}

impl InterpParams {
    /// Create a new [`InterpParamsBuilder`] initialized with the default values.
    pub fn builder() -> InterpParamsBuilder {
        InterpParamsBuilder::new()
    }

    /// Load and validate spline settings from a JSON object.
    ///
    /// Missing keys take their default value; unknown keys are an
    /// [`EccError::InvalidConfiguration`].
    pub fn from_json(json: &str) -> Result<Self, EccError> {
        let params: InterpParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub(crate) fn validate(&self) -> Result<(), EccError> {
        if self.degree != 1 && self.degree != 3 {
            return Err(EccError::InvalidConfiguration(format!(
                "degree must be 1 or 3, got {}",
                self.degree
            )));
        }
        if let (Some(lo), Some(up)) = self.bbox {
            if lo.partial_cmp(&up) != Some(std::cmp::Ordering::Less) {
                return Err(EccError::InvalidConfiguration(format!(
                    "bbox lower bound {lo} must be below upper bound {up}"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`InterpParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct InterpParamsBuilder {
    params: InterpParams,
}

impl InterpParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: InterpParams::default(),
        }
    }

    pub fn weights(mut self, v: Option<Vec<f64>>) -> Self {
        self.params.weights = v;
        self
    }
    pub fn bbox(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.params.bbox = (lower, upper);
        self
    }
    pub fn degree(mut self, v: usize) -> Self {
        self.params.degree = v;
        self
    }
    pub fn extrapolation(mut self, v: Extrapolation) -> Self {
        self.params.extrapolation = v;
        self
    }
    pub fn check_finite(mut self, v: bool) -> Self {
        self.params.check_finite = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `degree ∈ {1, 3}`.
    /// * `bbox.0 < bbox.1` when both are set.
    pub fn build(self) -> Result<InterpParams, EccError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

/// Tunables of the built-in local-extrema detector.
///
/// Fields
/// -----------------
/// * `height` – Minimum value of a retained extremum (in the detector's orientation:
///   for minima, the floor applies to the negated signal).
/// * `prominence` – Minimum prominence of a retained extremum.
/// * `distance` – Minimum separation in samples between two retained extrema; when two
///   are closer, the larger one wins.
///
/// All fields default to `None` (no filtering). Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeakFinderParams {
    pub height: Option<f64>,
    pub prominence: Option<f64>,
    pub distance: Option<usize>,
}

/// Opaque extrema-finder settings, forwarded untouched to the injected strategy.
pub type ExtremaFindingParams = Map<String, Value>;

impl PeakFinderParams {
    /// Read and validate the detector tunables from an extrema-finder mapping.
    ///
    /// Return
    /// ----------
    /// * `Err(EccError::InvalidConfiguration)` for an unknown key, a value of the wrong
    ///   type or an out-of-range value.
    pub fn from_map(map: &ExtremaFindingParams) -> Result<Self, EccError> {
        let params: PeakFinderParams = serde_json::from_value(Value::Object(map.clone()))?;
        params.validate()?;
        Ok(params)
    }

    /// The same tunables as an extrema-finder mapping, `None` fields omitted.
    pub fn to_map(&self) -> ExtremaFindingParams {
        let mut map = Map::new();
        if let Some(h) = self.height {
            map.insert("height".into(), h.into());
        }
        if let Some(p) = self.prominence {
            map.insert("prominence".into(), p.into());
        }
        if let Some(d) = self.distance {
            map.insert("distance".into(), d.into());
        }
        map
    }

    pub(crate) fn validate(&self) -> Result<(), EccError> {
        if let Some(h) = self.height {
            if !h.is_finite() {
                return Err(EccError::InvalidConfiguration(format!(
                    "extrema_finding.height must be finite, got {h}"
                )));
            }
        }
        if let Some(p) = self.prominence {
            if !ge0(p) || !p.is_finite() {
                return Err(EccError::InvalidConfiguration(format!(
                    "extrema_finding.prominence must be finite and non-negative, got {p}"
                )));
            }
        }
        if self.distance == Some(0) {
            return Err(EccError::InvalidConfiguration(
                "extrema_finding.distance must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Pipeline settings of the eccentricity measurement.
///
/// Fields
/// -----------------
/// * `num_orbits_to_exclude_before_merger` – `None` keeps every extremum (even post-merger),
///   which may spoil the interpolants near merger. A non-negative value discards the
///   extrema found within that many orbits before merger.
/// * `extrema_finding` – Mapping forwarded untouched to the extrema finder. The built-in
///   strategies read [`PeakFinderParams`] out of it; custom strategies may carry any keys.
/// * `debug` – Enables the extra data-quality diagnostics (oversized test grid).
///
/// Defaults
/// -----------------
/// * `num_orbits_to_exclude_before_merger`: `Some(1.0)`
/// * `extrema_finding`: empty mapping
/// * `debug`: `true`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtraParams {
    pub num_orbits_to_exclude_before_merger: Option<f64>,
    pub extrema_finding: ExtremaFindingParams,
    pub debug: bool,
}

impl Default for ExtraParams {
    fn default() -> Self {
        ExtraParams {
            num_orbits_to_exclude_before_merger: Some(1.0),
            extrema_finding: ExtremaFindingParams::new(),
            debug: true,
        }
    }
}

impl ExtraParams {
    /// Create a new [`ExtraParamsBuilder`] initialized with the default values.
    pub fn builder() -> ExtraParamsBuilder {
        ExtraParamsBuilder::new()
    }

    /// Load and validate pipeline settings from a JSON object.
    ///
    /// Missing keys take their default value; unknown top-level keys are an
    /// [`EccError::InvalidConfiguration`]. `extrema_finding` must be an object and is kept
    /// as given.
    pub fn from_json(json: &str) -> Result<Self, EccError> {
        let params: ExtraParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub(crate) fn validate(&self) -> Result<(), EccError> {
        if let Some(n) = self.num_orbits_to_exclude_before_merger {
            if !ge0(n) {
                return Err(EccError::InvalidConfiguration(format!(
                    "num_orbits_to_exclude_before_merger must be non-negative. Given value was {n}"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`ExtraParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct ExtraParamsBuilder {
    params: ExtraParams,
}

impl ExtraParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: ExtraParams::default(),
        }
    }

    pub fn num_orbits_to_exclude_before_merger(mut self, v: Option<f64>) -> Self {
        self.params.num_orbits_to_exclude_before_merger = v;
        self
    }
    pub fn extrema_finding(mut self, v: ExtremaFindingParams) -> Self {
        self.params.extrema_finding = v;
        self
    }
    pub fn debug(mut self, v: bool) -> Self {
        self.params.debug = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `num_orbits_to_exclude_before_merger` is `None` or `>= 0` (NaN rejected).
    pub fn build(self) -> Result<ExtraParams, EccError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

impl fmt::Display for ExtraParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let orbits = match self.num_orbits_to_exclude_before_merger {
            Some(n) => format!("{n:.3}"),
            None => "none".to_string(),
        };
        if f.alternate() {
            writeln!(f, "Eccentricity measurement parameters")?;
            writeln!(f, "-----------------------------------")?;
            writeln!(f, "  num_orbits_to_exclude_before_merger = {orbits}")?;
            for (key, value) in &self.extrema_finding {
                writeln!(f, "  extrema_finding.{key:<19} = {value}")?;
            }
            writeln!(f, "  debug                               = {}", self.debug)
        } else {
            write!(
                f,
                "ExtraParams(orbits_excluded={orbits}, extrema_finding={}, debug={})",
                Value::Object(self.extrema_finding.clone()),
                self.debug
            )
        }
    }
}

impl fmt::Display for InterpParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InterpParams(degree={}, bbox=({:?}, {:?}), extrapolation={:?}, weights={}, check_finite={})",
            self.degree,
            self.bbox.0,
            self.bbox.1,
            self.extrapolation,
            self.weights.as_ref().map_or(0, Vec::len),
            self.check_finite
        )
    }
}

#[cfg(test)]
mod params_test {
    use super::*;

    #[test]
    fn test_defaults() {
        let interp = InterpParams::default();
        assert_eq!(interp.degree, 3);
        assert_eq!(interp.bbox, (None, None));
        assert_eq!(interp.extrapolation, Extrapolation::Raise);
        assert!(!interp.check_finite);

        let extra = ExtraParams::default();
        assert_eq!(extra.num_orbits_to_exclude_before_merger, Some(1.0));
        assert!(extra.debug);
        assert!(extra.extrema_finding.is_empty());
    }

    #[test]
    fn test_negative_orbits_rejected() {
        let err = ExtraParams::builder()
            .num_orbits_to_exclude_before_merger(Some(-1.0))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            EccError::InvalidConfiguration(
                "num_orbits_to_exclude_before_merger must be non-negative. Given value was -1"
                    .into()
            )
        );

        assert!(ExtraParams::builder()
            .num_orbits_to_exclude_before_merger(Some(f64::NAN))
            .build()
            .is_err());
        assert!(ExtraParams::builder()
            .num_orbits_to_exclude_before_merger(None)
            .build()
            .is_ok());
        assert!(ExtraParams::builder()
            .num_orbits_to_exclude_before_merger(Some(0.0))
            .build()
            .is_ok());
    }

    #[test]
    fn test_json_unknown_key_lists_allowed_keys() {
        let err = ExtraParams::from_json(r#"{"num_orbits": 2}"#).unwrap_err();
        let EccError::InvalidConfiguration(msg) = err else {
            panic!("expected a configuration error, got {err:?}");
        };
        assert!(msg.contains("num_orbits_to_exclude_before_merger"));
        assert!(msg.contains("extrema_finding"));
        assert!(msg.contains("debug"));

        let err = InterpParams::from_json(r#"{"k": 3}"#).unwrap_err();
        assert!(matches!(err, EccError::InvalidConfiguration(msg) if msg.contains("degree")));

        // Finder settings are opaque at this level
        let extra =
            ExtraParams::from_json(r#"{"extrema_finding": {"width": 3, "my_knob": [1, 2]}}"#)
                .unwrap();
        assert_eq!(extra.extrema_finding["width"], 3);
        assert!(ExtraParams::from_json(r#"{"extrema_finding": 3}"#).is_err());
    }

    #[test]
    fn test_json_values() {
        let extra = ExtraParams::from_json(
            r#"{"num_orbits_to_exclude_before_merger": null, "debug": false,
                "extrema_finding": {"distance": 10}}"#,
        )
        .unwrap();
        assert_eq!(extra.num_orbits_to_exclude_before_merger, None);
        assert!(!extra.debug);
        assert_eq!(
            PeakFinderParams::from_map(&extra.extrema_finding).unwrap().distance,
            Some(10)
        );

        let interp =
            InterpParams::from_json(r#"{"bbox": [-5.0, null], "extrapolation": "const"}"#).unwrap();
        assert_eq!(interp.bbox, (Some(-5.0), None));
        assert_eq!(interp.extrapolation, Extrapolation::Const);

        assert!(ExtraParams::from_json(r#"{"num_orbits_to_exclude_before_merger": -0.5}"#).is_err());
    }

    #[test]
    fn test_interp_validation() {
        assert!(InterpParams::builder().degree(2).build().is_err());
        assert!(InterpParams::builder().bbox(Some(1.0), Some(0.0)).build().is_err());
        assert!(InterpParams::builder().degree(1).build().is_ok());

        // Weights are checked by the spline, against the points
        let interp = InterpParams::builder()
            .weights(Some(vec![1.0, -1.0]))
            .build()
            .unwrap();
        assert!(matches!(
            crate::spline::InterpolatingSpline::new(&[0.0, 1.0], &[0.0, 1.0], &interp),
            Err(EccError::SplineConstruction(_))
        ));
    }

    #[test]
    fn test_peak_finder_validation() {
        let bad = PeakFinderParams {
            distance: Some(0),
            ..Default::default()
        };
        assert!(PeakFinderParams::from_map(&bad.to_map()).is_err());

        let bad = PeakFinderParams {
            prominence: Some(-1.0),
            ..Default::default()
        };
        assert!(PeakFinderParams::from_map(&bad.to_map()).is_err());

        let good = PeakFinderParams {
            height: Some(0.5),
            distance: Some(4),
            ..Default::default()
        };
        assert_eq!(PeakFinderParams::from_map(&good.to_map()).unwrap(), good);

        let mut map = good.to_map();
        map.insert("width".into(), 3.into());
        let err = PeakFinderParams::from_map(&map).unwrap_err();
        assert!(matches!(err, EccError::InvalidConfiguration(msg) if msg.contains("width")));
    }

    #[test]
    fn test_display() {
        let extra = ExtraParams::default();
        assert_eq!(
            format!("{extra}"),
            "ExtraParams(orbits_excluded=1.000, extrema_finding={}, debug=true)"
        );
        assert!(format!("{extra:#}").contains("num_orbits_to_exclude_before_merger = 1.000"));
        assert!(format!("{}", InterpParams::default()).starts_with("InterpParams(degree=3"));
    }
}
