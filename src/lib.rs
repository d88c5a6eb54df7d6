//! Eccentricity and mean anomaly of eccentric compact-binary waveforms, measured from
//! the extrema of the (2,2) mode frequency.
//!
//! Entry point: [`ecc_definition::EccDefinition`].

pub mod constants;
pub mod diagnostics;
pub mod ecc_definition;
pub mod ecc_errors;
pub mod ecc_result;
pub mod extrema;
pub mod params;
pub mod peak_fit;
pub mod spline;
pub mod waveform;
