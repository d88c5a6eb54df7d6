//! # Constants and type definitions for `gw_eccentricity`
//!
//! This module centralizes the **numerical constants**, **default thresholds**, and
//! **common type aliases** shared by the eccentricity measurement pipeline.
//!
//! ## Overview
//!
//! - Angular constants (2π, 4π per orbit of the (2,2) mode)
//! - Default thresholds used by the extrema separation checks
//! - Default resampling step and size guard used by the eccentricity curve validator
//! - Type aliases used across the crate

use num_complex::Complex64;
use std::collections::BTreeMap;

// -------------------------------------------------------------------------------------------------
// Angular constants
// -------------------------------------------------------------------------------------------------

/// 2π, one full cycle of the orbital phase
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Change of the (2,2) mode phase over one orbit (the mode rotates at twice the orbital frequency)
pub const PHASE22_PER_ORBIT: f64 = 2. * DPI;

// -------------------------------------------------------------------------------------------------
// Default thresholds
// -------------------------------------------------------------------------------------------------

/// Minimum orbital phase difference expected between two consecutive extrema of the same kind
pub const MIN_ORB_PHASE_DIFF: f64 = std::f64::consts::PI;

/// Maximum tolerated ratio between two consecutive orbital phase differences
pub const MAX_ORB_PHASE_DIFF_FACTOR: f64 = 1.5;

/// Time step of the grid used to sample d(ecc)/dt in the curve validator
pub const ECC_TEST_DT: f64 = 0.1;

/// Grid length above which resampling the eccentricity spline is reported as costly
pub const ECC_TEST_MAX_LEN: usize = 1_000_000;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Spherical-harmonic mode index `(l, m)`
pub type ModeIndex = (i32, i32);

/// Lookup table from mode index to the complex mode samples
pub type ModeDict = BTreeMap<ModeIndex, Vec<Complex64>>;

/// The dominant mode, used for every derived quantity
pub const MODE_22: ModeIndex = (2, 2);
