//! # Interpolating splines
//!
//! Piecewise-polynomial interpolants passing exactly through a set of samples,
//! used for the extrema interpolants `ω_p(t)`, `ω_a(t)`, for resampling the
//! quasicircular waveform, and for the eccentricity curve check.
//!
//! Supported degrees
//! -----------------
//! * `1` – piecewise linear.
//! * `3` – cubic with *not-a-knot* end conditions (the third derivative is continuous
//!   across the second and the penultimate knots). With only three samples the
//!   interpolant is the unique parabola through them; with two, the straight line.
//!
//! Extrapolation
//! -----------------
//! The valid domain is the data range, or the boundary box from [`InterpParams`]
//! when one is set. Evaluation outside of it follows [`Extrapolation`]:
//! `Raise` (default) refuses to extrapolate, `Extrapolate` extends the first/last
//! polynomial piece, `Zeros` returns `0`, `Const` returns the boundary value.
//!
//! See also
//! -----------------
//! * [`InterpParams`] – configuration of degree, boundary box, weights and extrapolation.

use serde::{Deserialize, Serialize};

use crate::ecc_errors::EccError;
use crate::params::InterpParams;

/// Policy applied when a spline is evaluated outside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Extend the boundary polynomial pieces.
    Extrapolate,
    /// Return zero.
    Zeros,
    /// Return [`EccError::OutOfInterpolationRange`].
    #[default]
    Raise,
    /// Return the value at the nearest boundary.
    Const,
}

/// Interpolating spline in piecewise power form.
///
/// On segment `i` (`x[i] ≤ t < x[i+1]`) the spline reads
/// `y[i] + b[i] dx + c[i] dx² + d[i] dx³` with `dx = t - x[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatingSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    lower: f64,
    upper: f64,
    extrapolation: Extrapolation,
}

impl InterpolatingSpline {
    /// Build a spline through `(x, y)` with the settings of `params`.
    ///
    /// Arguments
    /// -----------------
    /// * `x` – Strictly increasing abscissas (at least two).
    /// * `y` – Ordinates, same length as `x`.
    /// * `params` – Degree, boundary box, weights, extrapolation and finiteness check.
    ///
    /// Return
    /// ----------
    /// * `Ok(InterpolatingSpline)` on success.
    /// * `Err(EccError::SplineConstruction)` for mismatched lengths, fewer than two points,
    ///   non-increasing abscissas, bad weights or a boundary box not enclosing the data.
    /// * `Err(EccError::NonFiniteInput)` when `check_finite` is set and an input is NaN/inf.
    /// * `Err(EccError::InvalidConfiguration)` for an unsupported degree.
    pub fn new(x: &[f64], y: &[f64], params: &InterpParams) -> Result<Self, EccError> {
        if params.check_finite {
            if x.iter().any(|v| !v.is_finite()) {
                return Err(EccError::NonFiniteInput("spline abscissas".into()));
            }
            if y.iter().any(|v| !v.is_finite()) {
                return Err(EccError::NonFiniteInput("spline ordinates".into()));
            }
        }
        if let Some(w) = &params.weights {
            if w.len() != x.len() {
                return Err(EccError::SplineConstruction(format!(
                    "weights length {} does not match the number of points {}",
                    w.len(),
                    x.len()
                )));
            }
            if w
                .iter()
                .any(|&wi| !wi.is_finite() || wi.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater))
            {
                return Err(EccError::SplineConstruction(
                    "weights must be finite and strictly positive".into(),
                ));
            }
        }

        let mut spline = Self::with_degree(x, y, params.degree, params.extrapolation)?;

        let (lower, upper) = params.bbox;
        if let Some(lo) = lower {
            if lo > spline.lower {
                return Err(EccError::SplineConstruction(format!(
                    "boundary box lower bound {lo} is above the first point {}",
                    spline.lower
                )));
            }
            spline.lower = lo;
        }
        if let Some(up) = upper {
            if up < spline.upper {
                return Err(EccError::SplineConstruction(format!(
                    "boundary box upper bound {up} is below the last point {}",
                    spline.upper
                )));
            }
            spline.upper = up;
        }
        Ok(spline)
    }

    /// Build a spline of the given degree on the data range, without weights or boundary box.
    pub fn with_degree(
        x: &[f64],
        y: &[f64],
        degree: usize,
        extrapolation: Extrapolation,
    ) -> Result<Self, EccError> {
        if x.len() != y.len() {
            return Err(EccError::SplineConstruction(format!(
                "x and y lengths differ ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(EccError::SplineConstruction(format!(
                "at least 2 points are needed, got {}",
                x.len()
            )));
        }
        if x.windows(2).any(|w| w[1].partial_cmp(&w[0]) != Some(std::cmp::Ordering::Greater)) {
            return Err(EccError::SplineConstruction(
                "x must be strictly increasing".into(),
            ));
        }

        let (b, c, d) = match degree {
            1 => linear_coefficients(x, y),
            3 => match x.len() {
                2 => linear_coefficients(x, y),
                3 => parabola_coefficients(x, y),
                _ => not_a_knot_coefficients(x, y),
            },
            k => {
                return Err(EccError::InvalidConfiguration(format!(
                    "unsupported spline degree {k}, expected 1 or 3"
                )))
            }
        };

        Ok(InterpolatingSpline {
            lower: x[0],
            upper: x[x.len() - 1],
            x: x.to_vec(),
            y: y.to_vec(),
            b,
            c,
            d,
            extrapolation,
        })
    }

    /// Valid evaluation domain `(lower, upper)`.
    pub fn domain(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Value of the spline at `t`.
    pub fn evaluate(&self, t: f64) -> Result<f64, EccError> {
        self.derivative(t, 0)
    }

    /// Values of the spline at every element of `ts`.
    pub fn evaluate_many(&self, ts: &[f64]) -> Result<Vec<f64>, EccError> {
        self.derivative_many(ts, 0)
    }

    /// `order`-th derivative (0, 1 or 2) of the spline at `t`; higher orders are zero for
    /// the supported degrees.
    pub fn derivative(&self, t: f64, order: u8) -> Result<f64, EccError> {
        let t_eval = if t < self.lower || t > self.upper {
            match self.extrapolation {
                Extrapolation::Raise => {
                    return Err(EccError::OutOfInterpolationRange {
                        t,
                        lower: self.lower,
                        upper: self.upper,
                    })
                }
                Extrapolation::Zeros => return Ok(0.0),
                Extrapolation::Const => t.clamp(self.lower, self.upper),
                Extrapolation::Extrapolate => t,
            }
        } else {
            t
        };

        let i = self.segment(t_eval);
        let dx = t_eval - self.x[i];
        let (b, c, d) = (self.b[i], self.c[i], self.d[i]);
        let value = match order {
            0 => self.y[i] + dx * (b + dx * (c + dx * d)),
            1 => b + dx * (2.0 * c + 3.0 * dx * d),
            2 => 2.0 * c + 6.0 * dx * d,
            3 => 6.0 * d,
            _ => 0.0,
        };
        Ok(value)
    }

    /// `order`-th derivative at every element of `ts`.
    pub fn derivative_many(&self, ts: &[f64], order: u8) -> Result<Vec<f64>, EccError> {
        ts.iter().map(|&t| self.derivative(t, order)).collect()
    }

    /// Index of the polynomial piece used at `t` (first/last piece outside the knots).
    fn segment(&self, t: f64) -> usize {
        let n_seg = self.x.len() - 1;
        self.x
            .partition_point(|&xi| xi <= t)
            .saturating_sub(1)
            .min(n_seg - 1)
    }
}

type Coefficients = (Vec<f64>, Vec<f64>, Vec<f64>);

fn linear_coefficients(x: &[f64], y: &[f64]) -> Coefficients {
    let n_seg = x.len() - 1;
    let b = (0..n_seg)
        .map(|i| (y[i + 1] - y[i]) / (x[i + 1] - x[i]))
        .collect();
    (b, vec![0.0; n_seg], vec![0.0; n_seg])
}

/// Unique parabola through three points, written per segment.
fn parabola_coefficients(x: &[f64], y: &[f64]) -> Coefficients {
    let f01 = (y[1] - y[0]) / (x[1] - x[0]);
    let f12 = (y[2] - y[1]) / (x[2] - x[1]);
    let f012 = (f12 - f01) / (x[2] - x[0]);

    let slope = |xi: f64| f01 + f012 * (2.0 * xi - x[0] - x[1]);
    (
        vec![slope(x[0]), slope(x[1])],
        vec![f012, f012],
        vec![0.0, 0.0],
    )
}

/// Cubic spline with not-a-knot end conditions (n ≥ 4).
///
/// Solves for the second derivatives `M[i]` at the knots. The two not-a-knot conditions
/// are eliminated into the first and last interior equations so that the remaining
/// `(n-2)×(n-2)` system stays tridiagonal.
fn not_a_knot_coefficients(x: &[f64], y: &[f64]) -> Coefficients {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    let m = n - 2;
    let mut sub = vec![0.0; m];
    let mut diag = vec![0.0; m];
    let mut sup = vec![0.0; m];
    let mut rhs = vec![0.0; m];

    for k in 0..m {
        let i = k + 1;
        sub[k] = h[i - 1];
        diag[k] = 2.0 * (h[i - 1] + h[i]);
        sup[k] = h[i];
        rhs[k] = 6.0 * (slope[i] - slope[i - 1]);
    }

    // M0 = (1 + h0/h1) M1 - (h0/h1) M2
    let (h0, h1) = (h[0], h[1]);
    diag[0] += h0 * (1.0 + h0 / h1);
    sup[0] -= h0 * h0 / h1;

    // M[n-1] = (1 + b/a) M[n-2] - (b/a) M[n-3], a = h[n-3], b = h[n-2]
    let (a, b) = (h[n - 3], h[n - 2]);
    diag[m - 1] += b * (1.0 + b / a);
    sub[m - 1] -= b * b / a;

    let inner = solve_tridiagonal(&sub, &diag, &sup, &rhs);

    let mut second = Vec::with_capacity(n);
    second.push((1.0 + h0 / h1) * inner[0] - (h0 / h1) * inner[1]);
    second.extend_from_slice(&inner);
    second.push((1.0 + b / a) * inner[m - 1] - (b / a) * inner[m - 2]);

    let n_seg = n - 1;
    let mut bs = Vec::with_capacity(n_seg);
    let mut cs = Vec::with_capacity(n_seg);
    let mut ds = Vec::with_capacity(n_seg);
    for i in 0..n_seg {
        bs.push(slope[i] - h[i] * (2.0 * second[i] + second[i + 1]) / 6.0);
        cs.push(second[i] / 2.0);
        ds.push((second[i + 1] - second[i]) / (6.0 * h[i]));
    }
    (bs, cs, ds)
}

/// Thomas algorithm for a tridiagonal system; `sub[0]` and `sup[m-1]` are ignored.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let m = diag.len();
    let mut c_prime = vec![0.0; m];
    let mut d_prime = vec![0.0; m];

    c_prime[0] = sup[0] / diag[0];
    d_prime[0] = rhs[0] / diag[0];
    for i in 1..m {
        let denom = diag[i] - sub[i] * c_prime[i - 1];
        c_prime[i] = sup[i] / denom;
        d_prime[i] = (rhs[i] - sub[i] * d_prime[i - 1]) / denom;
    }

    let mut sol = vec![0.0; m];
    sol[m - 1] = d_prime[m - 1];
    for i in (0..m - 1).rev() {
        sol[i] = d_prime[i] - c_prime[i] * sol[i + 1];
    }
    sol
}
