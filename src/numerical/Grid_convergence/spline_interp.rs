//! Interpolating B-spline for scattered 1-D samples.
//!
//! Positions are mapped to u = (x - xmin)/(xmax - xmin) before fitting, where
//! [xmin, xmax] is supplied by the caller (usually the overlap of several
//! signals) so that interpolants of differently sampled curves share one
//! parameterisation. The curve has degree min(3, n-1), a clamped knot vector
//! spanning the data parameters with interior knots placed by averaging
//! (de Boor), and passes through every sample.
//!
//! Evaluation outside the data range is NOT clamped: the first or last
//! polynomial piece is simply continued, which may produce extrapolation
//! artifacts far from the data.
use super::errors::ConvergenceError;
use super::signal::Signal;
use crate::somelinalg::band_lu::BandMatrix;
use nalgebra::DVector;

pub const MAX_DEGREE: usize = 3;

#[derive(Debug, Clone)]
pub struct SplineInterpolator {
    x_min: f64,
    x_max: f64,
    degree: usize,
    /// knot vector in normalised coordinates, length n + degree + 1
    knots: Vec<f64>,
    /// control point values, length n
    coefficients: DVector<f64>,
}

impl SplineInterpolator {
    /// create interpolant for a function sampled at `xs` with values `ys`;
    /// `xs` must be strictly increasing
    pub fn new(xs: &[f64], ys: &[f64], x_min: f64, x_max: f64) -> Result<Self, ConvergenceError> {
        if !x_min.is_finite() || !x_max.is_finite() || x_max == x_min {
            return Err(ConvergenceError::InvalidDomain {
                xmin: x_min,
                xmax: x_max,
            });
        }
        if xs.len() != ys.len() || xs.len() < 2 {
            return Err(ConvergenceError::InvalidSignal(format!(
                "spline needs at least 2 matching samples, got {} positions and {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConvergenceError::InvalidSignal(
                "spline positions must be strictly increasing".to_string(),
            ));
        }

        let n = xs.len();
        let degree = MAX_DEGREE.min(n - 1);
        let scale = |x: f64| (x - x_min) / (x_max - x_min);
        let params: Vec<f64> = xs.iter().map(|&x| scale(x)).collect();
        // a reversed domain flips the parameter order
        let (params, values): (Vec<f64>, Vec<f64>) = if params[n - 1] < params[0] {
            (
                params.iter().rev().copied().collect(),
                ys.iter().rev().copied().collect(),
            )
        } else {
            (params, ys.to_vec())
        };
        let knots = averaged_knots(&params, degree);

        // collocation system A c = y, A[i][span-p+k] = N_k(u_i); every row has
        // at most degree+1 non-zeros around the diagonal
        let rows: Vec<(usize, Vec<f64>)> = params
            .iter()
            .map(|&u| {
                let span = find_span(&knots, n, degree, u);
                (span - degree, basis_functions(&knots, degree, span, u))
            })
            .collect();
        let (kl, ku) = rows
            .iter()
            .enumerate()
            .fold((0, 0), |(kl, ku), (i, (first, basis))| {
                let last = first + basis.len() - 1;
                (kl.max(i.saturating_sub(*first)), ku.max(last.saturating_sub(i)))
            });
        let mut a = BandMatrix::zeros(n, kl, ku);
        for (i, (first, basis)) in rows.iter().enumerate() {
            for (k, b) in basis.iter().enumerate() {
                a.set(i, first + k, *b);
            }
        }
        let rhs = DVector::from_vec(values);
        let coefficients = a
            .lu()
            .and_then(|lu| lu.solve(&rhs))
            .ok_or(ConvergenceError::SingularCollocation)?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ConvergenceError::SingularCollocation);
        }

        Ok(SplineInterpolator {
            x_min,
            x_max,
            degree,
            knots,
            coefficients,
        })
    }

    /// interpolant of a whole signal over the domain [x_min, x_max]
    pub fn from_signal(signal: &Signal, x_min: f64, x_max: f64) -> Result<Self, ConvergenceError> {
        Self::new(signal.x().as_slice(), signal.y().as_slice(), x_min, x_max)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    fn scaled_value(&self, x: f64) -> f64 {
        (x - self.x_min) / (self.x_max - self.x_min)
    }

    /// evaluate interpolant at x (no clamping, see module docs)
    pub fn evaluate(&self, x: f64) -> f64 {
        let u = self.scaled_value(x);
        let n = self.coefficients.len();
        let span = find_span(&self.knots, n, self.degree, u);
        let basis = basis_functions(&self.knots, self.degree, span, u);
        basis
            .iter()
            .enumerate()
            .map(|(k, b)| b * self.coefficients[span - self.degree + k])
            .sum()
    }

    /// evaluate at every point of `grid`
    pub fn evaluate_many(&self, grid: &DVector<f64>) -> DVector<f64> {
        grid.map(|x| self.evaluate(x))
    }
}

/// clamped knot vector: degree+1 copies of the first and last parameter,
/// interior knots are moving averages of `degree` consecutive parameters
fn averaged_knots(params: &[f64], degree: usize) -> Vec<f64> {
    let n = params.len();
    let mut knots = vec![0.0; n + degree + 1];
    for k in knots.iter_mut().take(degree + 1) {
        *k = params[0];
    }
    for k in knots.iter_mut().skip(n) {
        *k = params[n - 1];
    }
    for j in 1..n - degree {
        let sum: f64 = params[j..j + degree].iter().sum();
        knots[j + degree] = sum / degree as f64;
    }
    knots
}

/// Find the knot span index for `u` using binary search. Values left of the
/// data map to the first span and values right of it to the last span, so
/// that the end polynomial pieces are continued outward.
fn find_span(knots: &[f64], n: usize, degree: usize, u: f64) -> usize {
    if u >= knots[n] {
        return n - 1;
    }
    if u <= knots[degree] {
        return degree;
    }
    let mut low = degree;
    let mut high = n;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// The degree+1 basis functions that are non-zero on `span`, evaluated at u
/// (triangular Cox-de Boor recurrence). For u outside the span the same
/// recurrence yields the polynomial continuation of those functions.
fn basis_functions(knots: &[f64], degree: usize, span: usize, u: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;
    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}
