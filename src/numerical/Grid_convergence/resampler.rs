//! Common evaluation grid for a coarse/medium/fine signal triple and the
//! discrete norms used to compare the resampled curves.
use super::errors::ConvergenceError;
use super::signal::Signal;
use super::spline_interp::SplineInterpolator;
use itertools::Itertools;
use nalgebra::DVector;

/// evaluation grid density relative to the fine signal's sample count
pub const GRID_DENSITY: usize = 2;

/// Equally spaced positions over the overlap of three signal domains
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationGrid {
    points: DVector<f64>,
}

impl EvaluationGrid {
    /// `n` equally spaced points with both ends hit exactly
    pub fn linspace(start: f64, end: f64, n: usize) -> Result<Self, ConvergenceError> {
        if n < 2 || !(end > start) {
            return Err(ConvergenceError::InvalidDomain {
                xmin: start,
                xmax: end,
            });
        }
        let step = (end - start) / (n - 1) as f64;
        let mut points = DVector::from_fn(n, |i, _| start + i as f64 * step);
        points[n - 1] = end;
        Ok(EvaluationGrid { points })
    }

    pub fn points(&self) -> &DVector<f64> {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn spacing(&self) -> f64 {
        self.points[1] - self.points[0]
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.points[0], self.points[self.points.len() - 1])
    }
}

/// coarse, medium and fine curves evaluated on one grid
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledTriple {
    pub grid: EvaluationGrid,
    pub coarse: DVector<f64>,
    pub medium: DVector<f64>,
    pub fine: DVector<f64>,
}

impl ResampledTriple {
    /// coarse minus medium, pointwise
    pub fn diff_coarse_medium(&self) -> SignalDifference {
        SignalDifference::new(&self.coarse - &self.medium, self.grid.spacing())
    }

    /// medium minus fine, pointwise
    pub fn diff_medium_fine(&self) -> SignalDifference {
        SignalDifference::new(&self.medium - &self.fine, self.grid.spacing())
    }
}

/// pointwise difference of two resampled curves together with the grid spacing
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDifference {
    pub values: DVector<f64>,
    pub spacing: f64,
}

impl SignalDifference {
    pub fn new(values: DVector<f64>, spacing: f64) -> Self {
        SignalDifference { values, spacing }
    }

    pub fn l1_norm(&self) -> f64 {
        l1_norm(&self.values, self.spacing)
    }

    pub fn l2_norm(&self) -> f64 {
        l2_norm(&self.values, self.spacing)
    }
}

/// dx * sum |v_i|
pub fn l1_norm(values: &DVector<f64>, dx: f64) -> f64 {
    dx * values.iter().map(|v| v.abs()).sum::<f64>()
}

/// sqrt(dx * sum v_i^2)
pub fn l2_norm(values: &DVector<f64>, dx: f64) -> f64 {
    dx.sqrt() * values.norm()
}

/// [max of minima, min of maxima] of the signals' position domains
pub fn overlap_domain(signals: &[&Signal]) -> Result<(f64, f64), ConvergenceError> {
    let lower = signals
        .iter()
        .map(|s| s.domain().0)
        .fold(f64::NEG_INFINITY, f64::max);
    let upper = signals
        .iter()
        .map(|s| s.domain().1)
        .fold(f64::INFINITY, f64::min);
    if signals.is_empty() || lower > upper {
        return Err(ConvergenceError::EmptyOverlap { lower, upper });
    }
    Ok((lower, upper))
}

/// Resample coarse, medium and fine signals onto a shared grid of
/// 2 x (fine sample count) points spanning the overlap of their domains.
/// Each interpolant is scaled over the overlap domain.
pub fn resample(
    coarse: &Signal,
    medium: &Signal,
    fine: &Signal,
) -> Result<ResampledTriple, ConvergenceError> {
    let (lower, upper) = overlap_domain(&[coarse, medium, fine])?;
    let coarse_spline = SplineInterpolator::from_signal(coarse, lower, upper)?;
    let medium_spline = SplineInterpolator::from_signal(medium, lower, upper)?;
    let fine_spline = SplineInterpolator::from_signal(fine, lower, upper)?;

    let grid = EvaluationGrid::linspace(lower, upper, GRID_DENSITY * fine.len())?;
    let (coarse, medium, fine) = [coarse_spline, medium_spline, fine_spline]
        .iter()
        .map(|spline| spline.evaluate_many(grid.points()))
        .collect_tuple()
        .ok_or_else(|| ConvergenceError::InvalidSignal("resampling failed".to_string()))?;

    Ok(ResampledTriple {
        grid,
        coarse,
        medium,
        fine,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sampled(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> Signal {
        let x: Vec<f64> = (0..n)
            .map(|i| a + (b - a) * i as f64 / (n - 1) as f64)
            .collect();
        let y = x.iter().map(|&xi| f(xi)).collect();
        Signal::new(x, y).unwrap()
    }

    #[test]
    fn test_linspace_endpoints_exact() {
        let grid = EvaluationGrid::linspace(0.1, 0.7, 7).unwrap();
        assert_eq!(grid.bounds(), (0.1, 0.7));
        assert_eq!(grid.len(), 7);
        assert_relative_eq!(grid.spacing(), 0.1, epsilon = 1e-15);
        assert!(EvaluationGrid::linspace(1.0, 1.0, 5).is_err());
        assert!(EvaluationGrid::linspace(0.0, 1.0, 1).is_err());
    }

    #[test]
    fn test_grid_spans_overlap() {
        let triples = [
            ((0.0, 10.0), (-1.0, 9.0), (0.5, 12.0)),
            ((2.0, 3.0), (1.0, 4.0), (0.0, 5.0)),
            ((-5.0, 5.0), (-5.0, 5.0), (-5.0, 5.0)),
            ((0.0, 1.0), (0.3, 2.0), (-1.0, 0.9)),
        ];
        for ((ca, cb), (ma, mb), (fa, fb)) in triples {
            let c = sampled(|x| x.cos(), ca, cb, 5);
            let m = sampled(|x| x.cos(), ma, mb, 9);
            let f = sampled(|x| x.cos(), fa, fb, 17);
            let res = resample(&c, &m, &f).unwrap();
            // the sampled ends may differ from the nominal ones by rounding
            let ((c0, c1), (m0, m1), (f0, f1)) = (c.domain(), m.domain(), f.domain());
            let lower = c0.max(m0).max(f0);
            let upper = c1.min(m1).min(f1);
            assert_eq!(res.grid.bounds(), (lower, upper));
            assert_eq!(res.grid.len(), 34);
            assert_eq!(res.coarse.len(), 34);
            assert!(res.grid.points().as_slice().windows(2).all(|w| w[1] > w[0]));
        }
    }

    #[test]
    fn test_empty_overlap() {
        let c = sampled(|x| x, 0.0, 1.0, 5);
        let m = sampled(|x| x, 2.0, 3.0, 9);
        let f = sampled(|x| x, 0.0, 3.0, 17);
        let res = resample(&c, &m, &f);
        assert!(matches!(res, Err(ConvergenceError::EmptyOverlap { .. })));
    }

    #[test]
    fn test_touching_domains_are_degenerate() {
        let c = sampled(|x| x, 0.0, 1.0, 5);
        let m = sampled(|x| x, 1.0, 3.0, 9);
        let f = sampled(|x| x, 0.0, 3.0, 17);
        let res = resample(&c, &m, &f);
        assert!(matches!(res, Err(ConvergenceError::InvalidDomain { .. })));
    }

    #[test]
    fn test_identical_cubic_signals_resample_identically() {
        let f = |x: f64| 0.1 * x * x * x - x + 2.0;
        let c = sampled(f, 0.0, 10.0, 5);
        let m = sampled(f, 0.0, 10.0, 9);
        let fi = sampled(f, 0.0, 10.0, 17);
        let res = resample(&c, &m, &fi).unwrap();
        assert!(res.diff_coarse_medium().l1_norm() < 1e-9);
        assert!(res.diff_medium_fine().l2_norm() < 1e-9);
    }

    #[test]
    fn test_norms() {
        let v = DVector::from_vec(vec![3.0, -4.0]);
        assert_relative_eq!(l1_norm(&v, 0.5), 3.5, epsilon = 1e-15);
        assert_relative_eq!(l2_norm(&v, 4.0), 10.0, epsilon = 1e-15);
        let d = SignalDifference::new(v, 1.0);
        assert_relative_eq!(d.l1_norm(), 7.0, epsilon = 1e-15);
        assert_relative_eq!(d.l2_norm(), 5.0, epsilon = 1e-15);
    }
}
