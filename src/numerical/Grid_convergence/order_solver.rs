//! Observed order of accuracy from three grids with unequal refinement ratios.
//!
//! For difference norms e_cm = |f_c - f_m| and e_mf = |f_m - f_f| the order p
//! satisfies
//!
//! F(p) = p ln r_mf + ln(r_cm^p - 1) - ln(r_mf^p - 1) + ln e_mf - ln e_cm = 0
//!
//! which is solved by Newton-Raphson starting from p = 1. The two logarithms
//! of (r^p - 1) are taken of absolute values so that F stays real for
//! negative trial orders (the quotient of the two brackets is positive for
//! any p != 0).
use super::errors::ConvergenceError;
use super::signal::{RefinementRatios, check_ratio};
use crate::numerical::scalar_newton::{
    NonlinearFunction, RootFindingConfig, RootFindingError, ScalarRootFinder,
};
use log::debug;

pub const DEFAULT_TOLERANCE: f64 = 1e-16;
/// |F| <= 1e-16 is below the rounding noise of F for most inputs, so a
/// Newton step smaller than this (relative to max(1, |p|)) also ends the loop
pub const DEFAULT_STEP_TOLERANCE: f64 = 1e-12;
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
pub const INITIAL_ORDER: f64 = 1.0;

/// F(p) and F'(p) for fixed norms and ratios
#[derive(Debug, Clone, Copy)]
pub struct OrderEquation {
    pub diff_cm: f64,
    pub diff_mf: f64,
    pub r_cm: f64,
    pub r_mf: f64,
}

impl OrderEquation {
    pub fn residual(&self, p: f64) -> f64 {
        let ln_mf = self.r_mf.ln();
        let brackets =
            (self.r_cm.powf(p) - 1.0).abs().ln() - (self.r_mf.powf(p) - 1.0).abs().ln();
        // ln(e_mf) - ln(e_cm) taken as one logarithm of the ratio
        p * ln_mf + brackets + (self.diff_mf / self.diff_cm).ln()
    }

    pub fn derivative(&self, p: f64) -> f64 {
        let ln_mf = self.r_mf.ln();
        let ln_cm = self.r_cm.ln();
        let rmf_p = self.r_mf.powf(p);
        let rcm_p = self.r_cm.powf(p);
        ln_mf - rmf_p * ln_mf / (rmf_p - 1.0) + rcm_p * ln_cm / (rcm_p - 1.0)
    }

    /// true when r_cm^p or r_mf^p equals one and F is undefined
    fn is_singular_at(&self, p: f64) -> bool {
        self.r_cm.powf(p) == 1.0 || self.r_mf.powf(p) == 1.0
    }
}

impl NonlinearFunction for OrderEquation {
    fn evaluate(&self, x: f64) -> f64 {
        if self.is_singular_at(x) {
            return f64::NAN;
        }
        self.residual(x)
    }

    fn derivative(&self, x: f64) -> Option<f64> {
        if self.is_singular_at(x) {
            return Some(f64::NAN);
        }
        Some(OrderEquation::derivative(self, x))
    }

    fn name(&self) -> &str {
        "observed order equation"
    }
}

/// converged observed order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderEstimate {
    pub order: f64,
    /// F at the returned order
    pub residual: f64,
    pub iterations: usize,
}

/// Newton solver for the observed order p
#[derive(Debug, Clone)]
pub struct OrderSolver {
    pub tolerance: f64,
    pub step_tolerance: f64,
    pub max_iterations: usize,
    pub initial_order: f64,
}

impl Default for OrderSolver {
    fn default() -> Self {
        OrderSolver {
            tolerance: DEFAULT_TOLERANCE,
            step_tolerance: DEFAULT_STEP_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            initial_order: INITIAL_ORDER,
        }
    }
}

impl OrderSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn solve_with_ratios(
        &self,
        diff_cm: f64,
        diff_mf: f64,
        ratios: &RefinementRatios,
    ) -> Result<OrderEstimate, ConvergenceError> {
        self.solve(
            diff_cm,
            diff_mf,
            ratios.coarse_to_medium(),
            ratios.medium_to_fine(),
        )
    }

    /// Solve F(p) = 0. A zero difference norm means two grids agree exactly
    /// and no finite order exists; it is reported as `DegenerateNorm`.
    pub fn solve(
        &self,
        diff_cm: f64,
        diff_mf: f64,
        r_cm: f64,
        r_mf: f64,
    ) -> Result<OrderEstimate, ConvergenceError> {
        check_ratio("coarse_to_medium", r_cm)?;
        check_ratio("medium_to_fine", r_mf)?;
        check_norm("coarse-medium difference", diff_cm)?;
        check_norm("medium-fine difference", diff_mf)?;

        let equation = OrderEquation {
            diff_cm,
            diff_mf,
            r_cm,
            r_mf,
        };
        let finder = ScalarRootFinder::with_config(RootFindingConfig {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            step_tolerance: self.step_tolerance,
        });

        let result = finder
            .newton_raphson(&equation, self.initial_order)
            .map_err(|err| match err {
                RootFindingError::DerivativeZero { x, iteration } => {
                    ConvergenceError::SingularIteration {
                        order: x,
                        iteration,
                        reason: "F'(p) is zero".to_string(),
                    }
                }
                RootFindingError::NonFiniteValue { x, iteration } => {
                    let reason = if equation.is_singular_at(x) {
                        "refinement ratio raised to p equals 1".to_string()
                    } else {
                        "F(p) or F'(p) is not finite".to_string()
                    };
                    ConvergenceError::SingularIteration {
                        order: x,
                        iteration,
                        reason,
                    }
                }
                RootFindingError::InvalidInput(msg) => ConvergenceError::SingularIteration {
                    order: self.initial_order,
                    iteration: 0,
                    reason: msg,
                },
            })?;

        if !result.converged {
            return Err(ConvergenceError::IterationBudgetExhausted {
                last_order: result.root,
                residual: result.function_value.abs(),
                iterations: result.iterations,
            });
        }
        debug!(
            "observed order p = {} after {} iterations (|F| = {:e})",
            result.root,
            result.iterations,
            result.function_value.abs()
        );
        Ok(OrderEstimate {
            order: result.root,
            residual: result.function_value,
            iterations: result.iterations,
        })
    }
}

pub(crate) fn check_norm(name: &str, value: f64) -> Result<(), ConvergenceError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConvergenceError::DegenerateNorm {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// norms produced by f_k = f_exact + C h_k^p0
    fn synthetic_norms(p0: f64, r_cm: f64, r_mf: f64, c: f64, h_fine: f64) -> (f64, f64) {
        let h_medium = h_fine * r_mf;
        let h_coarse = h_medium * r_cm;
        let diff_cm = c * (h_coarse.powf(p0) - h_medium.powf(p0)).abs();
        let diff_mf = c * (h_medium.powf(p0) - h_fine.powf(p0)).abs();
        (diff_cm, diff_mf)
    }

    #[test]
    fn test_recovers_known_order() {
        let solver = OrderSolver::new();
        for &p0 in &[0.5, 1.0, 1.5, 2.0, 3.0, 4.0] {
            for &(r_cm, r_mf) in &[(2.0_f64, 2.0_f64), (1.5, 2.0), (2.0, 1.5), (3.0, 1.3), (1.25, 2.5)] {
                let (diff_cm, diff_mf) = synthetic_norms(p0, r_cm, r_mf, 0.7, 0.01);
                let est = solver.solve(diff_cm, diff_mf, r_cm, r_mf).unwrap();
                assert_relative_eq!(est.order, p0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_equal_ratios_closed_form() {
        let solver = OrderSolver::new();
        let est = solver.solve(0.4, 0.1, 2.0, 2.0).unwrap();
        assert_relative_eq!(est.order, 2.0, epsilon = 1e-12);
        assert!(est.iterations <= 3);
    }

    #[test]
    fn test_diverging_family_gives_negative_order() {
        // the coarse-medium difference is smaller than the medium-fine one
        let solver = OrderSolver::new();
        let est = solver.solve(0.1, 0.4, 2.0, 2.0).unwrap();
        assert_relative_eq!(est.order, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_order_non_decreasing_in_diff_cm() {
        let solver = OrderSolver::new();
        let diff_mf = 0.05;
        for &(r_cm, r_mf) in &[(2.0_f64, 2.0_f64), (1.5, 2.0), (3.0, 1.3), (1.25, 2.5)] {
            let eq = |p: f64| diff_mf * r_mf.powf(p) * (r_cm.powf(p) - 1.0) / (r_mf.powf(p) - 1.0);
            // sweep diff_cm over the range spanned by orders 0.4 .. 4.5
            let lo = eq(0.4);
            let hi = eq(4.5);
            let mut previous = f64::NEG_INFINITY;
            for i in 0..=40 {
                let diff_cm = lo + (hi - lo) * i as f64 / 40.0;
                let p = solver.solve(diff_cm, diff_mf, r_cm, r_mf).unwrap().order;
                assert!(p >= previous, "p = {} after {}", p, previous);
                previous = p;
            }
        }
    }

    #[test]
    fn test_zero_norm_is_degenerate() {
        let solver = OrderSolver::new();
        assert!(matches!(
            solver.solve(0.0, 0.3, 2.0, 2.0),
            Err(ConvergenceError::DegenerateNorm { .. })
        ));
        assert!(matches!(
            solver.solve(0.3, 0.0, 2.0, 2.0),
            Err(ConvergenceError::DegenerateNorm { .. })
        ));
        assert!(matches!(
            solver.solve(f64::NAN, 0.3, 2.0, 2.0),
            Err(ConvergenceError::DegenerateNorm { .. })
        ));
    }

    #[test]
    fn test_sub_unity_ratio_rejected() {
        let solver = OrderSolver::new();
        assert!(matches!(
            solver.solve(0.3, 0.1, 0.5, 2.0),
            Err(ConvergenceError::InvalidRefinementRatio { .. })
        ));
        assert!(matches!(
            solver.solve(0.3, 0.1, 2.0, -2.0),
            Err(ConvergenceError::InvalidRefinementRatio { .. })
        ));
        assert!(matches!(
            solver.solve(0.3, 0.1, 2.0, 1.0),
            Err(ConvergenceError::InvalidRefinementRatio { .. })
        ));
    }

    #[test]
    fn test_zero_order_is_singular() {
        // equal norms and equal ratios put the Newton iterate exactly on p = 0
        let solver = OrderSolver::new();
        let res = solver.solve(0.2, 0.2, 2.0, 2.0);
        assert!(matches!(
            res,
            Err(ConvergenceError::SingularIteration { .. })
        ));
    }

    #[test]
    fn test_budget_exhaustion_reported() {
        let solver = OrderSolver {
            tolerance: 0.0,
            step_tolerance: 0.0,
            max_iterations: 1,
            initial_order: 1.0,
        };
        let (diff_cm, diff_mf) = synthetic_norms(2.0, 3.0, 1.3, 1.0, 0.1);
        match solver.solve(diff_cm, diff_mf, 3.0, 1.3) {
            Err(ConvergenceError::IterationBudgetExhausted {
                last_order,
                iterations,
                ..
            }) => {
                assert_eq!(iterations, 1);
                assert!(last_order.is_finite());
            }
            other => panic!("expected budget exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_alternative_formulation_is_equivalent() {
        // log(dcm/dmf) - log(rmf^p (rcm^p - 1)/(rmf^p - 1)) == -F(p)
        let eq = OrderEquation {
            diff_cm: 0.37,
            diff_mf: 0.08,
            r_cm: 2.4,
            r_mf: 1.7,
        };
        for &p in &[0.3, 1.0, 1.8, 2.5, 4.0] {
            let alt = (eq.diff_cm / eq.diff_mf).ln()
                - (eq.r_mf.powf(p) * (eq.r_cm.powf(p) - 1.0) / (eq.r_mf.powf(p) - 1.0)).ln();
            assert_relative_eq!(alt, -eq.residual(p), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let eq = OrderEquation {
            diff_cm: 0.37,
            diff_mf: 0.08,
            r_cm: 2.4,
            r_mf: 1.7,
        };
        for &p in &[-1.5, 0.4, 1.0, 2.2, 3.5] {
            let h = 1e-6;
            let fd = (eq.residual(p + h) - eq.residual(p - h)) / (2.0 * h);
            assert_relative_eq!(eq.derivative(p), fd, epsilon = 1e-6);
        }
    }
}
