//! Scalar Newton-Raphson root finding with an explicit convergence flag.
//!
//! Unlike a plain loop that returns whatever iterate it ends on, the result
//! always says whether the tolerance was met, so callers can refuse an
//! unconverged root.
use log::{debug, warn};
use std::fmt;

/// Error types for scalar root finding
#[derive(Debug, Clone, PartialEq)]
pub enum RootFindingError {
    /// f'(x) vanished (or is too small to divide by)
    DerivativeZero { x: f64, iteration: usize },
    /// f(x) or f'(x) is NaN/inf
    NonFiniteValue { x: f64, iteration: usize },
    InvalidInput(String),
}

impl fmt::Display for RootFindingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RootFindingError::DerivativeZero { x, iteration } => {
                write!(f, "Derivative is zero at x = {} (iteration {})", x, iteration)
            }
            RootFindingError::NonFiniteValue { x, iteration } => write!(
                f,
                "Function or derivative is not finite at x = {} (iteration {})",
                x, iteration
            ),
            RootFindingError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for RootFindingError {}

/// Trait for representing a nonlinear equation f(x) = 0
pub trait NonlinearFunction {
    /// Evaluate the function at point x
    fn evaluate(&self, x: f64) -> f64;

    /// Analytical derivative, if the function has one
    fn derivative(&self, _x: f64) -> Option<f64> {
        None
    }

    /// Get function name for debugging/logging
    fn name(&self) -> &str {
        "unnamed_function"
    }
}

/// Function wrapper with analytical derivative
pub struct FunctionWithDerivative<F, D>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    func: F,
    derivative_func: D,
    name: String,
}

impl<F, D> FunctionWithDerivative<F, D>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    pub fn new(func: F, derivative_func: D, name: String) -> Self {
        Self {
            func,
            derivative_func,
            name,
        }
    }
}

impl<F, D> NonlinearFunction for FunctionWithDerivative<F, D>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    fn evaluate(&self, x: f64) -> f64 {
        (self.func)(x)
    }

    fn derivative(&self, x: f64) -> Option<f64> {
        Some((self.derivative_func)(x))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Result structure for root finding
#[derive(Debug, Clone, PartialEq)]
pub struct RootFindingResult {
    pub root: f64,
    pub function_value: f64,
    pub iterations: usize,
    /// false when the iteration budget ran out before the tolerance was met
    pub converged: bool,
}

/// Configuration for root finding
#[derive(Debug, Clone)]
pub struct RootFindingConfig {
    /// stop when |f(x)| <= tolerance
    pub tolerance: f64,
    pub max_iterations: usize,
    /// stop when |dx| <= step_tolerance * max(1, |x|), i.e. the iterate no longer moves
    pub step_tolerance: f64,
}

impl Default for RootFindingConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
            step_tolerance: 4.0 * f64::EPSILON,
        }
    }
}

/// Newton-Raphson solver for scalar equations
pub struct ScalarRootFinder {
    config: RootFindingConfig,
}

impl ScalarRootFinder {
    pub fn new() -> Self {
        Self {
            config: RootFindingConfig::default(),
        }
    }

    pub fn with_config(config: RootFindingConfig) -> Self {
        Self { config }
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.config.tolerance = tolerance;
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    pub fn config(&self) -> &RootFindingConfig {
        &self.config
    }

    /// Newton-Raphson iteration x <- x - f(x)/f'(x) starting at `x`.
    /// Uses a central difference if the function has no analytical derivative.
    /// Running out of iterations is not an error: the last iterate is
    /// returned with `converged == false`.
    pub fn newton_raphson<F>(
        &self,
        function: &F,
        mut x: f64,
    ) -> Result<RootFindingResult, RootFindingError>
    where
        F: NonlinearFunction,
    {
        if !x.is_finite() {
            return Err(RootFindingError::InvalidInput(format!(
                "initial guess {} is not finite",
                x
            )));
        }
        if self.config.max_iterations == 0 {
            return Err(RootFindingError::InvalidInput(
                "max_iterations must be positive".to_string(),
            ));
        }
        debug!(
            "Newton-Raphson for {}: x0 = {}, tolerance = {:e}",
            function.name(),
            x,
            self.config.tolerance
        );

        let mut fx = function.evaluate(x);
        for iteration in 0..self.config.max_iterations {
            if !fx.is_finite() {
                return Err(RootFindingError::NonFiniteValue { x, iteration });
            }
            if fx.abs() <= self.config.tolerance {
                return Ok(RootFindingResult {
                    root: x,
                    function_value: fx,
                    iterations: iteration,
                    converged: true,
                });
            }

            let fpx = match function.derivative(x) {
                Some(deriv) => deriv,
                None => {
                    let h = 1e-8 * x.abs().max(1.0);
                    (function.evaluate(x + h) - function.evaluate(x - h)) / (2.0 * h)
                }
            };
            if !fpx.is_finite() {
                return Err(RootFindingError::NonFiniteValue { x, iteration });
            }
            if fpx.abs() < 1e-300 {
                return Err(RootFindingError::DerivativeZero { x, iteration });
            }

            let dx = fx / fpx;
            let x_new = x - dx;
            debug!(
                "iteration {}: x = {:.16}, f(x) = {:.3e}, dx = {:.3e}",
                iteration + 1,
                x,
                fx,
                dx
            );
            x = x_new;
            fx = function.evaluate(x);

            // the iterate stopped moving at machine resolution
            if dx.abs() <= self.config.step_tolerance * x.abs().max(1.0) && fx.is_finite() {
                return Ok(RootFindingResult {
                    root: x,
                    function_value: fx,
                    iterations: iteration + 1,
                    converged: true,
                });
            }
        }

        warn!(
            "Newton-Raphson for {} hit the iteration limit ({}), |f| = {:e}",
            function.name(),
            self.config.max_iterations,
            fx.abs()
        );
        Ok(RootFindingResult {
            root: x,
            function_value: fx,
            iterations: self.config.max_iterations,
            converged: false,
        })
    }
}

impl Default for ScalarRootFinder {
    fn default() -> Self {
        Self::new()
    }
}
