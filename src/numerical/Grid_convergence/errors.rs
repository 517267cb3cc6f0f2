use std::fmt;

/// Error types for the grid convergence pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ConvergenceError {
    /// interpolation domain has zero (or non-finite) width
    InvalidDomain { xmin: f64, xmax: f64 },
    /// domains of the three signals do not overlap
    EmptyOverlap { lower: f64, upper: f64 },
    /// a norm used as a denominator or inside a logarithm is zero
    DegenerateNorm { name: String },
    /// Newton update is undefined (zero derivative, r^p == 1, non-finite residual)
    SingularIteration { order: f64, iteration: usize, reason: String },
    /// Newton loop ran out of iterations; `last_order` is not trustworthy
    IterationBudgetExhausted {
        last_order: f64,
        residual: f64,
        iterations: usize,
    },
    /// requested contour or data array is absent from the data set
    MissingField { case: String, field: String },
    InvalidRefinementRatio { name: String, value: f64 },
    InvalidSignal(String),
    SingularCollocation,
    TimeNotAvailable { case: String, time: f64 },
    NonMonotonicTime { requested: f64, last: f64 },
    Io(String),
    Config(String),
}

impl fmt::Display for ConvergenceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConvergenceError::InvalidDomain { xmin, xmax } => {
                write!(f, "Invalid interpolation domain [{}, {}]", xmin, xmax)
            }
            ConvergenceError::EmptyOverlap { lower, upper } => write!(
                f,
                "Signal domains do not overlap: max of minima {} exceeds min of maxima {}",
                lower, upper
            ),
            ConvergenceError::DegenerateNorm { name } => {
                write!(f, "Degenerate norm: {} is zero", name)
            }
            ConvergenceError::SingularIteration {
                order,
                iteration,
                reason,
            } => write!(
                f,
                "Singular Newton iteration {} at p = {}: {}",
                iteration, order, reason
            ),
            ConvergenceError::IterationBudgetExhausted {
                last_order,
                residual,
                iterations,
            } => write!(
                f,
                "Order solver did not converge in {} iterations (last p = {}, |F| = {:.3e})",
                iterations, last_order, residual
            ),
            ConvergenceError::MissingField { case, field } => {
                write!(f, "{} does not exist in data set {}", field, case)
            }
            ConvergenceError::InvalidRefinementRatio { name, value } => write!(
                f,
                "Refinement ratio {} must be finite and greater than 1, got {}",
                name, value
            ),
            ConvergenceError::InvalidSignal(msg) => write!(f, "Invalid signal: {}", msg),
            ConvergenceError::SingularCollocation => {
                write!(f, "Spline collocation matrix is singular")
            }
            ConvergenceError::TimeNotAvailable { case, time } => {
                write!(f, "Time {} is not available in case {}", time, case)
            }
            ConvergenceError::NonMonotonicTime { requested, last } => write!(
                f,
                "Cannot step back in time: requested {} after {}",
                requested, last
            ),
            ConvergenceError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConvergenceError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ConvergenceError {}

impl From<std::io::Error> for ConvergenceError {
    fn from(err: std::io::Error) -> Self {
        ConvergenceError::Io(err.to_string())
    }
}

impl From<csv::Error> for ConvergenceError {
    fn from(err: csv::Error) -> Self {
        ConvergenceError::Io(err.to_string())
    }
}

impl ConvergenceError {
    /// true for errors raised by the numerical core rather than by data access
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            ConvergenceError::InvalidDomain { .. }
                | ConvergenceError::EmptyOverlap { .. }
                | ConvergenceError::DegenerateNorm { .. }
                | ConvergenceError::SingularIteration { .. }
                | ConvergenceError::IterationBudgetExhausted { .. }
                | ConvergenceError::SingularCollocation
        )
    }
}
