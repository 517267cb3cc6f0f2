/// scalar Newton-Raphson root finding with an explicit convergence flag
pub mod scalar_newton;
/// three-grid convergence analysis: resampling, observed order of accuracy, GCI
pub mod Grid_convergence;
