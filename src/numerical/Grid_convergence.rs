//! Three-grid convergence analysis of interface contours.
//!
//! Coarse, medium and fine solutions of one case are sampled along the
//! interface contour, resampled onto a shared grid with B-splines, and
//! compared: the observed order of accuracy p comes from Newton iteration on
//! the three-grid order equation with unequal refinement ratios, and the
//! asymptotic ratio GCI_cm / (GCI_mf r_mf^p) tells whether the grid family is
//! in the asymptotic range.
//!
//! ```
//! use RustedConvergence::numerical::Grid_convergence::analytic_source::AnalyticContourSource;
//! use RustedConvergence::numerical::Grid_convergence::session::ConvergenceSession;
//! use RustedConvergence::numerical::Grid_convergence::signal::{Quantity, RefinementRatios};
//! // heights carry a discretization error C h^2
//! let level = |name: &str, n: usize| {
//!     let h = 1.0 / (n - 1) as f64;
//!     Box::new(AnalyticContourSource::new(name, 0.0, 1.0, n, move |x, t| x * x + t + h * h).unwrap())
//! };
//! let mut session = ConvergenceSession::new(
//!     level("coarse", 5),
//!     level("medium", 9),
//!     level("fine", 17),
//!     RefinementRatios::new(2.0, 2.0).unwrap(),
//!     vec![],
//! )
//! .unwrap();
//! session.step_to(0.5).unwrap();
//! let p = session.order(&Quantity::Height).unwrap();
//! assert!((p - 2.0).abs() < 1e-6);
//! ```
/// analytic (closure backed) contour source
pub mod analytic_source;
/// Grid Convergence Index and asymptotic ratio
pub mod asymptotic_ratio;
/// contour source trait and case layout
pub mod contour_source;
/// error type of the pipeline
pub mod errors;
/// observed order of accuracy by Newton iteration
pub mod order_solver;
/// shared evaluation grid, resampling and discrete norms
pub mod resampler;
/// time-stepped three-grid session with per-quantity history
pub mod session;
/// signals, quantities, refinement ratios, duplicate handling
pub mod signal;
/// interpolating B-spline
pub mod spline_interp;
/// configured study driver
pub mod study;
/// csv backed contour source
pub mod table_source;
