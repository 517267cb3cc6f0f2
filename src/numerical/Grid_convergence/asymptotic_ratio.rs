//! Grid Convergence Index estimates for the coarse-medium and medium-fine
//! pairs and the asymptotic-range ratio built from them.
//!
//! GCI_cm = Fs / (r_cm^p - 1) * ||f_c - f_m||_2 / ||f_m||_1
//! GCI_mf = Fs / (r_mf^p - 1) * ||f_m - f_f||_2 / ||f_f||_1
//! ratio  = GCI_cm / (GCI_mf * r_mf^p)
//!
//! A ratio close to 1 means the grid family is in the asymptotic range.
use super::errors::ConvergenceError;
use super::order_solver::check_norm;
use super::resampler::{ResampledTriple, SignalDifference};
use super::signal::{RefinementRatios, check_ratio};

/// safety factor of a three-grid study
pub const SAFETY_FACTOR: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsymptoticEstimate {
    pub gci_cm: f64,
    pub gci_mf: f64,
    pub ratio: f64,
}

/// GCI of one grid pair: Fs/(r^p - 1) * diff_norm / reference_norm
fn gci(
    r_p: f64,
    diff_norm: f64,
    reference_norm: f64,
    order: f64,
) -> Result<f64, ConvergenceError> {
    if r_p == 1.0 || !r_p.is_finite() {
        return Err(ConvergenceError::SingularIteration {
            order,
            iteration: 0,
            reason: format!("refinement ratio raised to p is {}", r_p),
        });
    }
    Ok(SAFETY_FACTOR / (r_p - 1.0) * diff_norm / reference_norm)
}

/// Asymptotic ratio for order `p`.
/// `medium_norm` and `fine_norm` are L1 norms of the medium and fine
/// resampled curves; the differences enter through their L2 norms.
pub fn estimate(
    p: f64,
    diff_cm: &SignalDifference,
    diff_mf: &SignalDifference,
    medium_norm: f64,
    fine_norm: f64,
    r_cm: f64,
    r_mf: f64,
) -> Result<AsymptoticEstimate, ConvergenceError> {
    check_ratio("coarse_to_medium", r_cm)?;
    check_ratio("medium_to_fine", r_mf)?;
    check_norm("medium signal", medium_norm)?;
    check_norm("fine signal", fine_norm)?;
    if !p.is_finite() {
        return Err(ConvergenceError::SingularIteration {
            order: p,
            iteration: 0,
            reason: "order is not finite".to_string(),
        });
    }

    let rcm_p = r_cm.powf(p);
    let rmf_p = r_mf.powf(p);
    let gci_cm = gci(rcm_p, diff_cm.l2_norm(), medium_norm, p)?;
    let gci_mf = gci(rmf_p, diff_mf.l2_norm(), fine_norm, p)?;
    if gci_mf == 0.0 || !gci_mf.is_finite() {
        return Err(ConvergenceError::DegenerateNorm {
            name: "medium-fine GCI".to_string(),
        });
    }
    let ratio = gci_cm / (gci_mf * rmf_p);
    Ok(AsymptoticEstimate {
        gci_cm,
        gci_mf,
        ratio,
    })
}

/// `estimate` on a resampled triple, with the norms taken from the triple itself
pub fn estimate_from_resampled(
    p: f64,
    resampled: &ResampledTriple,
    ratios: &RefinementRatios,
) -> Result<AsymptoticEstimate, ConvergenceError> {
    let dx = resampled.grid.spacing();
    estimate(
        p,
        &resampled.diff_coarse_medium(),
        &resampled.diff_medium_fine(),
        super::resampler::l1_norm(&resampled.medium, dx),
        super::resampler::l1_norm(&resampled.fine, dx),
        ratios.coarse_to_medium(),
        ratios.medium_to_fine(),
    )
}
