//! Three-grid convergence session: steps coarse, medium and fine sources in
//! time and keeps the per-quantity history of observed order and asymptotic
//! ratio.
use super::asymptotic_ratio::estimate_from_resampled;
use super::contour_source::ContourSource;
use super::errors::ConvergenceError;
use super::order_solver::OrderSolver;
use super::resampler::{EvaluationGrid, ResampledTriple, resample};
use super::signal::{Quantity, RefinementRatios, Signal};
use log::{error, info};
use nalgebra::DVector;
use rayon::prelude::*;
use tabled::{builder::Builder, settings::Style};

/// Analysis of one quantity at one time
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceResult {
    pub time: f64,
    /// index of the successful step that produced this result
    pub step: usize,
    pub order: f64,
    /// Newton iterations spent on `order`
    pub iterations: usize,
    pub asymptotic_ratio: f64,
    pub gci_cm: f64,
    pub gci_mf: f64,
    /// L1 norm of coarse minus medium on the shared grid
    pub diff_cm_norm: f64,
    /// L1 norm of medium minus fine on the shared grid
    pub diff_mf_norm: f64,
    pub resampled: ResampledTriple,
}

/// Resample one signal triple and run the order and asymptotic ratio estimates
pub fn analyse_triple(
    coarse: &Signal,
    medium: &Signal,
    fine: &Signal,
    ratios: &RefinementRatios,
    solver: &OrderSolver,
    time: f64,
    step: usize,
) -> Result<ConvergenceResult, ConvergenceError> {
    let resampled = resample(coarse, medium, fine)?;
    let diff_cm_norm = resampled.diff_coarse_medium().l1_norm();
    let diff_mf_norm = resampled.diff_medium_fine().l1_norm();
    let estimate = solver.solve_with_ratios(diff_cm_norm, diff_mf_norm, ratios)?;
    let asymptotic = estimate_from_resampled(estimate.order, &resampled, ratios)?;
    Ok(ConvergenceResult {
        time,
        step,
        order: estimate.order,
        iterations: estimate.iterations,
        asymptotic_ratio: asymptotic.ratio,
        gci_cm: asymptotic.gci_cm,
        gci_mf: asymptotic.gci_mf,
        diff_cm_norm,
        diff_mf_norm,
        resampled,
    })
}

pub struct ConvergenceSession {
    coarse: Box<dyn ContourSource>,
    medium: Box<dyn ContourSource>,
    fine: Box<dyn ContourSource>,
    ratios: RefinementRatios,
    field_names: Vec<String>,
    quantities: Vec<Quantity>,
    /// one history per quantity, same order as `quantities`
    histories: Vec<Vec<ConvergenceResult>>,
    solver: OrderSolver,
    last_time: Option<f64>,
    steps: usize,
}

impl ConvergenceSession {
    /// Tracks the interface height plus every name in `field_names`.
    /// All three sources must provide every field; names must be unique and
    /// differ from `height`.
    pub fn new(
        coarse: Box<dyn ContourSource>,
        medium: Box<dyn ContourSource>,
        fine: Box<dyn ContourSource>,
        ratios: RefinementRatios,
        field_names: Vec<String>,
    ) -> Result<Self, ConvergenceError> {
        for (i, name) in field_names.iter().enumerate() {
            if name == "height" || field_names[..i].contains(name) {
                return Err(ConvergenceError::Config(format!(
                    "field '{}' is listed twice or shadows the interface height",
                    name
                )));
            }
        }
        for source in [&coarse, &medium, &fine] {
            source.validate_fields(&field_names)?;
        }
        let mut quantities = vec![Quantity::Height];
        quantities.extend(field_names.iter().cloned().map(Quantity::Field));
        let histories = vec![Vec::new(); quantities.len()];
        info!(
            "convergence session: {} / {} / {}, r_cm = {}, r_mf = {}, quantities: {}",
            coarse.case_name(),
            medium.case_name(),
            fine.case_name(),
            ratios.coarse_to_medium(),
            ratios.medium_to_fine(),
            quantities
                .iter()
                .map(|q| q.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(ConvergenceSession {
            coarse,
            medium,
            fine,
            ratios,
            field_names,
            quantities,
            histories,
            solver: OrderSolver::default(),
            last_time: None,
            steps: 0,
        })
    }

    pub fn with_solver(mut self, solver: OrderSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Step all sources to `time` and analyse every quantity.
    /// Results are appended only when every quantity succeeds; on error the
    /// histories keep the previous step and the session stays usable.
    /// Stepping to the last successful time again is allowed.
    pub fn step_to(&mut self, time: f64) -> Result<(), ConvergenceError> {
        match self.try_step(time) {
            Ok(results) => {
                for (history, result) in self.histories.iter_mut().zip(results) {
                    history.push(result);
                }
                self.last_time = Some(time);
                self.steps += 1;
                self.log_summary();
                Ok(())
            }
            Err(err) => {
                error!("step to t = {} failed: {}", time, err);
                Err(err)
            }
        }
    }

    fn try_step(&mut self, time: f64) -> Result<Vec<ConvergenceResult>, ConvergenceError> {
        if let Some(last) = self.last_time {
            if time < last {
                return Err(ConvergenceError::NonMonotonicTime {
                    requested: time,
                    last,
                });
            }
        }
        self.coarse.step_to(time)?;
        self.medium.step_to(time)?;
        self.fine.step_to(time)?;

        let (coarse_h, coarse_f) = self.coarse.contour_with_fields(&self.field_names)?;
        let (medium_h, medium_f) = self.medium.contour_with_fields(&self.field_names)?;
        let (fine_h, fine_f) = self.fine.contour_with_fields(&self.field_names)?;
        let mut triples = vec![(coarse_h, medium_h, fine_h)];
        triples.extend(
            coarse_f
                .into_iter()
                .zip(medium_f)
                .zip(fine_f)
                .map(|((c, m), f)| (c, m, f)),
        );
        if triples.len() != self.quantities.len() {
            return Err(ConvergenceError::InvalidSignal(format!(
                "sources returned {} signals for {} quantities",
                triples.len(),
                self.quantities.len()
            )));
        }

        let step = self.steps;
        let ratios = &self.ratios;
        let solver = &self.solver;
        // quantities are independent; collect keeps declaration order
        triples
            .par_iter()
            .map(|(c, m, f)| analyse_triple(c, m, f, ratios, solver, time, step))
            .collect()
    }

    fn log_summary(&self) {
        let mut builder = Builder::default();
        builder.push_record(["quantity", "order", "asymptotic ratio", "GCI cm", "GCI mf"]);
        for (quantity, history) in self.quantities.iter().zip(&self.histories) {
            if let Some(r) = history.last() {
                builder.push_record([
                    quantity.to_string(),
                    format!("{:.6}", r.order),
                    format!("{:.6}", r.asymptotic_ratio),
                    format!("{:.4e}", r.gci_cm),
                    format!("{:.4e}", r.gci_mf),
                ]);
            }
        }
        let mut table = builder.build();
        table.with(Style::modern_rounded());
        info!(
            "\n step {} at t = {}\n{}",
            self.steps - 1,
            self.last_time.unwrap_or(f64::NAN),
            table
        );
    }

    fn index_of(&self, quantity: &Quantity) -> Option<usize> {
        self.quantities.iter().position(|q| q == quantity)
    }

    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn ratios(&self) -> &RefinementRatios {
        &self.ratios
    }

    /// all results for `quantity`, oldest first
    pub fn history(&self, quantity: &Quantity) -> Option<&[ConvergenceResult]> {
        self.index_of(quantity)
            .map(|i| self.histories[i].as_slice())
    }

    pub fn latest(&self, quantity: &Quantity) -> Option<&ConvergenceResult> {
        self.history(quantity).and_then(|h| h.last())
    }

    /// observed order at the most recent step
    pub fn order(&self, quantity: &Quantity) -> Option<f64> {
        self.latest(quantity).map(|r| r.order)
    }

    /// asymptotic ratio at the most recent step
    pub fn asymptotic_ratio(&self, quantity: &Quantity) -> Option<f64> {
        self.latest(quantity).map(|r| r.asymptotic_ratio)
    }

    /// coarse, medium and fine curves on the shared grid at the most recent step
    pub fn resampled(
        &self,
        quantity: &Quantity,
    ) -> Option<(&DVector<f64>, &DVector<f64>, &DVector<f64>)> {
        self.latest(quantity)
            .map(|r| (&r.resampled.coarse, &r.resampled.medium, &r.resampled.fine))
    }

    /// shared evaluation grid of the most recent step
    pub fn grid(&self) -> Option<&EvaluationGrid> {
        self.latest(&Quantity::Height).map(|r| &r.resampled.grid)
    }

    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    /// number of successful steps
    pub fn steps(&self) -> usize {
        self.steps
    }
}
