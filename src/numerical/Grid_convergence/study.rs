//! Driver for a configured study: open the three cases, step through the
//! configured times and write reports.
use super::contour_source::ContourSource;
use super::errors::ConvergenceError;
use super::session::ConvergenceSession;
use super::signal::Quantity;
use super::table_source::TableContourSource;
use crate::Utils::logger::{save_history_csv, save_resampled_csv};
use crate::Utils::plots::{plot_history, plot_resampled};
use crate::Utils::study_config::{CaseConfig, StudyConfig};
use log::{error, info, warn};
use std::fs;
use std::path::Path;

/// what happened at one configured time
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// (quantity, order, asymptotic ratio) for every quantity
    Converged {
        time: f64,
        summary: Vec<(Quantity, f64, f64)>,
    },
    Failed {
        time: f64,
        error: ConvergenceError,
    },
}

impl StepOutcome {
    pub fn time(&self) -> f64 {
        match self {
            StepOutcome::Converged { time, .. } | StepOutcome::Failed { time, .. } => *time,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, StepOutcome::Converged { .. })
    }
}

fn open_case(
    case: &CaseConfig,
    config: &StudyConfig,
) -> Result<Box<dyn ContourSource>, ConvergenceError> {
    let source = TableContourSource::open(
        &case.name,
        case.layout,
        &config.contour_field,
        config.contour_value,
        &config.field_names,
    )?
    .with_duplicate_policy(config.duplicate_policy);
    Ok(Box::new(source))
}

/// Build the session from the configured cases (fails fast on missing fields)
pub fn open_session(config: &StudyConfig) -> Result<ConvergenceSession, ConvergenceError> {
    ConvergenceSession::new(
        open_case(&config.coarse, config)?,
        open_case(&config.medium, config)?,
        open_case(&config.fine, config)?,
        config.ratios,
        config.field_names.clone(),
    )
}

/// Step the session through every configured time. A failed time is logged
/// and recorded; the remaining times are still analysed.
pub fn step_through(session: &mut ConvergenceSession, times: &[f64]) -> Vec<StepOutcome> {
    times
        .iter()
        .map(|&time| match session.step_to(time) {
            Ok(()) => StepOutcome::Converged {
                time,
                summary: session
                    .quantities()
                    .iter()
                    .filter_map(|q| {
                        session
                            .latest(q)
                            .map(|r| (q.clone(), r.order, r.asymptotic_ratio))
                    })
                    .collect(),
            },
            Err(err) => StepOutcome::Failed { time, error: err },
        })
        .collect()
}

/// Run the whole study described by `config` and write the configured outputs
pub fn run_study(
    config: &StudyConfig,
) -> Result<(ConvergenceSession, Vec<StepOutcome>), ConvergenceError> {
    let mut session = open_session(config)?;
    let times = config.times.times();
    info!("running {} time steps", times.len());
    let outcomes = step_through(&mut session, &times);

    let failed = outcomes.iter().filter(|o| !o.is_converged()).count();
    if failed > 0 {
        warn!("{} of {} time steps failed", failed, outcomes.len());
    }
    if let Some(report) = &config.report {
        save_history_csv(&session, report)?;
        info!("history written to {}", report.display());
    }
    if let Some(dir) = &config.plots {
        write_plots(&session, dir)?;
    }
    Ok((session, outcomes))
}

/// history plots per quantity and the resampled curves of the last step
fn write_plots(session: &ConvergenceSession, dir: &Path) -> Result<(), ConvergenceError> {
    fs::create_dir_all(dir)?;
    for quantity in session.quantities() {
        let Some(history) = session.history(quantity) else {
            continue;
        };
        if history.is_empty() {
            continue;
        }
        let times: Vec<f64> = history.iter().map(|r| r.time).collect();
        let orders: Vec<f64> = history.iter().map(|r| r.order).collect();
        let ratios: Vec<f64> = history.iter().map(|r| r.asymptotic_ratio).collect();
        let name = quantity.to_string();
        let results = [
            plot_history(
                &times,
                &orders,
                &format!("order of {}", name),
                &dir.join(format!("{}_order.png", name)),
            ),
            plot_history(
                &times,
                &ratios,
                &format!("asymptotic ratio of {}", name),
                &dir.join(format!("{}_asymptotic_ratio.png", name)),
            ),
        ];
        for result in results {
            if let Err(err) = result {
                error!("{}", err);
            }
        }
        if let Some(latest) = history.last() {
            save_resampled_csv(latest, &dir.join(format!("{}_resampled.csv", name)))?;
            let path = dir.join(format!("{}_resampled.png", name));
            if let Err(err) = plot_resampled(latest, &name, &path) {
                error!("{}", err);
            }
        }
    }
    Ok(())
}
