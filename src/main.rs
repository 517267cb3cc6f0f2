#![allow(non_snake_case)]
use RustedConvergence::Utils::logger::{init_logger, parse_level};
use RustedConvergence::Utils::study_config::StudyConfig;
use RustedConvergence::numerical::Grid_convergence::study::{StepOutcome, run_study};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// Three-grid convergence study of an interface contour
#[derive(Parser, Debug)]
#[command(name = "RustedConvergence")]
#[command(version)]
#[command(about = "Observed order of accuracy and asymptotic ratio of a coarse/medium/fine case family", long_about = None)]
struct Args {
    /// task document describing the three cases, times and outputs
    #[arg(value_name = "TASK")]
    task: PathBuf,

    /// overrides logging.level of the task document
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let mut config = match StudyConfig::from_file(&args.task) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}: {}", args.task.display(), err);
            return ExitCode::from(2);
        }
    };
    if let Some(level) = &args.log_level {
        match parse_level(level) {
            Ok(level) => config.log_level = level,
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::from(2);
            }
        }
    }
    match init_logger(config.log_level, config.log_to_file) {
        Ok(Some(file)) => info!("logging to {}", file),
        Ok(None) => {}
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(2);
        }
    }

    match run_study(&config) {
        Ok((_, outcomes)) => {
            for outcome in &outcomes {
                match outcome {
                    StepOutcome::Converged { time, summary } => {
                        for (quantity, order, ratio) in summary {
                            println!(
                                "t = {:<10} {:<12} p = {:.6}  ratio = {:.6}",
                                time,
                                quantity.to_string(),
                                order,
                                ratio
                            );
                        }
                    }
                    StepOutcome::Failed { error, .. } => {
                        println!("t = {:<10} failed: {}", outcome.time(), error);
                    }
                }
            }
            if outcomes.iter().any(|o| o.is_converged()) {
                ExitCode::SUCCESS
            } else {
                error!("no time step converged");
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
