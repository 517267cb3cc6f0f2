use crate::numerical::Grid_convergence::errors::ConvergenceError;
use crate::numerical::Grid_convergence::session::{ConvergenceResult, ConvergenceSession};
use chrono::Local;
use csv::Writer;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::Path;

/// "debug" | "info" | "warn" | "error" | "off"
pub fn parse_level(level: &str) -> Result<LevelFilter, ConvergenceError> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" => Ok(LevelFilter::Off),
        other => Err(ConvergenceError::Config(format!(
            "unknown log level '{}'",
            other
        ))),
    }
}

/// Terminal logger, plus a `log_<date>_<time>.txt` file logger when `to_file`.
/// Returns the name of the log file. A second call keeps the logger installed
/// by the first one.
pub fn init_logger(level: LevelFilter, to_file: bool) -> Result<Option<String>, ConvergenceError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    let mut file_name = None;
    if to_file {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let name = format!("log_{}.txt", date_and_time);
        loggers.push(WriteLogger::new(level, Config::default(), File::create(&name)?));
        file_name = Some(name);
    }
    let _ = CombinedLogger::init(loggers);
    Ok(file_name)
}

/// one row per step and quantity:
/// time,quantity,order,asymptotic_ratio,gci_cm,gci_mf,iterations
pub fn save_history_csv(session: &ConvergenceSession, path: &Path) -> Result<(), ConvergenceError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record([
        "time",
        "quantity",
        "order",
        "asymptotic_ratio",
        "gci_cm",
        "gci_mf",
        "iterations",
    ])?;
    let histories: Vec<(String, &[ConvergenceResult])> = session
        .quantities()
        .iter()
        .filter_map(|q| session.history(q).map(|h| (q.to_string(), h)))
        .collect();
    for step in 0..session.steps() {
        for (name, history) in &histories {
            if let Some(r) = history.get(step) {
                writer.write_record([
                    r.time.to_string(),
                    name.clone(),
                    r.order.to_string(),
                    r.asymptotic_ratio.to_string(),
                    r.gci_cm.to_string(),
                    r.gci_mf.to_string(),
                    r.iterations.to_string(),
                ])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// shared grid and the three resampled curves: x,coarse,medium,fine
pub fn save_resampled_csv(result: &ConvergenceResult, path: &Path) -> Result<(), ConvergenceError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["x", "coarse", "medium", "fine"])?;
    let resampled = &result.resampled;
    for (i, x) in resampled.grid.points().iter().enumerate() {
        writer.write_record([
            x.to_string(),
            resampled.coarse[i].to_string(),
            resampled.medium[i].to_string(),
            resampled.fine[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
