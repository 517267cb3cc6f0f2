//! File-backed contour source over pre-extracted interface points.
//!
//! A case directory holds one subdirectory per written time (named by the
//! time value) with a `contour.csv` inside:
//!
//! ```text
//! reconstructed:  <case>/<time>/contour.csv
//! decomposed:     <case>/processor<N>/<time>/contour.csv
//! ```
//!
//! The csv header names the columns; `x` and `y` are required, as are the
//! contour field and every requested data field. A `z` column, when present,
//! restricts the samples to the z = 0 slice. Time 0 is skipped (initial
//! conditions carry no discretization error to compare).
use super::contour_source::{CaseLayout, ContourSource};
use super::errors::ConvergenceError;
use super::signal::{DuplicatePolicy, Signal, collapse_coincident};
use csv::{ReaderBuilder, Trim};
use log::{debug, info};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONTOUR_FILE: &str = "contour.csv";
const THRESHOLD_RTOL: f64 = 1e-9;
const TIME_RTOL: f64 = 1e-9;

/// samples of one time level, all columns in header order
#[derive(Debug, Clone)]
struct Frame {
    time: f64,
    rows: Vec<Vec<f64>>,
}

/// Open handle on one case. The loaded frame is released when the handle drops.
#[derive(Debug)]
pub struct TableContourSource {
    case_dir: PathBuf,
    name: String,
    layout: CaseLayout,
    contour_field: String,
    threshold: f64,
    duplicate_policy: DuplicatePolicy,
    /// roots holding time directories (the case itself or its processor dirs)
    roots: Vec<PathBuf>,
    /// (time, directory name), ascending
    times: Vec<(f64, String)>,
    header: Vec<String>,
    frame: Option<Frame>,
}

impl TableContourSource {
    /// Open the case at `case_dir` and check that `contour_field` and every
    /// name in `field_names` exist. Missing fields fail here, before any
    /// time is read.
    pub fn open(
        case_dir: &Path,
        layout: CaseLayout,
        contour_field: &str,
        threshold: f64,
        field_names: &[String],
    ) -> Result<Self, ConvergenceError> {
        let name = case_dir.display().to_string();
        if !threshold.is_finite() {
            return Err(ConvergenceError::Config(format!(
                "contour value {} for {} is not finite",
                threshold, name
            )));
        }
        let roots = match layout {
            CaseLayout::Reconstructed => vec![case_dir.to_path_buf()],
            CaseLayout::Decomposed => processor_dirs(case_dir)?,
        };
        let times = time_dirs(&roots[0])?;
        let (_, first_time) = times.first().ok_or_else(|| {
            ConvergenceError::Io(format!("no non-zero time directories in {}", name))
        })?;
        let header = read_header(&roots[0].join(first_time).join(CONTOUR_FILE))?;

        let source = TableContourSource {
            case_dir: case_dir.to_path_buf(),
            name,
            layout,
            contour_field: contour_field.to_string(),
            threshold,
            duplicate_policy: DuplicatePolicy::default(),
            roots,
            times,
            header,
            frame: None,
        };
        let mut required = vec!["x".to_string(), "y".to_string(), source.contour_field.clone()];
        required.extend(field_names.iter().cloned());
        source.validate_fields(&required)?;
        info!(
            "opened {} case {} ({} roots, {} times, columns: {})",
            source.layout,
            source.name,
            source.roots.len(),
            source.times.len(),
            source.header.join(", ")
        );
        Ok(source)
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn case_dir(&self) -> &Path {
        &self.case_dir
    }

    pub fn layout(&self) -> CaseLayout {
        self.layout
    }

    /// available times, ascending, without t = 0
    pub fn times(&self) -> Vec<f64> {
        self.times.iter().map(|(t, _)| *t).collect()
    }

    /// time of the loaded frame, if any
    pub fn current_time(&self) -> Option<f64> {
        self.frame.as_ref().map(|frame| frame.time)
    }

    fn column(&self, name: &str) -> Result<usize, ConvergenceError> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ConvergenceError::MissingField {
                case: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// read one time level from every root and keep the rows on the contour
    fn load_frame(&self, time: f64, dir_name: &str) -> Result<Frame, ConvergenceError> {
        let contour_col = self.column(&self.contour_field)?;
        let z_col = self.header.iter().position(|h| h == "z");
        let tol = THRESHOLD_RTOL * self.threshold.abs().max(1.0);

        let mut rows = Vec::new();
        for root in &self.roots {
            let path = root.join(dir_name).join(CONTOUR_FILE);
            let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(&path)?;
            let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
            if header != self.header {
                return Err(ConvergenceError::Io(format!(
                    "{} has columns [{}], expected [{}]",
                    path.display(),
                    header.join(", "),
                    self.header.join(", ")
                )));
            }
            for record in reader.records() {
                let record = record?;
                let row = record
                    .iter()
                    .map(|field| {
                        field.parse::<f64>().map_err(|_| {
                            ConvergenceError::Io(format!(
                                "{}: cannot parse '{}' as a number",
                                path.display(),
                                field
                            ))
                        })
                    })
                    .collect::<Result<Vec<f64>, _>>()?;
                let on_contour = (row[contour_col] - self.threshold).abs() <= tol;
                let on_slice = z_col.is_none_or(|z| row[z] == 0.0);
                if on_contour && on_slice {
                    rows.push(row);
                }
            }
        }
        debug!(
            "{}: {} contour samples at t = {}",
            self.name,
            rows.len(),
            time
        );
        Ok(Frame { time, rows })
    }
}

impl ContourSource for TableContourSource {
    fn case_name(&self) -> &str {
        &self.name
    }

    fn validate_fields(&self, names: &[String]) -> Result<(), ConvergenceError> {
        for name in names {
            self.column(name)?;
        }
        Ok(())
    }

    fn step_to(&mut self, time: f64) -> Result<(), ConvergenceError> {
        let (stored_time, dir_name) = self
            .times
            .iter()
            .find(|(t, _)| (t - time).abs() <= TIME_RTOL * t.abs().max(1.0))
            .cloned()
            .ok_or_else(|| ConvergenceError::TimeNotAvailable {
                case: self.name.clone(),
                time,
            })?;
        let frame = self.load_frame(stored_time, &dir_name)?;
        self.frame = Some(frame);
        Ok(())
    }

    fn contour_with_fields(
        &self,
        names: &[String],
    ) -> Result<(Signal, Vec<Signal>), ConvergenceError> {
        let frame = self.frame.as_ref().ok_or_else(|| {
            ConvergenceError::InvalidSignal(format!("{} has not been stepped to a time", self.name))
        })?;
        let mut columns = vec![self.column("x")?, self.column("y")?];
        for name in names {
            columns.push(self.column(name)?);
        }
        let selected = frame
            .rows
            .iter()
            .map(|row| columns.iter().map(|&c| row[c]).collect())
            .collect();
        let merged = collapse_coincident(selected, self.duplicate_policy)?;

        let x: Vec<f64> = merged.iter().map(|row| row[0]).collect();
        let heights = Signal::new(x.clone(), merged.iter().map(|row| row[1]).collect())?;
        let fields = (0..names.len())
            .map(|k| Signal::new(x.clone(), merged.iter().map(|row| row[k + 2]).collect()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((heights, fields))
    }
}

/// `processor<N>` subdirectories ordered by N
fn processor_dirs(case_dir: &Path) -> Result<Vec<PathBuf>, ConvergenceError> {
    let pattern = Regex::new(r"^processor(\d+)$")
        .map_err(|e| ConvergenceError::Config(e.to_string()))?;
    let mut dirs: Vec<(usize, PathBuf)> = Vec::new();
    for entry in fs::read_dir(case_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(caps) = pattern.captures(&file_name) {
            if let Ok(n) = caps[1].parse::<usize>() {
                dirs.push((n, entry.path()));
            }
        }
    }
    if dirs.is_empty() {
        return Err(ConvergenceError::Io(format!(
            "no processor directories in decomposed case {}",
            case_dir.display()
        )));
    }
    dirs.sort_by_key(|(n, _)| *n);
    Ok(dirs.into_iter().map(|(_, path)| path).collect())
}

/// subdirectories whose names parse as a non-zero time, ascending
fn time_dirs(root: &Path) -> Result<Vec<(f64, String)>, ConvergenceError> {
    let mut times = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        match file_name.parse::<f64>() {
            Ok(t) if t.is_finite() && t != 0.0 => times.push((t, file_name)),
            _ => {}
        }
    }
    times.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(times)
}

fn read_header(path: &Path) -> Result<Vec<String>, ConvergenceError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
    Ok(reader.headers()?.iter().map(String::from).collect())
}
