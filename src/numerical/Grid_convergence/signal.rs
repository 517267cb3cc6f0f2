//! Data model of the three-grid study: signals sampled along a contour trace,
//! tracked quantities and refinement ratios.
use super::errors::ConvergenceError;
use nalgebra::DVector;
use std::cmp::Ordering;
use std::fmt;
use strum_macros::{Display, EnumString};

/// Ordered sequence of (position, value) samples, strictly increasing in position
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    x: DVector<f64>,
    y: DVector<f64>,
}

impl Signal {
    /// build a signal from already ordered positions and values
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Signal, ConvergenceError> {
        if x.len() != y.len() {
            return Err(ConvergenceError::InvalidSignal(format!(
                "{} positions but {} values",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(ConvergenceError::InvalidSignal(format!(
                "at least 2 samples required, got {}",
                x.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(ConvergenceError::InvalidSignal(
                "non-finite sample".to_string(),
            ));
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ConvergenceError::InvalidSignal(format!(
                "positions not strictly increasing at index {} ({} -> {})",
                i + 1,
                x[i],
                x[i + 1]
            )));
        }
        Ok(Signal {
            x: DVector::from_vec(x),
            y: DVector::from_vec(y),
        })
    }

    /// build a signal from unordered scatter, merging coincident positions
    pub fn from_scatter(
        x: Vec<f64>,
        y: Vec<f64>,
        policy: DuplicatePolicy,
    ) -> Result<Signal, ConvergenceError> {
        if x.len() != y.len() {
            return Err(ConvergenceError::InvalidSignal(format!(
                "{} positions but {} values",
                x.len(),
                y.len()
            )));
        }
        let rows = x.into_iter().zip(y).map(|(xi, yi)| vec![xi, yi]).collect();
        let merged = collapse_coincident(rows, policy)?;
        let (xs, ys) = merged.into_iter().map(|r| (r[0], r[1])).unzip();
        Signal::new(xs, ys)
    }

    pub fn x(&self) -> &DVector<f64> {
        &self.x
    }

    pub fn y(&self) -> &DVector<f64> {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// (first position, last position)
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }
}

/// What to do with contour samples that land on the same position
/// (typically duplicated points on processor or mesh-block boundaries)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DuplicatePolicy {
    #[default]
    Average,
    KeepFirst,
    KeepLast,
}

/// Sort rows by their first column (the position) and merge rows that share
/// a position according to `policy`. All columns of merged rows are merged
/// together, so auxiliary columns stay aligned with the position.
/// KeepFirst/KeepLast refer to the order of the incoming rows.
pub fn collapse_coincident(
    mut rows: Vec<Vec<f64>>,
    policy: DuplicatePolicy,
) -> Result<Vec<Vec<f64>>, ConvergenceError> {
    if rows.iter().any(|r| r.is_empty() || r[0].is_nan()) {
        return Err(ConvergenceError::InvalidSignal(
            "row without a valid position".to_string(),
        ));
    }
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    if rows.iter().any(|r| r.len() != width) {
        return Err(ConvergenceError::InvalidSignal(
            "rows have different number of columns".to_string(),
        ));
    }
    // stable sort keeps the incoming order among equal positions
    rows.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(Ordering::Equal));

    let mut merged: Vec<Vec<f64>> = Vec::with_capacity(rows.len());
    let mut group_count = 0usize;
    for row in rows {
        match merged.last_mut() {
            Some(last) if last[0] == row[0] => {
                group_count += 1;
                match policy {
                    DuplicatePolicy::KeepFirst => {}
                    DuplicatePolicy::KeepLast => *last = row,
                    DuplicatePolicy::Average => {
                        // running mean over the group
                        let n = group_count as f64;
                        for (acc, v) in last.iter_mut().zip(row.iter()).skip(1) {
                            *acc += (v - *acc) / n;
                        }
                    }
                }
            }
            _ => {
                group_count = 1;
                merged.push(row);
            }
        }
    }
    Ok(merged)
}

/// One tracked scalar quantity along the contour
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// interface height (y coordinate of the contour)
    Height,
    /// named auxiliary field sampled on the contour
    Field(String),
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Quantity::Height => write!(f, "height"),
            Quantity::Field(name) => write!(f, "{}", name),
        }
    }
}

/// Coarse-to-medium and medium-to-fine grid spacing ratios, both > 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementRatios {
    coarse_to_medium: f64,
    medium_to_fine: f64,
}

impl RefinementRatios {
    pub fn new(coarse_to_medium: f64, medium_to_fine: f64) -> Result<Self, ConvergenceError> {
        check_ratio("coarse_to_medium", coarse_to_medium)?;
        check_ratio("medium_to_fine", medium_to_fine)?;
        Ok(RefinementRatios {
            coarse_to_medium,
            medium_to_fine,
        })
    }

    pub fn coarse_to_medium(&self) -> f64 {
        self.coarse_to_medium
    }

    pub fn medium_to_fine(&self) -> f64 {
        self.medium_to_fine
    }
}

pub(crate) fn check_ratio(name: &str, value: f64) -> Result<(), ConvergenceError> {
    if !value.is_finite() || value <= 1.0 {
        return Err(ConvergenceError::InvalidRefinementRatio {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}
