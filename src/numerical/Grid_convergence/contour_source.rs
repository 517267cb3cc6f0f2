//! Narrow contract between the convergence engine and whatever extracts
//! interface contours from a simulation case.
use super::errors::ConvergenceError;
use super::signal::Signal;
use strum_macros::{Display, EnumString};

/// On-disk layout of a simulation case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CaseLayout {
    /// one directory per written time
    Reconstructed,
    /// per-processor subdirectories, each holding its own time directories
    Decomposed,
}

/// One grid level of the study. Implementors own their data handles; the
/// session only steps them in time and asks for contour samples.
pub trait ContourSource {
    /// identifier of the case, used in error messages and logs
    fn case_name(&self) -> &str;

    /// fail with `MissingField` unless every name is available
    fn validate_fields(&self, names: &[String]) -> Result<(), ConvergenceError>;

    /// move to simulation time `time`
    fn step_to(&mut self, time: f64) -> Result<(), ConvergenceError>;

    /// interface heights plus one signal per requested field, all on the
    /// same ordered positions
    fn contour_with_fields(
        &self,
        names: &[String],
    ) -> Result<(Signal, Vec<Signal>), ConvergenceError>;

    /// interface heights along the contour
    fn contour(&self) -> Result<Signal, ConvergenceError> {
        let (heights, _) = self.contour_with_fields(&[])?;
        Ok(heights)
    }

    /// interface heights and one field along the contour
    fn contour_with_field(&self, name: &str) -> Result<(Signal, Signal), ConvergenceError> {
        let (heights, mut fields) = self.contour_with_fields(&[name.to_string()])?;
        let field = fields.pop().ok_or_else(|| ConvergenceError::MissingField {
            case: self.case_name().to_string(),
            field: name.to_string(),
        })?;
        Ok((heights, field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_case_layout_parsing() {
        assert_eq!(
            CaseLayout::from_str("reconstructed").unwrap(),
            CaseLayout::Reconstructed
        );
        assert_eq!(
            CaseLayout::from_str("Decomposed").unwrap(),
            CaseLayout::Decomposed
        );
        assert!(CaseLayout::from_str("parallel").is_err());
        assert_eq!(CaseLayout::Decomposed.to_string(), "decomposed");
    }
}
