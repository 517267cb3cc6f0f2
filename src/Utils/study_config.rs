//! Typed configuration of a three-grid study, read from a task document.
use crate::Utils::logger::parse_level;
use crate::Utils::task_parser::{DocumentMap, SectionMap, Value, parse_document_as};
use crate::numerical::Grid_convergence::contour_source::CaseLayout;
use crate::numerical::Grid_convergence::errors::ConvergenceError;
use crate::numerical::Grid_convergence::signal::{DuplicatePolicy, RefinementRatios};
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// times closer than this fraction of the stride to `end` still count as inside the range
const TIME_RANGE_TOL: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct CaseConfig {
    pub name: PathBuf,
    pub layout: CaseLayout,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub stride: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, stride: f64, end: f64) -> Result<Self, ConvergenceError> {
        if !(start.is_finite() && stride.is_finite() && end.is_finite()) {
            return Err(ConvergenceError::Config(
                "time range must be finite".to_string(),
            ));
        }
        if stride <= 0.0 {
            return Err(ConvergenceError::Config(format!(
                "time stride must be positive, got {}",
                stride
            )));
        }
        if end < start {
            return Err(ConvergenceError::Config(format!(
                "time range ends ({}) before it starts ({})",
                end, start
            )));
        }
        Ok(TimeRange { start, stride, end })
    }

    /// start + i * stride for i = 0 ..= floor((end - start) / stride)
    pub fn times(&self) -> Vec<f64> {
        let n = ((self.end - self.start) / self.stride + TIME_RANGE_TOL).floor() as usize;
        (0..=n)
            .map(|i| self.start + i as f64 * self.stride)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudyConfig {
    pub coarse: CaseConfig,
    pub medium: CaseConfig,
    pub fine: CaseConfig,
    pub times: TimeRange,
    pub contour_field: String,
    pub contour_value: f64,
    pub field_names: Vec<String>,
    pub ratios: RefinementRatios,
    pub duplicate_policy: DuplicatePolicy,
    pub log_level: LevelFilter,
    pub log_to_file: bool,
    /// csv file for the order/ratio history
    pub report: Option<PathBuf>,
    /// directory for png plots
    pub plots: Option<PathBuf>,
}

/// titles and keys the task document may contain
fn template() -> DocumentMap {
    let sections: [(&str, &[&str]); 10] = [
        ("coarse_case", &["name", "type"]),
        ("medium_case", &["name", "type"]),
        ("fine_case", &["name", "type"]),
        ("times", &["start", "stride", "end"]),
        ("contour", &["array", "value"]),
        ("data", &["names"]),
        ("refinement", &["coarse_to_medium", "medium_to_fine"]),
        ("duplicates", &["policy"]),
        ("logging", &["level", "to_file"]),
        ("output", &["report", "plots"]),
    ];
    sections
        .iter()
        .map(|(title, keys)| {
            let section: SectionMap = keys.iter().map(|k| (k.to_string(), None)).collect();
            (title.to_string(), section)
        })
        .collect()
}

/// typed access to the parsed document
struct Document {
    map: DocumentMap,
}

impl Document {
    fn values(&self, title: &str, key: &str) -> Option<&Vec<Value>> {
        self.map
            .get(title)
            .and_then(|section| section.get(key))
            .and_then(|values| values.as_ref())
    }

    fn single(&self, title: &str, key: &str) -> Result<Option<&Value>, ConvergenceError> {
        match self.values(title, key) {
            None => Ok(None),
            Some(values) if values.len() == 1 => Ok(values.first()),
            Some(values) => Err(ConvergenceError::Config(format!(
                "{}.{} expects one value, got {}",
                title,
                key,
                values.len()
            ))),
        }
    }

    fn required(&self, title: &str, key: &str) -> Result<&Value, ConvergenceError> {
        self.single(title, key)?
            .ok_or_else(|| ConvergenceError::Config(format!("missing {}.{}", title, key)))
    }

    fn float(&self, title: &str, key: &str) -> Result<f64, ConvergenceError> {
        self.required(title, key)?.as_float().ok_or_else(|| {
            ConvergenceError::Config(format!("{}.{} must be a number", title, key))
        })
    }

    fn string(&self, title: &str, key: &str) -> Result<String, ConvergenceError> {
        Ok(self.required(title, key)?.to_string_value())
    }

    fn optional_string(&self, title: &str, key: &str) -> Result<Option<String>, ConvergenceError> {
        Ok(self.single(title, key)?.map(|v| v.to_string_value()))
    }

    fn case(&self, title: &str) -> Result<CaseConfig, ConvergenceError> {
        let name = PathBuf::from(self.string(title, "name")?);
        let layout_name = self.string(title, "type")?;
        let layout = CaseLayout::from_str(&layout_name).map_err(|_| {
            ConvergenceError::Config(format!(
                "{}.type must be reconstructed or decomposed, got {}",
                title, layout_name
            ))
        })?;
        Ok(CaseConfig { name, layout })
    }
}

impl StudyConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConvergenceError> {
        let contents = fs::read_to_string(path)?;
        contents.parse()
    }
}

impl FromStr for StudyConfig {
    type Err = ConvergenceError;

    /// Parse a task document. Unknown titles or keys are rejected so that
    /// typos do not silently fall back to defaults.
    fn from_str(input: &str) -> Result<Self, ConvergenceError> {
        let template = template();
        let map = parse_document_as(input, Some(&template)).map_err(ConvergenceError::Config)?;
        for (title, section) in &map {
            let Some(known) = template.get(title) else {
                return Err(ConvergenceError::Config(format!(
                    "unknown section '{}'",
                    title
                )));
            };
            if let Some(key) = section.keys().find(|k| !known.contains_key(*k)) {
                return Err(ConvergenceError::Config(format!(
                    "unknown key '{}' in section '{}'",
                    key, title
                )));
            }
        }
        let doc = Document { map };

        let times = TimeRange::new(
            doc.float("times", "start")?,
            doc.float("times", "stride")?,
            doc.float("times", "end")?,
        )?;
        let ratios = RefinementRatios::new(
            doc.float("refinement", "coarse_to_medium")?,
            doc.float("refinement", "medium_to_fine")?,
        )
        .map_err(|e| ConvergenceError::Config(e.to_string()))?;
        let field_names = doc
            .values("data", "names")
            .map(|values| values.iter().map(|v| v.to_string_value()).collect())
            .unwrap_or_default();
        let duplicate_policy = match doc.optional_string("duplicates", "policy")? {
            Some(name) => DuplicatePolicy::from_str(&name).map_err(|_| {
                ConvergenceError::Config(format!(
                    "duplicates.policy must be average, keep_first or keep_last, got {}",
                    name
                ))
            })?,
            None => DuplicatePolicy::default(),
        };
        let log_level = match doc.optional_string("logging", "level")? {
            Some(level) => parse_level(&level)?,
            None => LevelFilter::Info,
        };
        let log_to_file = match doc.single("logging", "to_file")? {
            Some(value) => value.as_boolean().ok_or_else(|| {
                ConvergenceError::Config("logging.to_file must be true or false".to_string())
            })?,
            None => false,
        };

        Ok(StudyConfig {
            coarse: doc.case("coarse_case")?,
            medium: doc.case("medium_case")?,
            fine: doc.case("fine_case")?,
            times,
            contour_field: doc.string("contour", "array")?,
            contour_value: doc.float("contour", "value")?,
            field_names,
            ratios,
            duplicate_policy,
            log_level,
            log_to_file,
            report: doc.optional_string("output", "report")?.map(PathBuf::from),
            plots: doc.optional_string("output", "plots")?.map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TASK: &str = "
// three grid study of a dam break
coarse_case name: runs/coarse type: reconstructed
medium_case name: runs/medium type: Decomposed
fine_case   name: runs/fine   type: reconstructed
times start: 0.1 stride: 0.1 end: 0.5
contour array: alpha.water value: 0.5
data names: p_rgh, U_x
refinement coarse_to_medium: 2 medium_to_fine: 1.5
logging level: debug to_file: false
output report: convergence.csv plots: plots
";

    #[test]
    fn test_full_task() {
        let config = StudyConfig::from_str(TASK).unwrap();
        assert_eq!(config.coarse.name, PathBuf::from("runs/coarse"));
        assert_eq!(config.medium.layout, CaseLayout::Decomposed);
        assert_eq!(config.fine.layout, CaseLayout::Reconstructed);
        assert_eq!(config.contour_field, "alpha.water");
        assert_eq!(config.contour_value, 0.5);
        assert_eq!(config.field_names, vec!["p_rgh", "U_x"]);
        assert_eq!(config.ratios.coarse_to_medium(), 2.0);
        assert_eq!(config.ratios.medium_to_fine(), 1.5);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert!(!config.log_to_file);
        assert_eq!(config.report, Some(PathBuf::from("convergence.csv")));
        assert_eq!(config.plots, Some(PathBuf::from("plots")));
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Average);
        assert_eq!(config.times.times().len(), 5);
    }

    #[test]
    fn test_optional_sections() {
        let task = "
coarse_case name: c type: reconstructed
medium_case name: m type: reconstructed
fine_case name: f type: reconstructed
times start: 1 stride: 1 end: 3
contour array: alpha.water value: 0.5
refinement coarse_to_medium: 2.0 medium_to_fine: 2.0
duplicates policy: keep_last
";
        let config = StudyConfig::from_str(task).unwrap();
        assert!(config.field_names.is_empty());
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.report, None);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepLast);
        assert_eq!(config.times.times(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_case_names_keep_their_text() {
        let task = TASK.replace("name: runs/coarse", "name: 01");
        let config = StudyConfig::from_str(&task).unwrap();
        assert_eq!(config.coarse.name, PathBuf::from("01"));
    }

    #[test]
    fn test_time_range() {
        let range = TimeRange::new(0.1, 0.1, 1.0).unwrap();
        let times = range.times();
        assert_eq!(times.len(), 10);
        assert_relative_eq!(times[9], 1.0, epsilon = 1e-12);
        assert_eq!(TimeRange::new(0.5, 0.2, 0.6).unwrap().times(), vec![0.5]);
        assert!(TimeRange::new(0.0, 0.0, 1.0).is_err());
        assert!(TimeRange::new(1.0, 0.1, 0.5).is_err());
    }

    #[test]
    fn test_config_errors() {
        let missing_contour = TASK.replace("contour array: alpha.water value: 0.5\n", "");
        assert!(matches!(
            StudyConfig::from_str(&missing_contour),
            Err(ConvergenceError::Config(_))
        ));
        let bad_type = TASK.replace("type: Decomposed", "type: parallel");
        assert!(StudyConfig::from_str(&bad_type).is_err());
        let bad_ratio = TASK.replace("coarse_to_medium: 2", "coarse_to_medium: 0.5");
        assert!(matches!(
            StudyConfig::from_str(&bad_ratio),
            Err(ConvergenceError::Config(_))
        ));
        let typo = TASK.replace("stride:", "strid:");
        assert!(StudyConfig::from_str(&typo).is_err());
        let bad_level = TASK.replace("level: debug", "level: loud");
        assert!(StudyConfig::from_str(&bad_level).is_err());
        let two_values = TASK.replace("value: 0.5", "value: 0.5, 0.6");
        assert!(StudyConfig::from_str(&two_values).is_err());
    }
}
