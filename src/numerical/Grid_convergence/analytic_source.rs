//! Contour source backed by closed-form profiles h(x, t) and f(x, t).
//! Used for manufactured-solution checks of the whole pipeline.
use super::contour_source::ContourSource;
use super::errors::ConvergenceError;
use super::signal::Signal;

/// profile of position and time
pub type Profile = Box<dyn Fn(f64, f64) -> f64 + Send + Sync>;

pub struct AnalyticContourSource {
    name: String,
    positions: Vec<f64>,
    height: Profile,
    fields: Vec<(String, Profile)>,
    /// when set, only these times can be stepped to
    times: Option<Vec<f64>>,
    time: f64,
}

impl AnalyticContourSource {
    /// `n` equally spaced samples of `height` on [a, b], starting at t = 0
    pub fn new<H>(
        name: &str,
        a: f64,
        b: f64,
        n: usize,
        height: H,
    ) -> Result<Self, ConvergenceError>
    where
        H: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        if !(a.is_finite() && b.is_finite()) || b <= a {
            return Err(ConvergenceError::InvalidDomain { xmin: a, xmax: b });
        }
        if n < 2 {
            return Err(ConvergenceError::InvalidSignal(format!(
                "at least 2 samples required, got {}",
                n
            )));
        }
        let h = (b - a) / (n - 1) as f64;
        let mut positions: Vec<f64> = (0..n).map(|i| a + i as f64 * h).collect();
        positions[n - 1] = b;
        Ok(AnalyticContourSource {
            name: name.to_string(),
            positions,
            height: Box::new(height),
            fields: Vec::new(),
            times: None,
            time: 0.0,
        })
    }

    /// add a named field sampled on the same positions
    pub fn with_field<F>(mut self, name: &str, field: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.fields.push((name.to_string(), Box::new(field)));
        self
    }

    /// replace the sample positions (must be strictly increasing)
    pub fn with_positions(mut self, positions: Vec<f64>) -> Result<Self, ConvergenceError> {
        // reuse the signal checks on the positions
        Signal::new(positions.clone(), vec![0.0; positions.len()])?;
        self.positions = positions;
        Ok(self)
    }

    /// restrict stepping to the listed times
    pub fn with_times(mut self, times: Vec<f64>) -> Self {
        self.times = Some(times);
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    fn field(&self, name: &str) -> Result<&Profile, ConvergenceError> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, profile)| profile)
            .ok_or_else(|| ConvergenceError::MissingField {
                case: self.name.clone(),
                field: name.to_string(),
            })
    }

    fn sample(&self, profile: &Profile) -> Result<Signal, ConvergenceError> {
        let values = self
            .positions
            .iter()
            .map(|&x| profile(x, self.time))
            .collect();
        Signal::new(self.positions.clone(), values)
    }
}

impl ContourSource for AnalyticContourSource {
    fn case_name(&self) -> &str {
        &self.name
    }

    fn validate_fields(&self, names: &[String]) -> Result<(), ConvergenceError> {
        for name in names {
            self.field(name)?;
        }
        Ok(())
    }

    fn step_to(&mut self, time: f64) -> Result<(), ConvergenceError> {
        let listed = |times: &Vec<f64>| {
            times
                .iter()
                .any(|&t| (t - time).abs() <= 1e-12 * t.abs().max(1.0))
        };
        let available = time.is_finite() && self.times.as_ref().is_none_or(listed);
        if !available {
            return Err(ConvergenceError::TimeNotAvailable {
                case: self.name.clone(),
                time,
            });
        }
        self.time = time;
        Ok(())
    }

    fn contour_with_fields(
        &self,
        names: &[String],
    ) -> Result<(Signal, Vec<Signal>), ConvergenceError> {
        let heights = self.sample(&self.height)?;
        let fields = names
            .iter()
            .map(|name| self.sample(self.field(name)?))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((heights, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> AnalyticContourSource {
        AnalyticContourSource::new("analytic", 0.0, 2.0, 5, |x, t| x + t)
            .unwrap()
            .with_field("u", |x, t| x * t)
    }

    #[test]
    fn test_samples_follow_time() {
        let mut src = source();
        src.step_to(0.5).unwrap();
        let (h, u) = src.contour_with_field("u").unwrap();
        assert_eq!(h.x().as_slice(), &[0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(h.y().as_slice(), &[0.5, 1.0, 1.5, 2.0, 2.5]);
        assert_eq!(u.y().as_slice(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(src.contour().unwrap(), h);
    }

    #[test]
    fn test_missing_field() {
        let src = source();
        assert!(src.validate_fields(&["u".to_string()]).is_ok());
        let res = src.validate_fields(&["u".to_string(), "p_rgh".to_string()]);
        assert!(matches!(
            res,
            Err(ConvergenceError::MissingField { ref field, .. }) if field == "p_rgh"
        ));
        assert!(src.contour_with_field("p_rgh").is_err());
    }

    #[test]
    fn test_restricted_times() {
        let mut src = source().with_times(vec![0.1, 0.2]);
        assert!(src.step_to(0.2).is_ok());
        assert!(matches!(
            src.step_to(0.3),
            Err(ConvergenceError::TimeNotAvailable { .. })
        ));
        // a failed step keeps the previous time
        assert_eq!(src.time(), 0.2);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(AnalyticContourSource::new("bad", 1.0, 1.0, 5, |x, _| x).is_err());
        assert!(AnalyticContourSource::new("bad", 0.0, 1.0, 1, |x, _| x).is_err());
        let src = AnalyticContourSource::new("ok", 0.0, 1.0, 3, |x, _| x).unwrap();
        assert!(src.with_positions(vec![0.0, 0.5, 0.4]).is_err());
    }
}
