use crate::numerical::Grid_convergence::errors::ConvergenceError;
use crate::numerical::Grid_convergence::session::ConvergenceResult;
use plotters::prelude::*;
use std::fmt::Display;
use std::path::Path;

fn plot_error<E: Display>(err: E) -> ConvergenceError {
    ConvergenceError::Io(format!("plotting failed: {}", err))
}

/// [min, max] of the finite values widened by 5% (or by 1 for a flat series)
pub(crate) fn padded_range<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return (0.0, 1.0);
    }
    let pad = if max > min { 0.05 * (max - min) } else { 1.0 };
    (min - pad, max + pad)
}

/// coarse, medium and fine curves of one step on their shared grid
pub fn plot_resampled(
    result: &ConvergenceResult,
    label: &str,
    path: &Path,
) -> Result<(), ConvergenceError> {
    let resampled = &result.resampled;
    let (x_min, x_max) = resampled.grid.bounds();
    let (y_min, y_max) = padded_range(
        resampled
            .coarse
            .iter()
            .chain(resampled.medium.iter())
            .chain(resampled.fine.iter()),
    );

    let root_area = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root_area.fill(&WHITE).map_err(plot_error)?;
    let mut chart = ChartBuilder::on(&root_area)
        .caption(format!("{} at t = {}", label, result.time), ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_error)?;
    chart
        .configure_mesh()
        .x_desc("x")
        .y_desc(label)
        .draw()
        .map_err(plot_error)?;

    let curves = [
        ("coarse", &resampled.coarse),
        ("medium", &resampled.medium),
        ("fine", &resampled.fine),
    ];
    for (col, (name, values)) in curves.into_iter().enumerate() {
        let series: Vec<(f64, f64)> = resampled
            .grid
            .points()
            .iter()
            .zip(values.iter())
            .map(|(&x, &y)| (x, y))
            .collect();
        chart
            .draw_series(LineSeries::new(series, &Palette99::pick(col)))
            .map_err(plot_error)?
            .label(name)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], &Palette99::pick(col))
            });
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_error)?;
    root_area.present().map_err(plot_error)?;
    Ok(())
}

/// order or asymptotic ratio of one quantity against time
pub fn plot_history(
    times: &[f64],
    values: &[f64],
    label: &str,
    path: &Path,
) -> Result<(), ConvergenceError> {
    if times.len() != values.len() || times.is_empty() {
        return Err(ConvergenceError::InvalidSignal(format!(
            "cannot plot {} values against {} times",
            values.len(),
            times.len()
        )));
    }
    let (t_min, t_max) = padded_range(times.iter());
    let (y_min, y_max) = padded_range(values.iter());

    let root_area = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root_area.fill(&WHITE).map_err(plot_error)?;
    let mut chart = ChartBuilder::on(&root_area)
        .caption(label, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(t_min..t_max, y_min..y_max)
        .map_err(plot_error)?;
    chart
        .configure_mesh()
        .x_desc("t")
        .y_desc(label)
        .draw()
        .map_err(plot_error)?;

    let series: Vec<(f64, f64)> = times
        .iter()
        .zip(values)
        .filter(|(_, v)| v.is_finite())
        .map(|(&t, &v)| (t, v))
        .collect();
    chart
        .draw_series(LineSeries::new(series.clone(), &BLUE))
        .map_err(plot_error)?;
    chart
        .draw_series(series.into_iter().map(|p| Circle::new(p, 3, BLUE.filled())))
        .map_err(plot_error)?;
    root_area.present().map_err(plot_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        let (lo, hi) = padded_range([0.0, 10.0, 5.0].iter());
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);
        assert_eq!(padded_range([2.0, 2.0].iter()), (1.0, 3.0));
        assert_eq!(padded_range([f64::NAN].iter()), (0.0, 1.0));
        let (lo, hi) = padded_range([f64::NAN, 1.0, 3.0].iter());
        assert!((lo - 0.9).abs() < 1e-12);
        assert!((hi - 3.1).abs() < 1e-12);
    }

    #[test]
    fn test_plot_history_rejects_mismatched_lengths() {
        let path = Path::new("unused.png");
        assert!(plot_history(&[0.1, 0.2], &[1.0], "order", path).is_err());
        assert!(plot_history(&[], &[], "order", path).is_err());
    }
}
