use RustedConvergence::numerical::Grid_convergence::order_solver::OrderSolver;
use RustedConvergence::numerical::Grid_convergence::resampler::resample;
use RustedConvergence::numerical::Grid_convergence::session::analyse_triple;
use RustedConvergence::numerical::Grid_convergence::signal::{RefinementRatios, Signal};
use RustedConvergence::numerical::Grid_convergence::spline_interp::SplineInterpolator;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn sampled(n: usize) -> Signal {
    let h = 10.0 / (n - 1) as f64;
    let x: Vec<f64> = (0..n).map(|i| i as f64 * h).collect();
    let y: Vec<f64> = x.iter().map(|&x| x.sin() + h * h).collect();
    Signal::new(x, y).unwrap()
}

fn bench_resample(c: &mut Criterion) {
    let (coarse, medium, fine) = (sampled(101), sampled(201), sampled(401));
    c.bench_function("resample 101/201/401", |b| {
        b.iter(|| resample(black_box(&coarse), black_box(&medium), black_box(&fine)))
    });
}

fn bench_spline_fit(c: &mut Criterion) {
    let signal = sampled(4000);
    let (lower, upper) = signal.domain();
    c.bench_function("spline fit 4000", |b| {
        b.iter(|| SplineInterpolator::from_signal(black_box(&signal), lower, upper))
    });
}

fn bench_order_solver(c: &mut Criterion) {
    let solver = OrderSolver::new();
    c.bench_function("order solver r = 2, 1.5", |b| {
        b.iter(|| solver.solve(black_box(0.3), black_box(0.1), 2.0, 1.5))
    });
}

fn bench_analyse_triple(c: &mut Criterion) {
    let (coarse, medium, fine) = (sampled(101), sampled(201), sampled(401));
    let ratios = RefinementRatios::new(2.0, 2.0).unwrap();
    let solver = OrderSolver::new();
    c.bench_function("analyse triple 101/201/401", |b| {
        b.iter(|| analyse_triple(&coarse, &medium, &fine, &ratios, &solver, 0.0, 0))
    });
}

criterion_group!(
    benches,
    bench_resample,
    bench_spline_fit,
    bench_order_solver,
    bench_analyse_triple
);
criterion_main!(benches);
