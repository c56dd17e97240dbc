use bca_confidence::{
    AccelerationMethod, BcaBootstrap, BcaConfig, BiasCorrector, BcaParameters, Diagnostics,
    InternalSeMethod, LimitSolver, Mean, QuantileInterpolation, SufficientStatistics,
    DEFAULT_ALPHAS,
};
use bca_core::sequential;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_distr::{Exp, Normal};

/// Generate right-skewed data
fn generate_exponential_data(size: usize, rate: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let exp = Exp::new(rate).unwrap();
    (0..size).map(|_| exp.sample(&mut rng)).collect()
}

fn generate_normal_data(size: usize, mean: f64, std: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(mean, std).unwrap();
    (0..size).map(|_| normal.sample(&mut rng)).collect()
}

fn bench_nonparametric(c: &mut Criterion) {
    let mut group = c.benchmark_group("Nonparametric");
    let sizes = [20, 100, 500];

    for &size in &sizes {
        let data = generate_exponential_data(size, 1.0, 42);

        let jackknife = BcaBootstrap::new(sequential()).with_config(
            BcaConfig::new().with_replicates(1000).with_seed(42),
        );
        group.bench_with_input(BenchmarkId::new("jackknife_a", size), &data, |b, data| {
            b.iter(|| jackknife.nonparametric_seeded(black_box(data), &Mean))
        });

        let regression = BcaBootstrap::new(sequential()).with_config(
            BcaConfig::new()
                .with_replicates(1000)
                .with_seed(42)
                .with_acceleration(AccelerationMethod::Regression),
        );
        group.bench_with_input(BenchmarkId::new("regression_a", size), &data, |b, data| {
            b.iter(|| regression.nonparametric_seeded(black_box(data), &Mean))
        });
    }

    group.finish();
}

fn bench_parametric(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parametric");
    let replicate_counts = [1000, 4000];

    for &b in &replicate_counts {
        let draws = generate_normal_data(b, 0.0, 1.0, 7);
        let squares: Vec<f64> = draws.iter().flat_map(|&x| [x, x * x]).collect();
        let sufficient = SufficientStatistics::new(b, 2, squares).unwrap();

        let delta = BcaBootstrap::new(sequential());
        group.bench_with_input(BenchmarkId::new("delta_se", b), &draws, |bench, draws| {
            bench.iter(|| delta.parametric(0.0, black_box(draws), sufficient.clone()))
        });

        let grouped = BcaBootstrap::new(sequential()).with_config(BcaConfig::new().with_internal_se(
            InternalSeMethod::GroupedJackknife {
                groups: 20,
                repetitions: 5,
            },
        ));
        group.bench_with_input(BenchmarkId::new("grouped_se", b), &draws, |bench, draws| {
            bench.iter(|| grouped.parametric(0.0, black_box(draws), sufficient.clone()))
        });
    }

    group.finish();
}

fn bench_limits(c: &mut Criterion) {
    let mut group = c.benchmark_group("Limits");
    let draws = generate_normal_data(2000, 0.0, 1.0, 3);
    let params = BcaParameters {
        point_estimate: 0.0,
        z0: 0.05,
        acceleration: 0.03,
        sd_boot: 1.0,
    };

    group.bench_function("bias_correction", |b| {
        b.iter(|| {
            let mut diagnostics = Diagnostics::new();
            BiasCorrector::default().estimate(black_box(&draws), 0.0, &mut diagnostics)
        })
    });

    for interpolation in [QuantileInterpolation::Linear, QuantileInterpolation::Nearest] {
        let solver = LimitSolver::new(interpolation);
        group.bench_function(format!("solve_{interpolation:?}"), |b| {
            b.iter(|| {
                let mut diagnostics = Diagnostics::new();
                solver.solve(black_box(&draws), &params, &DEFAULT_ALPHAS, &mut diagnostics)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_nonparametric, bench_parametric, bench_limits);
criterion_main!(benches);
