//! Shared fixtures for the integration tests
#![allow(dead_code)]

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal};

/// LSAT and GPA averages of 15 law schools
pub const LAW_SCHOOL: [(f64, f64); 15] = [
    (576.0, 3.39),
    (635.0, 3.30),
    (558.0, 2.81),
    (578.0, 3.03),
    (666.0, 3.44),
    (580.0, 3.07),
    (555.0, 3.00),
    (661.0, 3.43),
    (651.0, 3.36),
    (605.0, 3.13),
    (653.0, 3.12),
    (575.0, 2.74),
    (545.0, 2.76),
    (572.0, 2.88),
    (594.0, 2.96),
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("bca_confidence=debug")
        .try_init();
}

pub fn normal_sample(seed: u64, n: usize, mean: f64, sd: f64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(mean, sd).unwrap();
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

pub fn exponential_sample(seed: u64, n: usize, rate: f64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let exp = Exp::new(rate).unwrap();
    (0..n).map(|_| exp.sample(&mut rng)).collect()
}

/// `values` together with their reflections about `center`
pub fn mirrored(values: &[f64], center: f64) -> Vec<f64> {
    values
        .iter()
        .flat_map(|&v| [center + (v - center).abs(), center - (v - center).abs()])
        .collect()
}
