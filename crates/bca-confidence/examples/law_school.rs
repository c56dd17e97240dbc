//! BCa limits for the law school correlation
//!
//! Run with `RUST_LOG=bca_confidence=debug` to trace the analysis.

use bca_confidence::{AccelerationMethod, BcaBootstrap, BcaConfig, Correlation, Mean};
use bca_core::auto_engine;
use tracing_subscriber::EnvFilter;

/// Average LSAT score and undergraduate GPA of 15 American law schools
const LAW_SCHOOL: [(f64, f64); 15] = [
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== BCa Bootstrap: Law School Data ===\n");

    // Example 1: correlation with jackknife acceleration
    println!("1. LSAT/GPA correlation, jackknife acceleration");
    let config = BcaConfig::new()
        .with_replicates(2000)
        .with_confidence_levels(&[0.8, 0.9, 0.95])
        .with_seed(1982);
    let bootstrap = BcaBootstrap::new(auto_engine()).with_config(config.clone());
    let result = bootstrap.nonparametric_seeded(&LAW_SCHOOL, &Correlation)?;
    println!("{result}");

    for level in [0.8, 0.9, 0.95] {
        let bca = result.interval(level)?;
        let standard = result.limits.standard_interval(level)?;
        println!("  BCa      {bca}");
        println!("  standard {standard}");
    }

    // Example 2: same analysis, acceleration from regression on the counts
    println!("\n2. LSAT/GPA correlation, regression acceleration");
    let regression = BcaBootstrap::new(auto_engine())
        .with_config(config.with_acceleration(AccelerationMethod::Regression))
        .nonparametric_seeded(&LAW_SCHOOL, &Correlation)?;
    if let Some(fit) = &regression.extended.regression {
        println!(
            "  a = {:.4} (jackknife {:.4}), r^2 = {:.3}",
            fit.acceleration, result.statistics.acceleration, fit.r_squared
        );
    }
    let ustats = &regression.extended.ustats;
    println!("  U-statistic: {:.4} (se {:.4})", ustats.ustat, ustats.sdu);

    // Example 3: mean LSAT, JSON report
    println!("\n3. Mean LSAT as JSON");
    let lsat: Vec<f64> = LAW_SCHOOL.iter().map(|&(score, _)| score).collect();
    let mean = BcaBootstrap::new(auto_engine())
        .with_replicates(1000)
        .with_confidence_levels(&[0.9])
        .with_seed(7)
        .nonparametric_seeded(&lsat, &Mean)?;
    println!("{}", mean.to_json()?);

    Ok(())
}
