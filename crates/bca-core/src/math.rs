//! Mathematical utilities for bootstrap analysis
//!
//! Normal-distribution functions used by the bias-correction and limit
//! computations, and the descriptive moments used for bootstrap standard
//! errors and skewness-based acceleration.

/// Distribution-related mathematical functions
pub mod distributions {
    /// Standard normal distribution utilities
    pub mod normal {
        use statrs::function::erf::{erfc, erfc_inv};
        use std::f64::consts::{PI, SQRT_2};

        /// Cumulative distribution function of the standard normal distribution
        pub fn cdf(x: f64) -> f64 {
            if x.is_nan() {
                return f64::NAN;
            }
            0.5 * erfc(-x / SQRT_2)
        }

        /// Inverse cumulative distribution function (quantile function)
        /// of the standard normal distribution
        ///
        /// Returns the signed infinities at 0 and 1.
        pub fn ppf(p: f64) -> f64 {
            if p.is_nan() {
                return f64::NAN;
            }
            if p <= 0.0 {
                return f64::NEG_INFINITY;
            }
            if p >= 1.0 {
                return f64::INFINITY;
            }
            if (p - 0.5).abs() < 1e-15 {
                return 0.0;
            }
            -SQRT_2 * erfc_inv(2.0 * p)
        }

        /// Alias for ppf (percent point function) that matches common naming
        #[inline]
        pub fn quantile(p: f64) -> f64 {
            ppf(p)
        }

        /// Density of the standard normal distribution
        pub fn pdf(x: f64) -> f64 {
            (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
        }

    }
}

/// Descriptive moments over plain slices
pub mod moments {
    /// Arithmetic mean; NaN for empty input
    pub fn mean(data: &[f64]) -> f64 {
        if data.is_empty() {
            return f64::NAN;
        }
        data.iter().sum::<f64>() / data.len() as f64
    }

    /// Sample standard deviation with the n - 1 divisor
    pub fn sample_sd(data: &[f64]) -> f64 {
        if data.len() < 2 {
            return 0.0;
        }
        let m = mean(data);
        let ss: f64 = data.iter().map(|&x| (x - m) * (x - m)).sum();
        (ss / (data.len() - 1) as f64).sqrt()
    }

    /// k-th central moment with the 1/n divisor
    pub fn central_moment(data: &[f64], center: f64, k: i32) -> f64 {
        if data.is_empty() {
            return f64::NAN;
        }
        data.iter().map(|&x| (x - center).powi(k)).sum::<f64>() / data.len() as f64
    }

    /// Delete-a-group jackknife standard error of `statistic`
    ///
    /// Splits `0..len` into `groups` contiguous blocks, re-evaluates the
    /// statistic with each block removed and applies the jackknife
    /// variance formula `(g - 1) / g * sum((s_j - mean(s))^2)`. Groups whose
    /// statistic is non-finite are skipped; fewer than two usable groups
    /// yields `None`.
    pub fn grouped_jackknife_se<F>(len: usize, groups: usize, mut statistic: F) -> Option<f64>
    where
        F: FnMut(&[usize]) -> f64,
    {
        let groups = groups.min(len);
        if groups < 2 {
            return None;
        }

        let mut values = Vec::with_capacity(groups);
        let mut kept = Vec::with_capacity(len);
        for g in 0..groups {
            let start = g * len / groups;
            let end = (g + 1) * len / groups;
            kept.clear();
            kept.extend((0..start).chain(end..len));
            let value = statistic(&kept);
            if value.is_finite() {
                values.push(value);
            }
        }

        if values.len() < 2 {
            return None;
        }
        let g = values.len() as f64;
        let m = mean(&values);
        let ss: f64 = values.iter().map(|&v| (v - m) * (v - m)).sum();
        Some(((g - 1.0) / g * ss).sqrt())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use approx::assert_relative_eq;

        #[test]
        fn test_mean_and_sd() {
            let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
            assert_relative_eq!(mean(&data), 5.0);
            assert_relative_eq!(sample_sd(&data), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
            assert!(mean(&[]).is_nan());
            assert_eq!(sample_sd(&[3.0]), 0.0);
        }

        #[test]
        fn test_central_moment() {
            let data = [-1.0, 0.0, 1.0];
            assert_relative_eq!(central_moment(&data, 0.0, 2), 2.0 / 3.0);
            assert_relative_eq!(central_moment(&data, 0.0, 3), 0.0);
        }

        #[test]
        fn test_grouped_jackknife_matches_delete_one_for_mean() {
            // With one observation per group the grouped jackknife of the mean
            // reduces to the classical standard error s / sqrt(n).
            let data = [1.0, 3.0, 4.0, 8.0, 9.0];
            let se = grouped_jackknife_se(data.len(), data.len(), |kept| {
                kept.iter().map(|&i| data[i]).sum::<f64>() / kept.len() as f64
            })
            .unwrap();
            let expected = sample_sd(&data) / (data.len() as f64).sqrt();
            assert_relative_eq!(se, expected, epsilon = 1e-12);
        }

        #[test]
        fn test_grouped_jackknife_needs_two_groups() {
            assert!(grouped_jackknife_se(1, 10, |_| 1.0).is_none());
            assert!(grouped_jackknife_se(10, 4, |_| f64::NAN).is_none());
        }
    }
}
