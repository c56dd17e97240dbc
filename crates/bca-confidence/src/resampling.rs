//! Resampling frequency generation
//!
//! A nonparametric bootstrap replicate is fully described by how many times
//! each observation was drawn. Rows of a [`CountMatrix`] are those
//! frequency vectors, one per replicate.

use bca_core::{Error, Result};
use rand::Rng;
use tracing::debug;

/// B x n matrix of resampling counts, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMatrix {
    n_replicates: usize,
    n_observations: usize,
    counts: Vec<u32>,
}

impl CountMatrix {
    /// Build from row-major counts
    ///
    /// Every row must have `n_observations` entries and sum to the same
    /// total.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self> {
        let n_replicates = rows.len();
        let n_observations = rows.first().map(Vec::len).unwrap_or(0);
        if n_replicates == 0 || n_observations == 0 {
            return Err(Error::InvalidInput("Count matrix is empty".to_string()));
        }

        let total: u64 = rows[0].iter().map(|&c| c as u64).sum();
        let mut counts = Vec::with_capacity(n_replicates * n_observations);
        for (b, row) in rows.into_iter().enumerate() {
            if row.len() != n_observations {
                return Err(Error::size_mismatch(
                    n_observations,
                    row.len(),
                    &format!("count matrix row {b}"),
                ));
            }
            let row_total: u64 = row.iter().map(|&c| c as u64).sum();
            if row_total != total {
                return Err(Error::InvalidInput(format!(
                    "Count matrix row {b} sums to {row_total}, expected {total}"
                )));
            }
            counts.extend(row);
        }

        Ok(Self {
            n_replicates,
            n_observations,
            counts,
        })
    }

    pub fn n_replicates(&self) -> usize {
        self.n_replicates
    }

    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// Counts for replicate `b`
    pub fn row(&self, b: usize) -> &[u32] {
        let start = b * self.n_observations;
        &self.counts[start..start + self.n_observations]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.counts.chunks(self.n_observations)
    }

    /// Keep only the listed replicate rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut counts = Vec::with_capacity(rows.len() * self.n_observations);
        for &b in rows {
            counts.extend_from_slice(self.row(b));
        }
        Self {
            n_replicates: rows.len(),
            n_observations: self.n_observations,
            counts,
        }
    }

    /// Row-major copy as floating point, the regression design
    pub fn to_f64(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }
}

/// Expand a count row into observation indices (`[0, 2, 0]` -> `[1, 1]`)
pub fn expand_counts(counts: &[u32]) -> Vec<usize> {
    let total: usize = counts.iter().map(|&c| c as usize).sum();
    let mut indices = Vec::with_capacity(total);
    for (i, &c) in counts.iter().enumerate() {
        indices.extend(std::iter::repeat(i).take(c as usize));
    }
    indices
}

/// Draw `n_replicates` multinomial(n, 1/n) count vectors
///
/// Each row records a uniform with-replacement resample of the `n`
/// observations. Randomness comes only from `rng`, so a seeded generator
/// reproduces the matrix exactly.
pub fn generate_counts<R: Rng + ?Sized>(
    rng: &mut R,
    n_observations: usize,
    n_replicates: usize,
) -> Result<CountMatrix> {
    if n_replicates < 2 {
        return Err(Error::InvalidParameter(format!(
            "Number of replicates must be at least 2, got {n_replicates}"
        )));
    }
    if n_observations < 2 {
        return Err(Error::InvalidParameter(format!(
            "Sample size must be at least 2, got {n_observations}"
        )));
    }

    debug!(
        "Generating {} resampling count vectors for {} observations",
        n_replicates, n_observations
    );

    let mut counts = vec![0u32; n_replicates * n_observations];
    for row in counts.chunks_mut(n_observations) {
        for _ in 0..n_observations {
            row[rng.gen_range(0..n_observations)] += 1;
        }
    }

    Ok(CountMatrix {
        n_replicates,
        n_observations,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_rows_sum_to_sample_size() {
        let mut rng = StdRng::seed_from_u64(42);
        let counts = generate_counts(&mut rng, 7, 50).unwrap();

        assert_eq!(counts.n_replicates(), 50);
        assert_eq!(counts.n_observations(), 7);
        for row in counts.rows() {
            assert_eq!(row.iter().sum::<u32>(), 7);
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_counts(&mut StdRng::seed_from_u64(9), 10, 20).unwrap();
        let b = generate_counts(&mut StdRng::seed_from_u64(9), 10, 20).unwrap();
        let c = generate_counts(&mut StdRng::seed_from_u64(10), 10, 20).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_average_count_is_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let counts = generate_counts(&mut rng, 5, 4000).unwrap();
        for i in 0..5 {
            let mean = counts.rows().map(|r| r[i] as f64).sum::<f64>() / 4000.0;
            assert!((mean - 1.0).abs() < 0.05, "column {i} mean {mean}");
        }
    }

    #[test]
    fn test_rejects_degenerate_sizes() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            generate_counts(&mut rng, 10, 1),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            generate_counts(&mut rng, 1, 100),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_expand_and_select() {
        assert_eq!(expand_counts(&[0, 2, 1]), vec![1, 1, 2]);

        let counts = CountMatrix::from_rows(vec![vec![1, 1, 1], vec![3, 0, 0], vec![0, 1, 2]])
            .unwrap();
        let selected = counts.select_rows(&[2, 0]);
        assert_eq!(selected.n_replicates(), 2);
        assert_eq!(selected.row(0), &[0, 1, 2]);
        assert_eq!(selected.row(1), &[1, 1, 1]);
    }

    #[test]
    fn test_from_rows_validates_shape() {
        assert!(CountMatrix::from_rows(vec![]).is_err());
        assert!(CountMatrix::from_rows(vec![vec![1, 1], vec![2]]).is_err());
        assert!(CountMatrix::from_rows(vec![vec![1, 1], vec![2, 1]]).is_err());
    }
}
