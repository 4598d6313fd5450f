//! Online and robust covariance estimation for chain adaptation.

use nalgebra::{DMatrix, DVector};

/// Online covariance accumulator using Welford's algorithm.
///
/// Accumulates the running mean and the sum of outer products in a single
/// pass, so the proposal re-tuning step can read off the empirical chain
/// covariance without storing or rescanning the history.
///
/// ```text
/// δ  = x - μₙ₋₁
/// μₙ = μₙ₋₁ + δ/n
/// δ' = x - μₙ
/// M2ₙ = M2ₙ₋₁ + δ·δ'ᵀ
/// ```
#[derive(Debug, Clone)]
pub struct WelfordCovariance {
    n: usize,
    mean: DVector<f64>,
    m2: DMatrix<f64>,
}

impl WelfordCovariance {
    /// Create an accumulator for vectors of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            n: 0,
            mean: DVector::zeros(dim),
            m2: DMatrix::zeros(dim, dim),
        }
    }

    /// Fold one vector into the running estimate.
    pub fn update(&mut self, x: &DVector<f64>) {
        self.n += 1;
        let n = self.n as f64;
        let delta = x - &self.mean;
        self.mean += &delta / n;
        let delta2 = x - &self.mean;
        self.m2 += delta * delta2.transpose();
    }

    /// Unbiased sample covariance `M2/(n-1)`, or `None` with fewer than
    /// two observations.
    pub fn finalize(&self) -> Option<DMatrix<f64>> {
        if self.n < 2 {
            return None;
        }
        Some(&self.m2 / (self.n - 1) as f64)
    }

    /// Running mean of the accumulated vectors.
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Number of vectors accumulated so far.
    pub fn count(&self) -> usize {
        self.n
    }
}

/// Sigma-clipped empirical covariance of a sample matrix.
///
/// Alternates covariance estimation with the removal of rows lying more
/// than `n_sigma` standard deviations from the mean in any coordinate,
/// for `n_iter` rounds. Useful for re-seeding a proposal covariance from
/// a previous chain without letting early transient excursions inflate
/// the step scale.
///
/// Returns the clipped covariance and the number of retained samples, or
/// `None` if fewer than two samples survive.
pub fn clipped_covariance(
    samples: &[DVector<f64>],
    n_iter: usize,
    n_sigma: f64,
) -> Option<(DMatrix<f64>, usize)> {
    if samples.len() < 2 {
        return None;
    }
    let dim = samples[0].len();

    let accumulate = |kept: &[&DVector<f64>]| {
        let mut acc = WelfordCovariance::new(dim);
        for x in kept {
            acc.update(x);
        }
        acc
    };

    let mut kept: Vec<&DVector<f64>> = samples.iter().collect();
    let mut acc = accumulate(&kept);

    for _ in 0..n_iter {
        let cov = acc.finalize()?;
        let mean = acc.mean().clone();
        let bounds: Vec<f64> = (0..dim).map(|k| n_sigma * cov[(k, k)].sqrt()).collect();

        let survivors: Vec<&DVector<f64>> = kept
            .iter()
            .copied()
            .filter(|x| (0..dim).all(|k| (x[k] - mean[k]).abs() <= bounds[k]))
            .collect();
        if survivors.len() == kept.len() {
            break;
        }
        kept = survivors;
        if kept.len() < 2 {
            return None;
        }
        acc = accumulate(&kept);
    }

    let count = kept.len();
    acc.finalize().map(|cov| (cov, count))
}
