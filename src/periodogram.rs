//! Periodogram construction from residual DFTs.

use num_complex::Complex64;

/// Periodogram of the analysis residuals, resolved into its segment shape
/// once when the data is supplied.
///
/// Downstream consumers (the Whittle likelihood) match on the variant
/// instead of re-inspecting container shapes at every evaluation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Periodogram {
    /// One data segment.
    Single(Vec<f64>),
    /// Several independent segments, aligned by index with the configured
    /// segment lengths.
    Multi(Vec<Vec<f64>>),
}

impl Periodogram {
    /// Number of segments carried.
    pub fn segment_count(&self) -> usize {
        match self {
            Periodogram::Single(_) => 1,
            Periodogram::Multi(segments) => segments.len(),
        }
    }
}

/// Squared-magnitude periodogram of a residual DFT.
///
/// `k2` is the window energy `Σ wᵢ²` of the taper applied in the time
/// domain; when `None`, the data length is used (rectangular window).
/// Build the periodogram once per residual update, not per likelihood
/// evaluation.
pub fn periodogram(dft: &[Complex64], k2: Option<f64>) -> Vec<f64> {
    let norm = k2.unwrap_or(dft.len() as f64);
    dft.iter().map(|z| z.norm_sqr() / norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_normalization_is_data_length() {
        let dft: Vec<Complex64> = (0..16)
            .map(|k| Complex64::new(k as f64, -(k as f64) * 0.5))
            .collect();
        let explicit = periodogram(&dft, Some(16.0));
        let implicit = periodogram(&dft, None);
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn window_energy_rescales() {
        let dft = vec![Complex64::new(3.0, 4.0); 8];
        let i = periodogram(&dft, Some(2.0));
        for v in i {
            assert_relative_eq!(v, 12.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn periodogram_is_real_and_nonnegative() {
        let dft = vec![
            Complex64::new(-1.0, 2.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(1e-8, -1e-8),
        ];
        for v in periodogram(&dft, None) {
            assert!(v >= 0.0);
        }
    }

    #[test]
    fn segment_count_tracks_shape() {
        assert_eq!(Periodogram::Single(vec![1.0; 8]).segment_count(), 1);
        let multi = Periodogram::Multi(vec![vec![1.0; 8], vec![1.0; 6]]);
        assert_eq!(multi.segment_count(), 2);
    }
}
