//! Whittle log-likelihood and Gaussian log-prior for the PSD parameters.
//!
//! Under the Whittle approximation the periodogram bins are independent
//! exponential variates around the true spectrum, giving per segment
//!
//! ```text
//! ℓ(x) = -0.5 Σₖ [ log S(fₖ) + I(fₖ) / S(fₖ) ]
//! ```
//!
//! over the positive Fourier bins, with `log S` interpolated from the
//! control values `x`. Independent segments add their log-likelihoods.
//!
//! Overflow in `exp` and non-finite interpolated values are deliberately
//! propagated as `±inf` rather than raised: the Metropolis-Hastings core
//! rejects such proposals through the posterior comparison.

use nalgebra::DVector;

use crate::model::SplinePsdModel;
use crate::periodogram::Periodogram;
use crate::spline::CubicSpline;

/// Whittle log-likelihood of control values `x` given the stored
/// periodogram(s).
pub(crate) fn whittle_log_likelihood(
    model: &SplinePsdModel,
    periodogram: &Periodogram,
    x: &DVector<f64>,
) -> f64 {
    let spline = match model.basis().fit(x.as_slice()) {
        Ok(spline) => spline,
        Err(_) => return f64::NEG_INFINITY,
    };

    match periodogram {
        Periodogram::Single(i_data) => {
            let grid = model
                .grid(model.n_data())
                .expect("primary segment grid exists by construction");
            segment_log_likelihood(&spline, grid, i_data)
        }
        Periodogram::Multi(segments) => model
            .segment_lengths()
            .iter()
            .zip(segments.iter())
            .map(|(&n, i_data)| {
                let grid = model
                    .grid(n)
                    .expect("segment grids exist by construction");
                segment_log_likelihood(&spline, grid, i_data)
            })
            .sum(),
    }
}

/// One segment's contribution over its positive Fourier bins.
fn segment_log_likelihood(spline: &CubicSpline, grid: &[f64], i_data: &[f64]) -> f64 {
    debug_assert!(i_data.len() > grid.len());
    let mut acc = 0.0;
    for (k, &log_f) in grid.iter().enumerate() {
        let log_s = spline.eval(log_f);
        // Bin k+1 of the periodogram: the grid excludes DC.
        acc += log_s + i_data[k + 1] * (-log_s).exp();
    }
    -0.5 * acc
}

/// Gaussian log-prior regularizing the control values toward the
/// reference spectrum `log_sc` with per-knot variances `var_log_sc`.
///
/// Zero at the reference; no normalization constant, since only relative
/// posterior values enter the acceptance ratio.
pub(crate) fn gaussian_log_prior(
    x: &DVector<f64>,
    log_sc: &DVector<f64>,
    var_log_sc: &DVector<f64>,
) -> f64 {
    let mut acc = 0.0;
    for i in 0..x.len() {
        let d = x[i] - log_sc[i];
        acc += d * d / (2.0 * var_log_sc[i]);
    }
    -0.5 * acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PsdConfig;
    use crate::model::one_sided_len;
    use approx::assert_relative_eq;

    fn flat_model(n_data: usize) -> (SplinePsdModel, DVector<f64>) {
        let model = SplinePsdModel::new(&PsdConfig::new(n_data, 1.0).knots(4)).unwrap();
        let x = DVector::from_element(5, 0.0);
        (model, x)
    }

    #[test]
    fn prior_is_zero_at_reference() {
        let log_sc = DVector::from_vec(vec![0.3, -1.2, 4.0, 0.0]);
        let var = DVector::from_element(4, 0.7);
        assert_eq!(gaussian_log_prior(&log_sc.clone(), &log_sc, &var), 0.0);
    }

    #[test]
    fn prior_matches_hand_computation() {
        // One knot displaced by 1 with unit variance: -0.5 * 1/(2*1).
        let log_sc = DVector::from_element(3, 0.0);
        let var = DVector::from_element(3, 1.0);
        let x = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        assert_relative_eq!(gaussian_log_prior(&x, &log_sc, &var), -0.25, epsilon = 1e-15);
    }

    #[test]
    fn flat_spectrum_unit_periodogram_likelihood() {
        // log S = 0 and I = 1 give -0.5*(0 + 1) per bin.
        let (model, x) = flat_model(64);
        let bins = one_sided_len(64);
        let pdg = Periodogram::Single(vec![1.0; 64]);
        let ll = whittle_log_likelihood(&model, &pdg, &x);
        assert_relative_eq!(ll, -0.5 * bins as f64, epsilon = 1e-9);
    }

    #[test]
    fn two_equal_segments_double_the_likelihood() {
        let single_model = SplinePsdModel::new(&PsdConfig::new(64, 1.0).knots(4)).unwrap();
        let multi_model = SplinePsdModel::new(
            &PsdConfig::new(64, 1.0).knots(4).segments(vec![64, 64]),
        )
        .unwrap();
        let x = DVector::from_vec(vec![0.4, -0.2, 0.1, 0.8, -0.5]);

        let i_seg: Vec<f64> = (0..64).map(|k| 0.5 + 0.01 * k as f64).collect();
        let ll_single =
            whittle_log_likelihood(&single_model, &Periodogram::Single(i_seg.clone()), &x);
        let ll_multi = whittle_log_likelihood(
            &multi_model,
            &Periodogram::Multi(vec![i_seg.clone(), i_seg]),
            &x,
        );
        assert_relative_eq!(ll_multi, 2.0 * ll_single, epsilon = 1e-9);
    }

    #[test]
    fn nonfinite_control_values_yield_nonfinite_likelihood() {
        let (model, _) = flat_model(64);
        let x = DVector::from_vec(vec![0.0, f64::NAN, 0.0, 0.0, 0.0]);
        let pdg = Periodogram::Single(vec![1.0; 64]);
        assert!(!whittle_log_likelihood(&model, &pdg, &x).is_finite());
    }

    #[test]
    fn extreme_control_values_propagate_infinity() {
        // Deeply negative log-PSD overflows exp(-logS) into +inf and the
        // log-likelihood into -inf, without panicking.
        let (model, _) = flat_model(64);
        let x = DVector::from_element(5, -800.0);
        let pdg = Periodogram::Single(vec![1.0; 64]);
        assert_eq!(
            whittle_log_likelihood(&model, &pdg, &x),
            f64::NEG_INFINITY
        );
    }
}
