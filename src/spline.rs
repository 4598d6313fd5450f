//! Cubic spline interpolation with not-a-knot end conditions.
//!
//! The sampler refits an interpolant through the same knot abscissae at
//! every posterior evaluation, so the linear system that determines the
//! spline moments is factorized once per knot layout ([`SplineBasis`]) and
//! each refit is a single back-substitution ([`SplineBasis::fit`]).
//!
//! Outside the knot range the outermost cubic pieces are evaluated
//! directly: extrapolation continues the fitted polynomial rather than
//! clamping to the boundary values.

use nalgebra::{DMatrix, DVector, Dyn, LU};

use crate::error::Error;

/// Minimum number of knots for a cubic interpolant.
pub const MIN_KNOTS: usize = 4;

/// Prefactored knot layout for repeated cubic spline fits.
///
/// Holds the knot abscissae, interval widths and the LU factorization of
/// the not-a-knot moment system, all of which depend only on the knot
/// positions and not on the interpolated values.
#[derive(Debug, Clone)]
pub struct SplineBasis {
    x: Vec<f64>,
    h: Vec<f64>,
    lu: LU<f64, Dyn, Dyn>,
}

impl SplineBasis {
    /// Build a basis over strictly increasing knot abscissae.
    ///
    /// Fails with [`Error::Config`] if fewer than [`MIN_KNOTS`] knots are
    /// given or the abscissae are not strictly increasing.
    pub fn new(x: &[f64]) -> Result<Self, Error> {
        let n = x.len();
        if n < MIN_KNOTS {
            return Err(Error::Config {
                field: "knots",
                reason: "cubic interpolation requires at least 4 knots",
            });
        }
        if !x.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::Config {
                field: "knots",
                reason: "knot abscissae must be strictly increasing",
            });
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // Not-a-knot moment system: interior rows impose C2 continuity,
        // the first and last rows impose C3 continuity at x[1] and x[n-2].
        let mut a = DMatrix::<f64>::zeros(n, n);
        a[(0, 0)] = -h[1];
        a[(0, 1)] = h[0] + h[1];
        a[(0, 2)] = -h[0];
        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
        }
        a[(n - 1, n - 3)] = -h[n - 2];
        a[(n - 1, n - 2)] = h[n - 3] + h[n - 2];
        a[(n - 1, n - 1)] = -h[n - 3];

        Ok(Self {
            x: x.to_vec(),
            h,
            lu: a.lu(),
        })
    }

    /// Fit the interpolant through `y` at this basis's knots.
    pub fn fit(&self, y: &[f64]) -> Result<CubicSpline, Error> {
        let n = self.x.len();
        if y.len() != n {
            return Err(Error::ShapeMismatch {
                arg: "y",
                expected: n,
                got: y.len(),
            });
        }

        let mut rhs = DVector::<f64>::zeros(n);
        for i in 1..n - 1 {
            let d_right = (y[i + 1] - y[i]) / self.h[i];
            let d_left = (y[i] - y[i - 1]) / self.h[i - 1];
            rhs[i] = 6.0 * (d_right - d_left);
        }

        let m = self.lu.solve(&rhs).ok_or(Error::Config {
            field: "knots",
            reason: "spline moment system is singular",
        })?;

        Ok(CubicSpline {
            x: self.x.clone(),
            h: self.h.clone(),
            y: y.to_vec(),
            m: m.as_slice().to_vec(),
        })
    }

    /// Knot abscissae.
    pub fn knots(&self) -> &[f64] {
        &self.x
    }
}

/// A fitted cubic interpolant.
///
/// Exact at the knots; piecewise cubic in between; extrapolating with the
/// end polynomials outside the knot range.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    h: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives (moments) at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit a standalone spline through `(x, y)` pairs.
    ///
    /// Prefer [`SplineBasis::fit`] when refitting repeatedly over the same
    /// abscissae.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, Error> {
        SplineBasis::new(x)?.fit(y)
    }

    /// Evaluate the interpolant at a single point.
    pub fn eval(&self, xq: f64) -> f64 {
        let i = self.interval(xq);
        let h = self.h[i];
        let dl = xq - self.x[i];
        let dr = self.x[i + 1] - xq;
        self.m[i] * dr * dr * dr / (6.0 * h)
            + self.m[i + 1] * dl * dl * dl / (6.0 * h)
            + (self.y[i] / h - self.m[i] * h / 6.0) * dr
            + (self.y[i + 1] / h - self.m[i + 1] * h / 6.0) * dl
    }

    /// Evaluate the interpolant at many points.
    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&xq| self.eval(xq)).collect()
    }

    /// Index of the cubic piece covering `xq`, clamped to the outermost
    /// pieces for extrapolation.
    fn interval(&self, xq: f64) -> usize {
        let n = self.x.len();
        self.x
            .partition_point(|&xi| xi <= xq)
            .saturating_sub(1)
            .min(n - 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exact_at_knots() {
        let x = [0.0, 1.0, 2.5, 4.0, 5.0];
        let y = [1.0, -0.5, 3.0, 0.25, 2.0];
        let spline = CubicSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert_relative_eq!(spline.eval(*xi), *yi, max_relative = 1e-12);
        }
    }

    #[test]
    fn reproduces_cubic_polynomials() {
        // A not-a-knot spline through samples of a single cubic must
        // reproduce that cubic everywhere, extrapolation included.
        let p = |x: f64| 2.0 * x * x * x - x * x + 0.5 * x - 3.0;
        let x: Vec<f64> = (0..6).map(|i| i as f64 * 0.7).collect();
        let y: Vec<f64> = x.iter().map(|&xi| p(xi)).collect();
        let spline = CubicSpline::new(&x, &y).unwrap();

        for &xq in &[-1.0, 0.33, 1.7, 2.05, 3.49, 5.0, 7.2] {
            assert_relative_eq!(spline.eval(xq), p(xq), max_relative = 1e-9, epsilon = 1e-9);
        }
    }

    #[test]
    fn linear_data_extrapolates_linearly() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let spline = CubicSpline::new(&x, &y).unwrap();
        assert_relative_eq!(spline.eval(-2.0), -3.0, epsilon = 1e-10);
        assert_relative_eq!(spline.eval(10.0), 21.0, epsilon = 1e-9);
    }

    #[test]
    fn basis_refit_matches_standalone() {
        let x = [0.0, 0.5, 1.0, 2.0, 4.0];
        let y = [0.3, -1.0, 2.0, 2.5, -0.7];
        let basis = SplineBasis::new(&x).unwrap();
        let a = basis.fit(&y).unwrap();
        let b = CubicSpline::new(&x, &y).unwrap();
        for &xq in &[-0.5, 0.25, 0.9, 1.7, 3.3, 5.0] {
            assert_relative_eq!(a.eval(xq), b.eval(xq), epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_too_few_knots() {
        let err = SplineBasis::new(&[0.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::Config { field: "knots", .. }));
    }

    #[test]
    fn rejects_unsorted_knots() {
        let err = SplineBasis::new(&[0.0, 2.0, 1.0, 3.0]).unwrap_err();
        assert!(matches!(err, Error::Config { field: "knots", .. }));
    }

    #[test]
    fn rejects_mismatched_values() {
        let basis = SplineBasis::new(&[0.0, 1.0, 2.0, 3.0]).unwrap();
        let err = basis.fit(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { arg: "y", .. }));
    }
}
