//! Spline model of the noise power spectrum.
//!
//! The log-PSD is parameterized by `J + 1` control points at fixed,
//! log-spaced knot frequencies; a cubic interpolant through the control
//! values defines the spectrum everywhere else. The model owns the knot
//! layout and one Fourier grid per configured segment length, all derived
//! once at construction.

use std::collections::BTreeMap;

use nalgebra::DVector;

use crate::config::PsdConfig;
use crate::error::Error;
use crate::spline::{CubicSpline, SplineBasis};

/// Number of positive (one-sided, DC excluded) Fourier bins for a segment
/// of `n` samples.
pub(crate) fn one_sided_len(n: usize) -> usize {
    (n - 1) / 2
}

/// Spline-parameterized log-PSD model over fixed frequency grids.
#[derive(Debug, Clone)]
pub struct SplinePsdModel {
    fs: f64,
    n_data: usize,
    basis: SplineBasis,
    /// Configured segment lengths, in likelihood order.
    segment_lengths: Vec<usize>,
    /// Segment length → one-sided log-frequency grid (bins `1..=n`).
    grids: BTreeMap<usize, Vec<f64>>,
    spline: Option<CubicSpline>,
    psd: Option<Vec<f64>>,
}

impl SplinePsdModel {
    /// Build the model from a validated configuration.
    pub fn new(config: &PsdConfig) -> Result<Self, Error> {
        config.validate()?;

        let log_fmin = config.resolved_fmin().ln();
        let log_fmax = config.resolved_fmax().ln();
        let j = config.j;
        let knots: Vec<f64> = (0..=j)
            .map(|i| log_fmin + (log_fmax - log_fmin) * i as f64 / j as f64)
            .collect();
        let basis = SplineBasis::new(&knots)?;

        let mut grids = BTreeMap::new();
        for n in config
            .segment_lengths()
            .into_iter()
            .chain(std::iter::once(config.n_data))
        {
            grids
                .entry(n)
                .or_insert_with(|| log_frequency_grid(n, config.fs));
        }

        Ok(Self {
            fs: config.fs,
            n_data: config.n_data,
            basis,
            segment_lengths: config.segment_lengths(),
            grids,
            spline: None,
            psd: None,
        })
    }

    /// Rebuild the interpolant from new control values at the fixed knot
    /// log-frequencies, then recompute and cache the discretized PSD over
    /// the primary segment's `n_data` Fourier bins.
    pub fn update(&mut self, log_s: &DVector<f64>) -> Result<(), Error> {
        let spline = self.basis.fit(log_s.as_slice())?;
        self.psd = Some(self.discretize(&spline));
        self.spline = Some(spline);
        Ok(())
    }

    /// Evaluate the current log-PSD interpolant at arbitrary frequencies
    /// in Hz. Pure: never mutates cached state.
    pub fn evaluate(&self, frequencies: &[f64]) -> Result<Vec<f64>, Error> {
        let spline = self
            .spline
            .as_ref()
            .ok_or(Error::MissingState("spline control values"))?;
        if frequencies.iter().any(|&f| f <= 0.0 || !f.is_finite()) {
            return Err(Error::Config {
                field: "frequencies",
                reason: "evaluation frequencies must be positive and finite",
            });
        }
        Ok(frequencies.iter().map(|&f| spline.eval(f.ln())).collect())
    }

    /// Cached two-sided PSD over the primary segment's Fourier bins, or
    /// `None` before the first [`update`](Self::update).
    pub fn psd(&self) -> Option<&[f64]> {
        self.psd.as_deref()
    }

    /// Fixed knot log-frequencies.
    pub fn knot_log_freqs(&self) -> &[f64] {
        self.basis.knots()
    }

    /// Number of control points (`J + 1`).
    pub fn n_knots(&self) -> usize {
        self.basis.knots().len()
    }

    /// Primary segment length.
    pub fn n_data(&self) -> usize {
        self.n_data
    }

    /// Sampling rate in Hz.
    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub(crate) fn basis(&self) -> &SplineBasis {
        &self.basis
    }

    /// Configured segment lengths, in likelihood order.
    pub(crate) fn segment_lengths(&self) -> &[usize] {
        &self.segment_lengths
    }

    /// One-sided log-frequency grid for a configured segment length.
    pub(crate) fn grid(&self, n: usize) -> Option<&[f64]> {
        self.grids.get(&n).map(Vec::as_slice)
    }

    /// Discretize the spectrum over all `n_data` Fourier bins.
    ///
    /// The DC bin takes the value of the first positive bin (its
    /// log-frequency is undefined); for even lengths the Nyquist bin is
    /// evaluated at `fs/2`; negative-frequency bins mirror the positive
    /// ones, `S[n_data - k] = S[k]`.
    fn discretize(&self, spline: &CubicSpline) -> Vec<f64> {
        let n = self.n_data;
        let half = one_sided_len(n);
        let grid = &self.grids[&n];

        let mut s = vec![0.0; n];
        for k in 1..=half {
            s[k] = spline.eval(grid[k - 1]).exp();
        }
        s[0] = s[1];
        if n % 2 == 0 {
            s[n / 2] = spline.eval((self.fs / 2.0).ln()).exp();
        }
        for k in 1..=half {
            s[n - k] = s[k];
        }
        s
    }
}

/// Log-frequencies of the positive Fourier bins `k fs / n`, `k = 1..=n/2`.
fn log_frequency_grid(n: usize, fs: f64) -> Vec<f64> {
    (1..=one_sided_len(n))
        .map(|k| (k as f64 * fs / n as f64).ln())
        .collect()
}
