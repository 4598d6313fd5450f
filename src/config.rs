//! Configuration for the spline PSD sampler.

use crate::constants::DEFAULT_SEED;
use crate::error::Error;

/// Configuration options for [`PsdSampler`](crate::PsdSampler).
///
/// Frequency layout is fixed at construction: the knot log-frequencies and
/// the per-segment Fourier grids are derived once from the sampling rate
/// and the segment length(s), and only the log-power values at the knots
/// vary during sampling.
#[derive(Debug, Clone)]
pub struct PsdConfig {
    /// Length (in time samples) of the primary analysis segment. Defines
    /// the frequency grid of the cached, discretized PSD.
    pub n_data: usize,

    /// Sampling rate in Hz.
    pub fs: f64,

    /// Number of knot intervals `J`. The spline carries `J + 1` control
    /// points, which is the dimension of the sampled parameter vector.
    ///
    /// Default: 30. Must be at least 3 so that the cubic interpolant has
    /// its minimum of 4 knots.
    pub j: usize,

    /// Lowest knot frequency in Hz. Default: `fs / n_data` (the first
    /// Fourier bin of the primary segment).
    pub fmin: Option<f64>,

    /// Highest knot frequency in Hz. Default: `fs / 2` (Nyquist).
    pub fmax: Option<f64>,

    /// Segment lengths for multi-segment analysis, order-significant:
    /// periodograms supplied as a list are aligned with these by index.
    ///
    /// Default: `None`, meaning a single segment of `n_data` samples.
    pub segments: Option<Vec<usize>>,

    /// Deterministic RNG seed for the proposal and acceptance draws.
    pub seed: u64,
}

impl PsdConfig {
    /// Create a configuration for one segment of `n_data` samples at
    /// sampling rate `fs`.
    pub fn new(n_data: usize, fs: f64) -> Self {
        Self {
            n_data,
            fs,
            j: 30,
            fmin: None,
            fmax: None,
            segments: None,
            seed: DEFAULT_SEED,
        }
    }

    /// Set the number of knot intervals.
    pub fn knots(mut self, j: usize) -> Self {
        self.j = j;
        self
    }

    /// Restrict the knot range to `[fmin, fmax]` Hz.
    pub fn frequency_range(mut self, fmin: f64, fmax: f64) -> Self {
        self.fmin = Some(fmin);
        self.fmax = Some(fmax);
        self
    }

    /// Analyze several independent segments of the given lengths.
    pub fn segments(mut self, lengths: Vec<usize>) -> Self {
        self.segments = Some(lengths);
        self
    }

    /// Set a deterministic RNG seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Resolved lowest knot frequency.
    pub fn resolved_fmin(&self) -> f64 {
        self.fmin.unwrap_or(self.fs / self.n_data as f64)
    }

    /// Resolved highest knot frequency.
    pub fn resolved_fmax(&self) -> f64 {
        self.fmax.unwrap_or(self.fs / 2.0)
    }

    /// Segment lengths the likelihood will see, in order.
    pub fn segment_lengths(&self) -> Vec<usize> {
        match &self.segments {
            Some(lengths) => lengths.clone(),
            None => vec![self.n_data],
        }
    }

    /// Check the configuration, failing fast on invalid construction.
    pub fn validate(&self) -> Result<(), Error> {
        if self.fs <= 0.0 || !self.fs.is_finite() {
            return Err(Error::Config {
                field: "fs",
                reason: "sampling rate must be positive and finite",
            });
        }
        if self.n_data < 4 {
            return Err(Error::Config {
                field: "n_data",
                reason: "segment length must be at least 4",
            });
        }
        if self.j < 3 {
            return Err(Error::Config {
                field: "j",
                reason: "cubic spline needs at least 3 knot intervals",
            });
        }
        let fmin = self.resolved_fmin();
        let fmax = self.resolved_fmax();
        if fmin <= 0.0 || !fmin.is_finite() {
            return Err(Error::Config {
                field: "fmin",
                reason: "lowest knot frequency must be positive and finite",
            });
        }
        if fmax <= fmin || !fmax.is_finite() {
            return Err(Error::Config {
                field: "fmax",
                reason: "highest knot frequency must exceed fmin and be finite",
            });
        }
        if let Some(lengths) = &self.segments {
            if lengths.is_empty() {
                return Err(Error::Config {
                    field: "segments",
                    reason: "segment list must not be empty",
                });
            }
            if lengths.iter().any(|&n| n < 4) {
                return Err(Error::Config {
                    field: "segments",
                    reason: "every segment length must be at least 4",
                });
            }
        }
        Ok(())
    }
}
