//! PSD sampler orchestration.
//!
//! [`PsdSampler`] composes the pieces: it owns the spline model, the
//! periodogram of the residuals and the reference prior, and wires the
//! posterior (Whittle likelihood + Gaussian prior) into the
//! Metropolis-Hastings engine as an injected closure.

use nalgebra::DVector;
use num_complex::Complex64;

use crate::config::PsdConfig;
use crate::constants::{EULER_GAMMA, LOG_EXP_VARIANCE};
use crate::error::Error;
use crate::mcmc::{McmcChain, MhSampler, ProposalScale};
use crate::model::SplinePsdModel;
use crate::periodogram::{periodogram, Periodogram};
use crate::posterior::{gaussian_log_prior, whittle_log_likelihood};

/// Reference spectrum and per-knot prior variances.
#[derive(Debug, Clone)]
struct Reference {
    log_sc: DVector<f64>,
    var_log_sc: DVector<f64>,
}

/// Metropolis-Hastings sampler for spline PSD parameters.
///
/// Typical lifecycle: construct from a [`PsdConfig`], supply residual
/// DFTs via [`set_periodogram`](Self::set_periodogram), fix the prior via
/// [`set_reference`](Self::set_reference) or
/// [`estimate_reference`](Self::estimate_reference), then run
/// [`sample_psd`](Self::sample_psd). The cached spline state is *not*
/// updated by a run; callers pass a chain summary to
/// [`update_psd`](Self::update_psd) explicitly.
#[derive(Debug, Clone)]
pub struct PsdSampler {
    model: SplinePsdModel,
    mh: MhSampler,
    periodogram: Option<Periodogram>,
    reference: Option<Reference>,
}

impl PsdSampler {
    /// Build a sampler from a configuration, failing fast on invalid
    /// construction.
    pub fn new(config: PsdConfig) -> Result<Self, Error> {
        let model = SplinePsdModel::new(&config)?;
        let mh = MhSampler::new(model.n_knots(), config.seed);
        Ok(Self {
            model,
            mh,
            periodogram: None,
            reference: None,
        })
    }

    /// Store the periodogram of a single residual DFT segment.
    ///
    /// `k2` is the window energy `Σ wᵢ²`; `None` selects the data-length
    /// normalization. The periodogram is rebuilt here, once per residual
    /// update, and never implicitly recomputed by likelihood queries.
    pub fn set_periodogram(&mut self, dft: &[Complex64], k2: Option<f64>) -> Result<(), Error> {
        if dft.len() != self.model.n_data() {
            return Err(Error::ShapeMismatch {
                arg: "dft",
                expected: self.model.n_data(),
                got: dft.len(),
            });
        }
        self.periodogram = Some(Periodogram::Single(periodogram(dft, k2)));
        Ok(())
    }

    /// Store periodograms for several independent residual segments,
    /// aligned by index with the configured segment lengths.
    pub fn set_periodogram_segments(
        &mut self,
        dfts: &[Vec<Complex64>],
        k2: Option<f64>,
    ) -> Result<(), Error> {
        let lengths = self.model.segment_lengths();
        if dfts.len() != lengths.len() {
            return Err(Error::ShapeMismatch {
                arg: "dfts",
                expected: lengths.len(),
                got: dfts.len(),
            });
        }
        for (dft, &n) in dfts.iter().zip(lengths.iter()) {
            if dft.len() != n {
                return Err(Error::ShapeMismatch {
                    arg: "dfts",
                    expected: n,
                    got: dft.len(),
                });
            }
        }
        self.periodogram = Some(Periodogram::Multi(
            dfts.iter().map(|dft| periodogram(dft, k2)).collect(),
        ));
        Ok(())
    }

    /// Set the reference log-PSD and its per-knot prior variances.
    ///
    /// Immutable during a sampling run; both vectors must carry one entry
    /// per control point.
    pub fn set_reference(
        &mut self,
        log_sc: DVector<f64>,
        var_log_sc: DVector<f64>,
    ) -> Result<(), Error> {
        let n = self.model.n_knots();
        if log_sc.len() != n {
            return Err(Error::ShapeMismatch {
                arg: "log_sc",
                expected: n,
                got: log_sc.len(),
            });
        }
        if var_log_sc.len() != n {
            return Err(Error::ShapeMismatch {
                arg: "var_log_sc",
                expected: n,
                got: var_log_sc.len(),
            });
        }
        if var_log_sc.iter().any(|&v| !(v.is_finite() && v > 0.0)) {
            return Err(Error::Config {
                field: "var_log_sc",
                reason: "prior variances must be positive and finite",
            });
        }
        self.reference = Some(Reference { log_sc, var_log_sc });
        Ok(())
    }

    /// Estimate the reference spectrum from the stored periodogram.
    ///
    /// Each positive-frequency bin is assigned to the nearest knot in log
    /// frequency; the knot reference is the de-biased mean of the log
    /// periodogram over its bins (`E[ln I] = ln S − γ`), with prior
    /// variance `π²/6` divided by the bin count. Knots that collect no
    /// bins are filled by linear interpolation between their neighbors.
    pub fn estimate_reference(&mut self) -> Result<(), Error> {
        let pdg = self
            .periodogram
            .as_ref()
            .ok_or(Error::MissingState("periodogram"))?;

        let knots = self.model.knot_log_freqs();
        let n_knots = knots.len();
        let spacing = knots[1] - knots[0];
        let mut sums = vec![0.0; n_knots];
        let mut counts = vec![0usize; n_knots];

        let mut accumulate = |n: usize, i_data: &[f64]| {
            let grid = self
                .model
                .grid(n)
                .expect("segment grids exist by construction");
            for (k, &log_f) in grid.iter().enumerate() {
                let value = i_data[k + 1];
                if value <= 0.0 || !value.is_finite() {
                    continue;
                }
                let idx = ((log_f - knots[0]) / spacing).round();
                let idx = idx.clamp(0.0, (n_knots - 1) as f64) as usize;
                sums[idx] += value.ln();
                counts[idx] += 1;
            }
        };

        match pdg {
            Periodogram::Single(i_data) => accumulate(self.model.n_data(), i_data),
            Periodogram::Multi(segments) => {
                for (&n, i_data) in self.model.segment_lengths().iter().zip(segments.iter()) {
                    accumulate(n, i_data);
                }
            }
        }

        if counts.iter().all(|&c| c == 0) {
            return Err(Error::Config {
                field: "periodogram",
                reason: "no positive bins to estimate a reference from",
            });
        }

        let mut log_sc = DVector::zeros(n_knots);
        let mut var_log_sc = DVector::from_element(n_knots, LOG_EXP_VARIANCE);
        for i in 0..n_knots {
            if counts[i] > 0 {
                log_sc[i] = sums[i] / counts[i] as f64 + EULER_GAMMA;
                var_log_sc[i] = LOG_EXP_VARIANCE / counts[i] as f64;
            }
        }
        fill_empty_knots(&mut log_sc, &counts);

        tracing::debug!(n_knots, "reference spectrum estimated from periodogram");
        self.reference = Some(Reference { log_sc, var_log_sc });
        Ok(())
    }

    /// Whittle log-likelihood of control values `x` under the stored
    /// periodogram.
    pub fn log_likelihood(&self, x: &DVector<f64>) -> Result<f64, Error> {
        self.check_dim(x)?;
        let pdg = self
            .periodogram
            .as_ref()
            .ok_or(Error::MissingState("periodogram"))?;
        Ok(whittle_log_likelihood(&self.model, pdg, x))
    }

    /// Gaussian log-prior of control values `x` around the reference.
    pub fn log_prior(&self, x: &DVector<f64>) -> Result<f64, Error> {
        self.check_dim(x)?;
        let reference = self
            .reference
            .as_ref()
            .ok_or(Error::MissingState("reference spectrum"))?;
        Ok(gaussian_log_prior(x, &reference.log_sc, &reference.var_log_sc))
    }

    /// Log-posterior `likelihood + prior`; pure in `x`.
    pub fn log_posterior(&self, x: &DVector<f64>) -> Result<f64, Error> {
        Ok(self.log_likelihood(x)? + self.log_prior(x)?)
    }

    /// Run `n_it` Metropolis-Hastings iterations over the PSD parameters.
    ///
    /// The chain is seeded at the reference log-PSD with initial proposal
    /// variances `varlogSc / (J+1)`, and the proposal covariance is
    /// re-tuned every `cov_update` iterations. Returns the full chain and
    /// its log-posterior trace; the cached spline state is left untouched.
    pub fn sample_psd(&mut self, n_it: usize, cov_update: usize) -> Result<McmcChain, Error> {
        let Self {
            model,
            mh,
            periodogram,
            reference,
        } = self;
        let model: &SplinePsdModel = model;
        let pdg = periodogram
            .as_ref()
            .ok_or(Error::MissingState("periodogram"))?;
        let reference = reference
            .as_ref()
            .ok_or(Error::MissingState("reference spectrum"))?;

        let log_sc = &reference.log_sc;
        let var_log_sc = &reference.var_log_sc;
        let target =
            |x: &DVector<f64>| whittle_log_likelihood(model, pdg, x) + gaussian_log_prior(x, log_sc, var_log_sc);

        let scale = ProposalScale::Diagonal(var_log_sc / model.n_knots() as f64);
        mh.run(target, log_sc.clone(), scale, n_it, cov_update)
    }

    /// Update the cached spline/PSD state from new control values,
    /// typically a summary statistic of a chain.
    pub fn update_psd(&mut self, log_s: &DVector<f64>) -> Result<(), Error> {
        self.check_dim(log_s)?;
        self.model.update(log_s)
    }

    /// Cached two-sided PSD over the primary segment's Fourier bins, or
    /// `None` before the first [`update_psd`](Self::update_psd).
    pub fn psd(&self) -> Option<&[f64]> {
        self.model.psd()
    }

    /// PSD values on a caller-supplied frequency grid (Hz).
    pub fn psd_at(&self, frequencies: &[f64]) -> Result<Vec<f64>, Error> {
        Ok(self
            .model
            .evaluate(frequencies)?
            .into_iter()
            .map(f64::exp)
            .collect())
    }

    /// The spline PSD model.
    pub fn model(&self) -> &SplinePsdModel {
        &self.model
    }

    /// Reference spectrum and prior variances, once set.
    pub fn reference(&self) -> Option<(&DVector<f64>, &DVector<f64>)> {
        self.reference
            .as_ref()
            .map(|r| (&r.log_sc, &r.var_log_sc))
    }

    fn check_dim(&self, x: &DVector<f64>) -> Result<(), Error> {
        let n = self.model.n_knots();
        if x.len() != n {
            return Err(Error::ShapeMismatch {
                arg: "x",
                expected: n,
                got: x.len(),
            });
        }
        Ok(())
    }
}

/// Replace entries whose bin count is zero by linear interpolation over
/// the knot index between the nearest populated neighbors.
fn fill_empty_knots(log_sc: &mut DVector<f64>, counts: &[usize]) {
    let n = counts.len();
    for i in 0..n {
        if counts[i] > 0 {
            continue;
        }
        let below = (0..i).rev().find(|&k| counts[k] > 0);
        let above = (i + 1..n).find(|&k| counts[k] > 0);
        log_sc[i] = match (below, above) {
            (Some(a), Some(b)) => {
                let t = (i - a) as f64 / (b - a) as f64;
                log_sc[a] + t * (log_sc[b] - log_sc[a])
            }
            (Some(a), None) => log_sc[a],
            (None, Some(b)) => log_sc[b],
            (None, None) => 0.0,
        };
    }
}
