//! Adaptive random-walk Metropolis-Hastings engine.
//!
//! The engine is agnostic to what the target log-density represents: it
//! receives an opaque callable and owns only the running chain and the
//! proposal-tuning state. Proposals are symmetric Gaussian steps
//!
//! ```text
//! θ' = θ + L z,   z ~ N(0, I)
//! ```
//!
//! where `L` is a per-coordinate standard deviation or the Cholesky
//! factor of the proposal covariance. Every `cov_update` iterations the
//! covariance is re-tuned from the empirical covariance of the chain so
//! far, scaled by the Haario constant `2.38²/d`.
//!
//! Every iteration's state is recorded: a rejection duplicates the
//! previous state in the output chain. A non-finite proposal
//! log-posterior is an automatic rejection, never an error.

use nalgebra::{Cholesky, DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::constants::HAARIO_SCALE;
use crate::error::Error;
use crate::stats::WelfordCovariance;

/// Proposal covariance for the random-walk kernel.
#[derive(Debug, Clone)]
pub enum ProposalScale {
    /// One variance shared by all coordinates.
    Isotropic(f64),
    /// Per-coordinate variances (diagonal covariance).
    Diagonal(DVector<f64>),
    /// Full covariance matrix, applied through its Cholesky factor.
    Full(DMatrix<f64>),
}

/// Resolved proposal operator.
enum Step {
    /// Per-coordinate standard deviations.
    Diagonal(DVector<f64>),
    /// Lower-triangular Cholesky factor of the covariance.
    Full(DMatrix<f64>),
}

impl Step {
    fn from_scale(scale: ProposalScale, ndim: usize) -> Result<Self, Error> {
        match scale {
            ProposalScale::Isotropic(var) => {
                if !(var.is_finite() && var > 0.0) {
                    return Err(Error::Config {
                        field: "proposal",
                        reason: "isotropic proposal variance must be positive and finite",
                    });
                }
                Ok(Step::Diagonal(DVector::from_element(ndim, var.sqrt())))
            }
            ProposalScale::Diagonal(vars) => {
                if vars.len() != ndim {
                    return Err(Error::ShapeMismatch {
                        arg: "proposal",
                        expected: ndim,
                        got: vars.len(),
                    });
                }
                if vars.iter().any(|&v| !(v.is_finite() && v > 0.0)) {
                    return Err(Error::Config {
                        field: "proposal",
                        reason: "diagonal proposal variances must be positive and finite",
                    });
                }
                Ok(Step::Diagonal(vars.map(f64::sqrt)))
            }
            ProposalScale::Full(cov) => {
                if cov.nrows() != ndim || cov.ncols() != ndim {
                    return Err(Error::ShapeMismatch {
                        arg: "proposal",
                        expected: ndim,
                        got: cov.nrows(),
                    });
                }
                let chol = Cholesky::new(cov).ok_or(Error::Config {
                    field: "proposal",
                    reason: "proposal covariance must be positive definite",
                })?;
                Ok(Step::Full(chol.unpack()))
            }
        }
    }

    fn apply(&self, z: &DVector<f64>) -> DVector<f64> {
        match self {
            Step::Diagonal(sd) => z.component_mul(sd),
            Step::Full(l) => l * z,
        }
    }
}

/// Chain of `(θ, log-posterior)` pairs produced by one sampler run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct McmcChain {
    /// Parameter vector at every iteration, the seed state included.
    pub samples: Vec<DVector<f64>>,
    /// Log-posterior at every iteration, parallel to `samples`.
    pub log_posterior: Vec<f64>,
    /// Number of accepted transitions.
    pub accepted: usize,
}

impl McmcChain {
    /// Number of recorded iterations.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the chain holds no iterations.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Fraction of accepted transitions.
    pub fn acceptance_rate(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        self.accepted as f64 / (self.samples.len() - 1) as f64
    }

    /// Mean parameter vector over iterations `burn_in..`, or `None` if
    /// the burn-in swallows the whole chain.
    pub fn posterior_mean(&self, burn_in: usize) -> Option<DVector<f64>> {
        let tail = self.samples.get(burn_in..)?;
        if tail.is_empty() {
            return None;
        }
        let mut mean = DVector::zeros(tail[0].len());
        for x in tail {
            mean += x;
        }
        Some(mean / tail.len() as f64)
    }

    /// Mean log-posterior over a half-open iteration range, or `None` if
    /// the range is empty or out of bounds.
    pub fn mean_log_posterior(&self, range: std::ops::Range<usize>) -> Option<f64> {
        let slice = self.log_posterior.get(range)?;
        if slice.is_empty() {
            return None;
        }
        Some(slice.iter().sum::<f64>() / slice.len() as f64)
    }
}

/// Random-walk Metropolis-Hastings sampler with adaptive proposals.
#[derive(Debug, Clone)]
pub struct MhSampler {
    ndim: usize,
    rng: Xoshiro256PlusPlus,
}

impl MhSampler {
    /// Create a sampler over `ndim` parameters with a deterministic seed.
    pub fn new(ndim: usize, seed: u64) -> Self {
        Self {
            ndim,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Parameter dimension.
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Run `n_it` iterations against `target` from seed state `x0`.
    ///
    /// The chain records every iteration's state and log-posterior, the
    /// seed state included, so the output length is exactly `n_it`. There
    /// is no hidden carry-over between runs: each call re-seeds the state
    /// and the proposal scale explicitly (only the RNG stream advances).
    pub fn run<F>(
        &mut self,
        target: F,
        x0: DVector<f64>,
        scale: ProposalScale,
        n_it: usize,
        cov_update: usize,
    ) -> Result<McmcChain, Error>
    where
        F: Fn(&DVector<f64>) -> f64,
    {
        if x0.len() != self.ndim {
            return Err(Error::ShapeMismatch {
                arg: "x0",
                expected: self.ndim,
                got: x0.len(),
            });
        }
        if n_it == 0 {
            return Err(Error::Config {
                field: "n_it",
                reason: "chain length must be at least 1",
            });
        }
        if cov_update == 0 {
            return Err(Error::Config {
                field: "cov_update",
                reason: "adaptation interval must be at least 1",
            });
        }

        let mut step = Step::from_scale(scale, self.ndim)?;

        let mut samples = Vec::with_capacity(n_it);
        let mut log_posterior = Vec::with_capacity(n_it);
        let mut accepted = 0usize;
        let mut history = WelfordCovariance::new(self.ndim);

        let mut x = x0;
        let mut logp = target(&x);
        history.update(&x);
        samples.push(x.clone());
        log_posterior.push(logp);

        for s in 1..n_it {
            // Draw order is fixed: proposal first, acceptance second.
            let z = self.standard_normal_vector();
            let x_prime = &x + step.apply(&z);
            let logp_prime = target(&x_prime);

            let dl = logp_prime - logp;
            let accept = if !logp_prime.is_finite() {
                false
            } else if dl > 0.0 {
                true
            } else {
                let u: f64 = self.rng.random();
                u < dl.exp()
            };

            if accept {
                debug_assert!(
                    logp_prime.is_finite(),
                    "accepted state must have a finite log-posterior"
                );
                x = x_prime;
                logp = logp_prime;
                accepted += 1;
            }

            history.update(&x);
            samples.push(x.clone());
            log_posterior.push(logp);

            if s % cov_update == 0 {
                self.adapt(&mut step, &history);
            }
            if s % 100 == 0 {
                tracing::trace!(iteration = s, accepted, "mcmc progress");
            }
        }

        Ok(McmcChain {
            samples,
            log_posterior,
            accepted,
        })
    }

    /// Re-tune the proposal from the empirical chain covariance, scaled
    /// by `2.38²/d`. A degenerate covariance (too little history, or a
    /// chain that has not moved) keeps the previous scale.
    fn adapt(&self, step: &mut Step, history: &WelfordCovariance) {
        let Some(cov) = history.finalize() else {
            return;
        };
        let scaled = cov * (HAARIO_SCALE / self.ndim as f64);
        match Cholesky::new(scaled) {
            Some(chol) => {
                tracing::debug!(iterations = history.count(), "proposal covariance re-tuned");
                *step = Step::Full(chol.unpack());
            }
            None => {
                tracing::debug!(
                    iterations = history.count(),
                    "empirical covariance not positive definite; keeping previous proposal"
                );
            }
        }
    }

    fn standard_normal_vector(&mut self) -> DVector<f64> {
        DVector::from_fn(self.ndim, |_, _| StandardNormal.sample(&mut self.rng))
    }
}
