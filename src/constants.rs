//! Numerical constants used throughout the crate.

use std::f64::consts::PI;

/// Default deterministic seed for RNG operations.
///
/// Same seed + same data = same chain. The value `0x77686974746C65` is
/// "whittle" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x77686974746C65;

/// Haario adaptive-Metropolis proposal scaling, (2.38)².
///
/// The empirical chain covariance is multiplied by `HAARIO_SCALE / d`
/// (d = parameter dimension) when the proposal is re-tuned.
pub const HAARIO_SCALE: f64 = 2.38 * 2.38;

/// Variance of the log of an exponentially distributed variate, π²/6.
///
/// Under the Whittle approximation each periodogram bin is exponential
/// around the true spectrum, so averaging `m` log-periodogram values
/// yields a reference log-PSD with variance `π²/6m`.
pub const LOG_EXP_VARIANCE: f64 = PI * PI / 6.0;

/// Euler–Mascheroni constant γ.
///
/// `E[ln I] = ln S − γ` for an exponential periodogram bin with mean `S`;
/// used to de-bias log-periodogram averages.
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
