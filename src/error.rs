//! Typed error conditions for construction-time validation and caller misuse.
//!
//! Numeric trouble inside the likelihood (overflowing `exp`, non-finite
//! log-PSD values) is *not* an error: it is reported as a `-inf`
//! log-likelihood so the Metropolis-Hastings core can reject the proposal
//! and keep running.

use thiserror::Error;

/// Errors raised by the PSD sampler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A configuration value failed validation at construction time.
    #[error("invalid configuration `{field}`: {reason}")]
    Config {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// A supplied array does not match the configured segment layout.
    ///
    /// Indicates caller misuse; the data is never silently truncated.
    #[error("shape mismatch on `{arg}`: expected length {expected}, got {got}")]
    ShapeMismatch {
        /// Name of the offending argument.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },

    /// An operation requires state that has not been supplied yet.
    #[error("missing state: {0} must be set first")]
    MissingState(&'static str),
}
