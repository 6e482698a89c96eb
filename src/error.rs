//! Error types for the ivcrush library.
//!
//! Every evaluation step fails fast with a typed error instead of substituting
//! a neutral default. Callers decide whether a failure means `AVOID`,
//! exclusion from ranking, or a retry against another data source.

use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, IvCrushError>;

/// Errors that can occur while turning market observations into a recommendation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IvCrushError {
    /// Malformed market data: non-positive OHLC, inverted bars, negative IV,
    /// duplicate expirations.
    #[error("data error: {message}")]
    Data { message: String },

    /// The price window is too short for the requested estimator.
    #[error("insufficient data: need at least {required} bars, got {actual}")]
    InsufficientData {
        /// Minimum number of bars the operation needs.
        required: usize,
        /// Number of bars supplied.
        actual: usize,
    },

    /// Not enough usable option expirations to build a term structure.
    #[error("insufficient expirations: {message}")]
    InsufficientExpirations {
        message: String,
        /// Minimum number of usable expirations required.
        required: usize,
        /// Number of usable expirations found.
        usable: usize,
    },

    /// The implied volatility root finder failed to converge.
    #[error("convergence error after {iterations} iterations: {message}")]
    Convergence { message: String, iterations: usize },

    /// A parameter is out of its valid domain (non-positive spot, vol, time...).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl IvCrushError {
    pub(crate) fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
