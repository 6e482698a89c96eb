//! Realized (historical) volatility estimators over daily OHLC windows.
//!
//! A window of `n + 1` bars yields `n` daily returns; every estimator needs
//! `n >= 2`. All estimators work on log price ratios, so multiplying every
//! price by a positive constant leaves the result unchanged.
//!
//! ## Estimators
//!
//! - [`yang_zhang`] — overnight + open-to-close + Rogers-Satchell blend,
//!   robust to opening jumps. The default for the engine.
//! - [`close_to_close`] — sample standard deviation of close-to-close returns
//! - [`parkinson`] — high/low range estimator

mod classic;
mod yang_zhang;

pub use classic::{close_to_close, parkinson};
pub use yang_zhang::yang_zhang;

use serde::{Deserialize, Serialize};

use crate::error::{self, IvCrushError};
use crate::types::PriceBar;

/// Minimum number of daily returns an estimator accepts.
pub const MIN_RETURNS: usize = 2;

/// Which estimator produced a [`VolatilityEstimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VolatilityMethod {
    #[default]
    YangZhang,
    CloseToClose,
    Parkinson,
}

/// An annualized realized volatility and how it was obtained.
///
/// Derived fresh for every evaluation and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityEstimate {
    /// Annualized volatility as a decimal (0.30 = 30%).
    pub annualized: f64,
    /// Number of daily returns in the window.
    pub lookback_days: usize,
    pub method: VolatilityMethod,
}

impl VolatilityEstimate {
    /// Estimate volatility over the trailing `lookback_days` returns of `bars`.
    ///
    /// Uses the last `lookback_days + 1` bars; older history is ignored.
    ///
    /// # Errors
    /// Returns [`IvCrushError::InvalidInput`] if `lookback_days < 2`,
    /// [`IvCrushError::InsufficientData`] if fewer than `lookback_days + 1`
    /// bars are supplied, and [`IvCrushError::Data`] for malformed bars.
    pub fn compute(
        method: VolatilityMethod,
        bars: &[PriceBar],
        lookback_days: usize,
        trading_days_per_year: f64,
    ) -> error::Result<Self> {
        if lookback_days < MIN_RETURNS {
            return Err(IvCrushError::invalid_input(format!(
                "lookback must cover at least {MIN_RETURNS} returns, got {lookback_days}"
            )));
        }
        let required = lookback_days + 1;
        if bars.len() < required {
            return Err(IvCrushError::InsufficientData {
                required,
                actual: bars.len(),
            });
        }
        let start = bars.len() - required;
        let window = &bars[start..];
        validate_bars(window, start)?;

        let annualized = match method {
            VolatilityMethod::YangZhang => yang_zhang(window, trading_days_per_year)?,
            VolatilityMethod::CloseToClose => close_to_close(window, trading_days_per_year)?,
            VolatilityMethod::Parkinson => parkinson(window, trading_days_per_year)?,
        };

        Ok(Self {
            annualized,
            lookback_days,
            method,
        })
    }
}

/// Mean volume of the trailing `window` bars, or `None` when the history is
/// shorter than the window.
///
/// # Errors
/// Returns [`IvCrushError::Data`] if any averaged bar is malformed.
pub fn average_volume(bars: &[PriceBar], window: usize) -> error::Result<Option<f64>> {
    if window == 0 || bars.len() < window {
        return Ok(None);
    }
    let start = bars.len() - window;
    let trailing = &bars[start..];
    validate_bars(trailing, start)?;
    let total: f64 = trailing.iter().map(|b| b.volume).sum();
    Ok(Some(total / window as f64))
}

/// Validate every bar, reporting positions offset by `offset`.
fn validate_bars(bars: &[PriceBar], offset: usize) -> error::Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate_at(offset + i)?;
    }
    Ok(())
}

/// Validate a bar window and return the number of returns `n` it spans.
fn check_window(bars: &[PriceBar], trading_days_per_year: f64) -> error::Result<usize> {
    crate::validate::validate_positive(trading_days_per_year, "trading days per year")?;
    if bars.len() < MIN_RETURNS + 1 {
        return Err(IvCrushError::InsufficientData {
            required: MIN_RETURNS + 1,
            actual: bars.len(),
        });
    }
    validate_bars(bars, 0)?;
    Ok(bars.len() - 1)
}

/// Sample variance (mean removed, divisor `n − 1`).
fn sample_variance(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
}
