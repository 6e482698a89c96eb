//! Yang-Zhang realized volatility.
//!
//! ```text
//! σ² = A · (σo² + k·σc² + (1 − k)·σrs²)
//! k  = 0.34 / (1.34 + (n + 1)/(n − 1))
//! ```
//!
//! where, over returns `i = 1..=n`:
//! - `σo²` is the sample variance of overnight returns `ln(Oᵢ / Cᵢ₋₁)`
//! - `σc²` is the sample variance of open-to-close returns `ln(Cᵢ / Oᵢ)`
//! - `σrs²` is the mean Rogers-Satchell term
//!   `ln(Hᵢ/Cᵢ)·ln(Hᵢ/Oᵢ) + ln(Lᵢ/Cᵢ)·ln(Lᵢ/Oᵢ)`
//! - `A` is the annualization factor (trading days per year)
//!
//! # References
//! - Yang, D. & Zhang, Q. "Drift-Independent Volatility Estimation Based on
//!   High, Low, Open, and Close Prices" (2000)

use crate::error;
use crate::realized::{check_window, sample_variance};
use crate::types::PriceBar;

/// Annualized Yang-Zhang volatility of an ordered window of `n + 1` bars.
///
/// # Errors
/// Returns [`IvCrushError::InsufficientData`](crate::IvCrushError::InsufficientData)
/// for fewer than 3 bars and [`IvCrushError::Data`](crate::IvCrushError::Data)
/// if any bar has a non-positive price or an inconsistent range.
pub fn yang_zhang(bars: &[PriceBar], trading_days_per_year: f64) -> error::Result<f64> {
    let n = check_window(bars, trading_days_per_year)?;

    let mut overnight = Vec::with_capacity(n);
    let mut open_close = Vec::with_capacity(n);
    let mut rogers_satchell = 0.0;
    for pair in bars.windows(2) {
        let (prev, bar) = (&pair[0], &pair[1]);
        overnight.push((bar.open / prev.close).ln());
        open_close.push((bar.close / bar.open).ln());

        let hc = (bar.high / bar.close).ln();
        let ho = (bar.high / bar.open).ln();
        let lc = (bar.low / bar.close).ln();
        let lo = (bar.low / bar.open).ln();
        rogers_satchell += hc * ho + lc * lo;
    }

    let nf = n as f64;
    let k = 0.34 / (1.34 + (nf + 1.0) / (nf - 1.0));
    let variance = sample_variance(&overnight)
        + k * sample_variance(&open_close)
        + (1.0 - k) * rogers_satchell / nf;

    // Each component is non-negative; max() guards against -0.0.
    Ok((trading_days_per_year * variance).max(0.0).sqrt())
}
