//! Classical single-component estimators, kept alongside Yang-Zhang for
//! comparison and diagnostics.

use std::f64::consts::LN_2;

use crate::error;
use crate::realized::{check_window, sample_variance};
use crate::types::PriceBar;

/// Annualized close-to-close volatility: sample standard deviation of
/// `ln(Cᵢ / Cᵢ₋₁)` scaled by `√A`.
///
/// # Errors
/// Same conditions as [`yang_zhang`](crate::realized::yang_zhang).
pub fn close_to_close(bars: &[PriceBar], trading_days_per_year: f64) -> error::Result<f64> {
    check_window(bars, trading_days_per_year)?;
    let returns: Vec<f64> = bars
        .windows(2)
        .map(|pair| (pair[1].close / pair[0].close).ln())
        .collect();
    Ok((trading_days_per_year * sample_variance(&returns)).sqrt())
}

/// Annualized Parkinson volatility from the high/low range of the last `n` bars.
///
/// ```text
/// σ² = A · Σ ln(Hᵢ/Lᵢ)² / (4·n·ln 2)
/// ```
///
/// Ignores drift and opening gaps, so it understates volatility around
/// earnings jumps.
///
/// # Errors
/// Same conditions as [`yang_zhang`](crate::realized::yang_zhang).
pub fn parkinson(bars: &[PriceBar], trading_days_per_year: f64) -> error::Result<f64> {
    let n = check_window(bars, trading_days_per_year)?;
    let sum_sq: f64 = bars[1..]
        .iter()
        .map(|bar| (bar.high / bar.low).ln().powi(2))
        .sum();
    Ok((trading_days_per_year * sum_sq / (4.0 * n as f64 * LN_2)).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IvCrushError;
    use crate::realized::fixtures;
    use approx::assert_abs_diff_eq;

    #[test]
    fn close_to_close_reference_value() {
        let vol = close_to_close(&fixtures::bars(), 252.0).unwrap();
        assert_abs_diff_eq!(vol, 0.190_239_574_718_790, epsilon = 1e-12);
    }

    #[test]
    fn parkinson_reference_value() {
        let vol = parkinson(&fixtures::bars(), 252.0).unwrap();
        assert_abs_diff_eq!(vol, 0.186_990_675_426_297, epsilon = 1e-12);
    }

    #[test]
    fn both_scale_invariant() {
        let a = fixtures::bars();
        let b = fixtures::bars_scaled(0.25);
        assert_abs_diff_eq!(
            close_to_close(&a, 252.0).unwrap(),
            close_to_close(&b, 252.0).unwrap(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(parkinson(&a, 252.0).unwrap(), parkinson(&b, 252.0).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn short_window_rejected() {
        let bars = fixtures::bars();
        assert!(matches!(
            close_to_close(&bars[..1], 252.0),
            Err(IvCrushError::InsufficientData { .. })
        ));
        assert!(matches!(
            parkinson(&bars[..2], 252.0),
            Err(IvCrushError::InsufficientData { .. })
        ));
    }
}
