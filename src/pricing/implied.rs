//! Implied volatility back-solving.
//!
//! Vendors usually ship an implied volatility with each quote. When one is
//! missing, the IV is recovered from the quote's mid price by solving
//! `BS(σ) = price` with Brent's method on a fixed bracket. A bracketed solver
//! cannot diverge on near-expiry or deep out-of-the-money inputs the way an
//! unguarded Newton-Raphson iteration can.

use crate::error::{self, IvCrushError};
use crate::optim::{BrentConfig, brent_root};
use crate::pricing::black_scholes::price;
use crate::types::{OptionType, Vol};
use crate::validate::{validate_finite, validate_non_negative, validate_positive};

/// Lower end of the volatility search bracket.
const VOL_LO: f64 = 1e-4;
/// Upper end of the volatility search bracket (500% vol).
const VOL_HI: f64 = 5.0;
/// Brent iteration limit.
const MAX_ITER: usize = 100;
/// Convergence threshold on volatility.
const TOLERANCE: f64 = 1e-6;

/// Solve for the Black-Scholes volatility that reproduces `market_price`.
///
/// # Errors
/// Returns [`IvCrushError::InvalidInput`] for non-positive spot, strike or
/// time, or a negative/non-finite price. Returns
/// [`IvCrushError::Convergence`] when the price lies outside the
/// no-arbitrage bounds, when no root exists inside `[1e-4, 5.0]`, or when the
/// solver exhausts its iterations. Callers should then fall back to the
/// vendor IV or drop the quote.
///
/// # Examples
/// ```
/// use ivcrush::OptionType;
/// use ivcrush::pricing::{implied_volatility, price};
///
/// let p = price(100.0, 105.0, 0.5, 0.03, 0.25, OptionType::Call)?;
/// let iv = implied_volatility(p, 100.0, 105.0, 0.5, 0.03, OptionType::Call)?;
/// assert!((iv.0 - 0.25).abs() < 1e-6);
/// # Ok::<(), ivcrush::IvCrushError>(())
/// ```
pub fn implied_volatility(
    market_price: f64,
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
    option_type: OptionType,
) -> error::Result<Vol> {
    validate_non_negative(market_price, "option price")?;
    validate_positive(spot, "spot")?;
    validate_positive(strike, "strike")?;
    validate_positive(time, "time to expiry")?;
    validate_finite(rate, "rate")?;

    let discounted_strike = strike * (-rate * time).exp();
    let (lower, upper) = match option_type {
        OptionType::Call => ((spot - discounted_strike).max(0.0), spot),
        OptionType::Put => ((discounted_strike - spot).max(0.0), discounted_strike),
    };
    if market_price <= lower || market_price >= upper {
        return Err(IvCrushError::Convergence {
            message: format!(
                "price {market_price} outside no-arbitrage bounds ({lower}, {upper})"
            ),
            iterations: 0,
        });
    }

    let objective = |vol: f64| {
        price(spot, strike, time, rate, vol, option_type).map_or(f64::NAN, |p| p - market_price)
    };
    let config = BrentConfig {
        max_iter: MAX_ITER,
        x_tol: TOLERANCE,
    };
    let root = brent_root(objective, VOL_LO, VOL_HI, &config)?;

    #[cfg(feature = "logging")]
    tracing::trace!(
        strike,
        time,
        iv = root.x,
        iterations = root.iterations,
        "implied volatility solved"
    );

    Ok(Vol(root.x))
}
