//! Black-Scholes pricing and Greeks.
//!
//! ```text
//! C = S·N(d₁) − K·e^(−rT)·N(d₂)
//! P = K·e^(−rT)·N(−d₂) − S·N(−d₁)
//! d₁ = [ln(S/K) + (r + σ²/2)·T] / (σ√T),   d₂ = d₁ − σ√T
//! ```
//!
//! At expiry (`T = 0`) the price collapses to intrinsic value and the Greeks
//! are the degenerate step values.

use std::f64::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::error::{self, IvCrushError};
use crate::pricing::CALENDAR_DAYS_PER_YEAR;
use crate::types::OptionType;
use crate::validate::{validate_finite, validate_non_negative, validate_positive};

/// Standard normal CDF.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF.
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Option sensitivities.
///
/// Theta is per year and vega per unit of volatility (1.00 = 100 vol points);
/// use [`theta_per_day`](Greeks::theta_per_day) and
/// [`vega_per_point`](Greeks::vega_per_point) for trader conventions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// ∂V/∂S
    pub delta: f64,
    /// ∂²V/∂S²
    pub gamma: f64,
    /// ∂V/∂t, per year
    pub theta: f64,
    /// ∂V/∂σ
    pub vega: f64,
    /// ∂V/∂r
    pub rho: f64,
}

impl Greeks {
    /// Time decay per calendar day.
    pub fn theta_per_day(&self) -> f64 {
        self.theta / CALENDAR_DAYS_PER_YEAR
    }

    /// Value change for a one-point (1%) move in volatility.
    pub fn vega_per_point(&self) -> f64 {
        self.vega / 100.0
    }
}

/// Shared d₁/d₂ terms for a validated, unexpired option.
struct Inputs {
    d1: f64,
    d2: f64,
    sqrt_t: f64,
    df: f64,
}

/// Validate inputs and compute the shared terms. `None` means the option is at expiry.
fn prepare(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> error::Result<Option<Inputs>> {
    validate_positive(spot, "spot")?;
    validate_positive(strike, "strike")?;
    validate_non_negative(time, "time to expiry")?;
    validate_finite(rate, "rate")?;
    validate_non_negative(vol, "volatility")?;

    if time == 0.0 {
        return Ok(None);
    }
    if vol == 0.0 {
        return Err(IvCrushError::invalid_input(
            "volatility must be positive before expiry, got 0",
        ));
    }

    let sqrt_t = time.sqrt();
    let d1 = ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * sqrt_t);
    Ok(Some(Inputs {
        d1,
        d2: d1 - vol * sqrt_t,
        sqrt_t,
        df: (-rate * time).exp(),
    }))
}

/// Black-Scholes European option price.
///
/// # Errors
/// Returns [`IvCrushError::InvalidInput`] for non-positive spot or strike,
/// negative time or volatility, zero volatility before expiry, or any
/// non-finite argument.
///
/// # Examples
/// ```
/// use ivcrush::OptionType;
/// use ivcrush::pricing::price;
///
/// let call = price(100.0, 100.0, 1.0, 0.05, 0.2, OptionType::Call)?;
/// assert!((call - 10.4506).abs() < 1e-4);
/// # Ok::<(), ivcrush::IvCrushError>(())
/// ```
pub fn price(
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
    vol: f64,
    option_type: OptionType,
) -> error::Result<f64> {
    let Some(Inputs { d1, d2, df, .. }) = prepare(spot, strike, time, rate, vol)? else {
        return Ok(option_type.intrinsic(spot, strike));
    };

    Ok(match option_type {
        OptionType::Call => spot * norm_cdf(d1) - strike * df * norm_cdf(d2),
        OptionType::Put => strike * df * norm_cdf(-d2) - spot * norm_cdf(-d1),
    })
}

/// Black-Scholes Greeks.
///
/// # Errors
/// Same conditions as [`price`].
pub fn greeks(
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
    vol: f64,
    option_type: OptionType,
) -> error::Result<Greeks> {
    let Some(Inputs { d1, d2, sqrt_t, df }) = prepare(spot, strike, time, rate, vol)? else {
        let delta = match option_type {
            OptionType::Call if spot > strike => 1.0,
            OptionType::Put if spot < strike => -1.0,
            _ => 0.0,
        };
        return Ok(Greeks {
            delta,
            ..Greeks::default()
        });
    };

    let pdf_d1 = norm_pdf(d1);
    let gamma = pdf_d1 / (spot * vol * sqrt_t);
    let vega = spot * pdf_d1 * sqrt_t;
    let decay = -spot * pdf_d1 * vol / (2.0 * sqrt_t);

    let greeks = match option_type {
        OptionType::Call => Greeks {
            delta: norm_cdf(d1),
            gamma,
            theta: decay - rate * strike * df * norm_cdf(d2),
            vega,
            rho: strike * time * df * norm_cdf(d2),
        },
        OptionType::Put => Greeks {
            delta: norm_cdf(d1) - 1.0,
            gamma,
            theta: decay + rate * strike * df * norm_cdf(-d2),
            vega,
            rho: -strike * time * df * norm_cdf(-d2),
        },
    };
    Ok(greeks)
}

/// Price of a long straddle (one call plus one put) at a single strike.
///
/// # Errors
/// Same conditions as [`price`].
pub fn straddle_price(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> error::Result<f64> {
    Ok(price(spot, strike, time, rate, vol, OptionType::Call)?
        + price(spot, strike, time, rate, vol, OptionType::Put)?)
}
