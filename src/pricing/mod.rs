//! Closed-form European option pricing.
//!
//! - [`black_scholes`] — Black-Scholes price and [`Greeks`] for a non-dividend
//!   underlying with a continuously compounded risk-free rate
//! - [`implied`] — Implied volatility back-solving via Brent's method, used
//!   only when a vendor quote arrives without an implied volatility
//!
//! Pricing and Greeks are direct formulas. Only the implied-vol solver
//! iterates, and it is bracketed so it cannot diverge.

pub mod black_scholes;
pub mod implied;

pub use black_scholes::{Greeks, greeks, norm_cdf, norm_pdf, price, straddle_price};
pub use implied::implied_volatility;

/// Calendar days per year used to convert days-to-expiry into a pricing tenor.
pub const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;
