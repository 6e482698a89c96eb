//! Calendar spreads: sell the front-month call, buy the back-month call at
//! the same strike.
//!
//! The position profits when front-month implied volatility collapses after
//! the event while the back month keeps its value. Everything here is priced
//! from the chain already held by the engine; nothing is executed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, IvCrushError};
use crate::pricing::{CALENDAR_DAYS_PER_YEAR, price};
use crate::types::{ExpirationSlice, OptionType};
use crate::validate::{validate_finite, validate_non_negative, validate_positive};

/// Half-width of the strike search band, as a fraction of spot.
pub const DEFAULT_STRIKE_BAND: f64 = 0.10;

/// A priced call calendar at one strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSpread {
    pub strike: f64,
    pub front_expiration: NaiveDate,
    pub back_expiration: NaiveDate,
    pub front_mid: f64,
    pub back_mid: f64,
    /// Cost to open at the touch: back ask minus front bid.
    pub debit: f64,
    /// Back call value at front expiry with spot pinned at the strike, less the debit.
    pub max_profit: f64,
}

impl CalendarSpread {
    /// Price the calendar at `strike`.
    ///
    /// The back call is revalued at front expiry with Black-Scholes at
    /// `back_iv`. Returns `Ok(None)` when either call at `strike` is missing
    /// or not quoted two-sided.
    ///
    /// # Errors
    /// Returns [`IvCrushError::InvalidInput`] if `back` does not expire after
    /// `front`, or for a non-positive strike or IV or a non-finite rate.
    pub fn price(
        front: &ExpirationSlice,
        back: &ExpirationSlice,
        strike: f64,
        back_iv: f64,
        rate: f64,
    ) -> error::Result<Option<Self>> {
        validate_positive(strike, "strike")?;
        validate_positive(back_iv, "back IV")?;
        validate_finite(rate, "rate")?;
        let gap = (back.expiration - front.expiration).num_days();
        if gap <= 0 {
            return Err(IvCrushError::invalid_input(format!(
                "back expiration {} must be after front expiration {}",
                back.expiration, front.expiration
            )));
        }

        let (Some(short_leg), Some(long_leg)) = (quoted_call(front, strike), quoted_call(back, strike))
        else {
            return Ok(None);
        };

        let remaining = gap as f64 / CALENDAR_DAYS_PER_YEAR;
        let back_value = price(strike, strike, remaining, rate, back_iv, OptionType::Call)?;
        let debit = long_leg.ask - short_leg.bid;

        Ok(Some(Self {
            strike,
            front_expiration: front.expiration,
            back_expiration: back.expiration,
            front_mid: short_leg.mid(),
            back_mid: long_leg.mid(),
            debit,
            max_profit: back_value - debit,
        }))
    }
}

/// A strike quoted in both expirations, with the liquidity behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarStrike {
    pub strike: f64,
    /// Back mid minus front mid.
    pub mid_debit: f64,
    pub front_volume: u64,
    pub back_volume: u64,
    /// `(strike - spot) / spot`.
    pub moneyness: f64,
}

impl CalendarStrike {
    pub fn total_volume(&self) -> u64 {
        self.front_volume.saturating_add(self.back_volume)
    }
}

/// Strikes within `band · spot` of spot where both calls are quoted
/// two-sided, most traded first.
///
/// Equal volumes are ordered by ascending strike.
///
/// # Errors
/// Returns [`IvCrushError::InvalidInput`] for a non-positive spot or a
/// negative band.
pub fn calendar_strikes(
    front: &ExpirationSlice,
    back: &ExpirationSlice,
    spot: f64,
    band: f64,
) -> error::Result<Vec<CalendarStrike>> {
    validate_positive(spot, "spot")?;
    validate_non_negative(band, "strike band")?;

    let mut strikes: Vec<f64> = front
        .quotes
        .iter()
        .filter(|q| q.option_type == OptionType::Call && (q.strike - spot).abs() <= band * spot)
        .map(|q| q.strike)
        .collect();
    strikes.sort_by(f64::total_cmp);
    strikes.dedup();

    let mut candidates: Vec<CalendarStrike> = strikes
        .into_iter()
        .filter_map(|strike| {
            let short_leg = quoted_call(front, strike)?;
            let long_leg = quoted_call(back, strike)?;
            Some(CalendarStrike {
                strike,
                mid_debit: long_leg.mid() - short_leg.mid(),
                front_volume: short_leg.volume,
                back_volume: long_leg.volume,
                moneyness: (strike - spot) / spot,
            })
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.total_volume()
            .cmp(&a.total_volume())
            .then(a.strike.total_cmp(&b.strike))
    });

    #[cfg(feature = "logging")]
    tracing::debug!(
        front = %front.expiration,
        back = %back.expiration,
        candidates = candidates.len(),
        "calendar strikes ranked"
    );

    Ok(candidates)
}

struct CallQuote {
    bid: f64,
    ask: f64,
    volume: u64,
}

impl CallQuote {
    fn mid(&self) -> f64 {
        0.5 * (self.bid + self.ask)
    }
}

/// The two-sided call at `strike`, if any.
fn quoted_call(slice: &ExpirationSlice, strike: f64) -> Option<CallQuote> {
    slice
        .quotes
        .iter()
        .filter(|q| q.option_type == OptionType::Call && q.strike == strike)
        .find_map(|q| {
            q.mid()?;
            Some(CallQuote {
                bid: q.bid?,
                ask: q.ask?,
                volume: q.volume,
            })
        })
}
