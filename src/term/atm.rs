//! At-the-money quote selection for one expiration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, IvCrushError};
use crate::pricing::{CALENDAR_DAYS_PER_YEAR, implied_volatility};
use crate::types::{ExpirationSlice, OptionQuote, OptionType};

/// The at-the-money strike of one expiration and its implied volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtmQuote {
    pub expiration: NaiveDate,
    /// Calendar days from the evaluation date.
    pub days: u32,
    pub strike: f64,
    /// Mean IV of the usable call and put at `strike`.
    pub iv: f64,
    pub call_mid: Option<f64>,
    pub put_mid: Option<f64>,
}

impl AtmQuote {
    /// Mid price of the ATM straddle, when both legs are quoted two-sided.
    pub fn straddle_mid(&self) -> Option<f64> {
        Some(self.call_mid? + self.put_mid?)
    }
}

/// A quote that survived the usability filter, with its resolved IV.
struct Usable {
    strike: f64,
    iv: f64,
}

/// Resolve the IV of a quote, or `None` if the quote cannot be used.
///
/// A quote needs a two-sided market. A vendor IV of exactly zero is treated
/// as a placeholder; a negative one is corrupt data. A missing IV is
/// back-solved from the mid price.
fn resolve_iv(
    quote: &OptionQuote,
    spot: f64,
    time: f64,
    rate: f64,
) -> error::Result<Option<f64>> {
    if !quote.strike.is_finite() || quote.strike <= 0.0 {
        return Err(IvCrushError::data(format!(
            "{} quote expiring {} has invalid strike {}",
            option_label(quote.option_type),
            quote.expiration,
            quote.strike
        )));
    }
    let Some(mid) = quote.mid() else {
        return Ok(None);
    };

    match quote.implied_volatility {
        Some(iv) if !iv.is_finite() || iv < 0.0 => Err(IvCrushError::data(format!(
            "{} {} expiring {} has invalid implied volatility {iv}",
            option_label(quote.option_type),
            quote.strike,
            quote.expiration
        ))),
        Some(iv) if iv == 0.0 => Ok(None),
        Some(iv) => Ok(Some(iv)),
        None => match implied_volatility(mid, spot, quote.strike, time, rate, quote.option_type) {
            Ok(vol) => Ok(Some(vol.0)),
            Err(_err @ IvCrushError::Convergence { .. }) => {
                #[cfg(feature = "logging")]
                tracing::debug!(
                    strike = quote.strike,
                    expiration = %quote.expiration,
                    error = %_err,
                    "implied volatility back-solve failed, quote excluded"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        },
    }
}

fn option_label(option_type: OptionType) -> &'static str {
    match option_type {
        OptionType::Call => "call",
        OptionType::Put => "put",
    }
}

/// Select the ATM quote of `slice`.
///
/// The ATM strike is the usable strike closest to `spot`; exact ties go to
/// the lower strike. Returns `Ok(None)` when the slice has no usable quote.
///
/// # Errors
/// Returns [`IvCrushError::Data`] for non-positive strikes or negative IVs.
pub fn select_atm(
    slice: &ExpirationSlice,
    days: u32,
    spot: f64,
    rate: f64,
) -> error::Result<Option<AtmQuote>> {
    let time = f64::from(days) / CALENDAR_DAYS_PER_YEAR;

    let mut usable = Vec::with_capacity(slice.quotes.len());
    for quote in &slice.quotes {
        if let Some(iv) = resolve_iv(quote, spot, time, rate)? {
            usable.push(Usable {
                strike: quote.strike,
                iv,
            });
        }
    }

    #[cfg(feature = "logging")]
    tracing::trace!(
        expiration = %slice.expiration,
        quotes = slice.quotes.len(),
        usable = usable.len(),
        "expiration filtered"
    );

    let Some(strike) = usable
        .iter()
        .map(|u| u.strike)
        .min_by(|a, b| {
            (a - spot)
                .abs()
                .total_cmp(&(b - spot).abs())
                .then(a.total_cmp(b))
        })
    else {
        return Ok(None);
    };

    let ivs: Vec<f64> = usable
        .iter()
        .filter(|u| u.strike == strike)
        .map(|u| u.iv)
        .collect();
    let iv = ivs.iter().sum::<f64>() / ivs.len() as f64;

    let leg_mid = |option_type: OptionType| {
        slice
            .quotes
            .iter()
            .filter(|q| q.option_type == option_type && q.strike == strike)
            .find_map(OptionQuote::mid)
    };

    Ok(Some(AtmQuote {
        expiration: slice.expiration,
        days,
        strike,
        iv,
        call_mid: leg_mid(OptionType::Call),
        put_mid: leg_mid(OptionType::Put),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::price;
    use approx::assert_abs_diff_eq;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn quote(option_type: OptionType, strike: f64, iv: Option<f64>) -> OptionQuote {
        OptionQuote {
            option_type,
            strike,
            expiration: expiry(),
            bid: Some(2.0),
            ask: Some(2.2),
            implied_volatility: iv,
            open_interest: 100,
            volume: 50,
        }
    }

    fn slice(quotes: Vec<OptionQuote>) -> ExpirationSlice {
        ExpirationSlice::new(expiry(), quotes)
    }

    #[test]
    fn picks_closest_strike_and_averages_legs() {
        let s = slice(vec![
            quote(OptionType::Call, 95.0, Some(0.40)),
            quote(OptionType::Call, 100.0, Some(0.30)),
            quote(OptionType::Put, 100.0, Some(0.34)),
            quote(OptionType::Put, 105.0, Some(0.50)),
        ]);
        let atm = select_atm(&s, 10, 101.0, 0.0).unwrap().unwrap();
        assert_eq!(atm.strike, 100.0);
        assert_abs_diff_eq!(atm.iv, 0.32, epsilon = 1e-12);
        assert_abs_diff_eq!(atm.straddle_mid().unwrap(), 4.2, epsilon = 1e-12);
    }

    #[test]
    fn equidistant_strikes_resolve_to_lower() {
        let s = slice(vec![
            quote(OptionType::Call, 105.0, Some(0.25)),
            quote(OptionType::Call, 95.0, Some(0.35)),
        ]);
        let atm = select_atm(&s, 10, 100.0, 0.0).unwrap().unwrap();
        assert_eq!(atm.strike, 95.0);
        assert_eq!(atm.iv, 0.35);
        assert!(atm.put_mid.is_none());
        assert!(atm.straddle_mid().is_none());
    }

    #[test]
    fn one_sided_and_zero_iv_quotes_are_skipped() {
        let mut no_ask = quote(OptionType::Call, 100.0, Some(0.3));
        no_ask.ask = None;
        let zero_iv = quote(OptionType::Put, 100.0, Some(0.0));
        let s = slice(vec![no_ask, zero_iv, quote(OptionType::Call, 110.0, Some(0.45))]);
        let atm = select_atm(&s, 10, 100.0, 0.0).unwrap().unwrap();
        assert_eq!(atm.strike, 110.0);
    }

    #[test]
    fn no_usable_quote_is_none() {
        let mut q = quote(OptionType::Call, 100.0, Some(0.3));
        q.bid = None;
        assert!(select_atm(&slice(vec![q]), 10, 100.0, 0.0).unwrap().is_none());
        assert!(select_atm(&slice(vec![]), 10, 100.0, 0.0).unwrap().is_none());
    }

    #[test]
    fn negative_iv_is_data_error() {
        let s = slice(vec![quote(OptionType::Call, 100.0, Some(-0.1))]);
        assert!(matches!(
            select_atm(&s, 10, 100.0, 0.0),
            Err(IvCrushError::Data { .. })
        ));
    }

    #[test]
    fn missing_iv_is_back_solved_from_mid() {
        let t = 20.0 / 365.0;
        let p = price(100.0, 100.0, t, 0.0, 0.55, OptionType::Call).unwrap();
        let mut q = quote(OptionType::Call, 100.0, None);
        q.bid = Some(p - 0.01);
        q.ask = Some(p + 0.01);
        let atm = select_atm(&slice(vec![q]), 20, 100.0, 0.0).unwrap().unwrap();
        assert_abs_diff_eq!(atm.iv, 0.55, epsilon = 1e-4);
    }

    #[test]
    fn unsolvable_mid_excludes_quote() {
        // A call mid above spot violates no-arbitrage.
        let mut bad = quote(OptionType::Call, 100.0, None);
        bad.bid = Some(150.0);
        bad.ask = Some(160.0);
        let s = slice(vec![bad, quote(OptionType::Put, 110.0, Some(0.4))]);
        let atm = select_atm(&s, 10, 100.0, 0.0).unwrap().unwrap();
        assert_eq!(atm.strike, 110.0);
    }
}
