//! Core domain types: price bars, option quotes and expiration slices.
//!
//! All entities are plain values built fresh for one evaluation and dropped
//! afterwards. Nothing here is mutated once handed to the engine.
//!
//! # Why no `Eq` or `Ord`?
//! These types carry `f64` fields, which do not implement `Eq` or `Ord`
//! because `NaN` breaks total ordering. We derive `PartialEq` only.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{IvCrushError, Result};

/// Implied or realized volatility `σ`, measured as annualized standard deviation.
///
/// A vol of 0.20 represents 20% annualized volatility.
///
/// # Examples
/// ```
/// use ivcrush::types::Vol;
/// let vol = Vol(0.20);
/// assert_eq!(vol.0, 0.20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vol(pub f64);

/// Option type: call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Right to buy at strike price.
    Call,
    /// Right to sell at strike price.
    Put,
}

impl OptionType {
    /// Payoff at expiry.
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }
}

/// One daily OHLCV bar.
///
/// A window of bars must be ordered oldest first and contiguous on the
/// trading-day calendar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Check the bar invariants: all prices positive and finite,
    /// `low <= {open, close} <= high`, volume non-negative.
    ///
    /// # Errors
    /// Returns [`IvCrushError::Data`] naming the bar date and offending field.
    pub fn validate(&self) -> Result<()> {
        match self.violation() {
            Some(message) => Err(IvCrushError::data(format!("bar {}: {message}", self.date))),
            None => Ok(()),
        }
    }

    /// Like [`validate`](Self::validate), naming the bar's position in its window.
    pub(crate) fn validate_at(&self, index: usize) -> Result<()> {
        match self.violation() {
            Some(message) => Err(IvCrushError::data(format!(
                "bar {index} ({}): {message}",
                self.date
            ))),
            None => Ok(()),
        }
    }

    fn violation(&self) -> Option<String> {
        for (value, field) in [
            (self.open, "open"),
            (self.high, "high"),
            (self.low, "low"),
            (self.close, "close"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Some(format!("{field} must be positive and finite, got {value}"));
            }
        }
        if self.low > self.open.min(self.close) || self.high < self.open.max(self.close) {
            return Some(format!(
                "range [{}, {}] does not contain open {} and close {}",
                self.low, self.high, self.open, self.close
            ));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some(format!(
                "volume must be non-negative and finite, got {}",
                self.volume
            ));
        }
        None
    }
}

/// A single option quote from a chain snapshot.
///
/// `bid`, `ask` and `implied_volatility` are optional because data vendors
/// routinely leave them blank. A missing IV can be back-solved from the mid
/// price; a missing side makes the quote unusable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub option_type: OptionType,
    pub strike: f64,
    pub expiration: NaiveDate,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub implied_volatility: Option<f64>,
    #[serde(default)]
    pub open_interest: u64,
    #[serde(default)]
    pub volume: u64,
}

impl OptionQuote {
    /// Mid price when both sides are present, finite, non-negative and not crossed.
    pub fn mid(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask))
                if bid.is_finite() && ask.is_finite() && bid >= 0.0 && ask >= bid =>
            {
                Some(0.5 * (bid + ask))
            }
            _ => None,
        }
    }
}

/// All quotes sharing one expiration date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpirationSlice {
    pub expiration: NaiveDate,
    pub quotes: Vec<OptionQuote>,
}

impl ExpirationSlice {
    pub fn new(expiration: NaiveDate, quotes: Vec<OptionQuote>) -> Self {
        Self { expiration, quotes }
    }

    /// Group a flat list of quotes into slices ordered by expiration.
    pub fn group(quotes: impl IntoIterator<Item = OptionQuote>) -> Vec<ExpirationSlice> {
        let mut by_expiry: BTreeMap<NaiveDate, Vec<OptionQuote>> = BTreeMap::new();
        for quote in quotes {
            by_expiry.entry(quote.expiration).or_default().push(quote);
        }
        by_expiry
            .into_iter()
            .map(|(expiration, quotes)| Self { expiration, quotes })
            .collect()
    }

    /// Total contract volume traded across the slice.
    pub fn total_volume(&self) -> u64 {
        self.quotes.iter().map(|q| q.volume).sum()
    }
}
