//! Implied-volatility term structure from an option chain.
//!
//! Each expiration is reduced to its at-the-money implied volatility, giving
//! an ordered curve of `(days, iv)` points. The curve is then collapsed to a
//! front/back pair and the slope between them:
//!
//! ```text
//! front   = nearest usable expiration
//! back    = IV interpolated at the cutoff horizon (flat beyond the ends)
//! slope   = (back_iv − front_iv) / (cutoff − front_days)
//! ```
//!
//! A negative slope (front richer than back, "backwardation") is the earnings
//! signal the qualification step looks for.
//!
//! ```
//! use ivcrush::term::TermStructure;
//!
//! let curve = TermStructure::from_points(vec![(7, 0.65), (50, 0.45)])?;
//! let slope = curve.slope(45)?;
//! assert!((slope.slope - (-0.2 / 43.0)).abs() < 1e-12);
//! assert!(slope.is_backwardated());
//! # Ok::<(), ivcrush::IvCrushError>(())
//! ```

mod atm;
mod interp;

pub use atm::{AtmQuote, select_atm};

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, IvCrushError};
use crate::types::ExpirationSlice;
use crate::validate::{validate_finite, validate_positive};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimum number of usable expirations for a term structure.
pub const MIN_EXPIRATIONS: usize = 2;

/// One node of the curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermPoint {
    /// Calendar days to expiry.
    pub days: u32,
    /// ATM implied volatility.
    pub iv: f64,
}

/// Front/back summary of a term structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermStructureSlope {
    pub front_days: u32,
    pub front_iv: f64,
    /// Horizon the back IV was read at: the cutoff, or `front_days` when the
    /// front already sits beyond it.
    pub back_days: u32,
    pub back_iv: f64,
    /// IV change per calendar day.
    pub slope: f64,
}

impl TermStructureSlope {
    pub fn is_backwardated(&self) -> bool {
        self.slope < 0.0
    }
}

/// ATM implied volatility by days to expiry, strictly increasing in days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermStructure {
    points: Vec<TermPoint>,
    atm: Vec<AtmQuote>,
}

impl TermStructure {
    /// Build a curve from raw `(days, iv)` pairs.
    ///
    /// # Errors
    /// - [`IvCrushError::InsufficientExpirations`] for fewer than two points.
    /// - [`IvCrushError::Data`] for duplicate days or a non-positive IV.
    pub fn from_points(points: Vec<(u32, f64)>) -> error::Result<Self> {
        let mut points: Vec<TermPoint> = points
            .into_iter()
            .map(|(days, iv)| TermPoint { days, iv })
            .collect();
        points.sort_by_key(|p| p.days);
        Self::assemble(points, Vec::new())
    }

    fn assemble(points: Vec<TermPoint>, atm: Vec<AtmQuote>) -> error::Result<Self> {
        if points.len() < MIN_EXPIRATIONS {
            return Err(IvCrushError::InsufficientExpirations {
                message: format!(
                    "need at least {MIN_EXPIRATIONS} usable expirations, found {}",
                    points.len()
                ),
                required: MIN_EXPIRATIONS,
                usable: points.len(),
            });
        }
        for pair in points.windows(2) {
            if pair[1].days <= pair[0].days {
                return Err(IvCrushError::data(format!(
                    "duplicate term structure node at {} days",
                    pair[1].days
                )));
            }
        }
        for p in &points {
            if !p.iv.is_finite() || p.iv <= 0.0 {
                return Err(IvCrushError::data(format!(
                    "implied volatility at {} days must be positive, got {}",
                    p.days, p.iv
                )));
            }
        }
        Ok(Self { points, atm })
    }

    pub fn points(&self) -> &[TermPoint] {
        &self.points
    }

    /// ATM quotes behind each point. Empty for curves built with
    /// [`from_points`](Self::from_points).
    pub fn atm_quotes(&self) -> &[AtmQuote] {
        &self.atm
    }

    /// The nearest expiration.
    pub fn front(&self) -> TermPoint {
        self.points[0]
    }

    /// ATM quote of the nearest expiration, if the curve came from a chain.
    pub fn front_atm(&self) -> Option<&AtmQuote> {
        self.atm.first()
    }

    /// IV at `days`: linear between nodes, flat outside them.
    pub fn iv_at(&self, days: f64) -> f64 {
        let (xs, ys): (Vec<f64>, Vec<f64>) = self
            .points
            .iter()
            .map(|p| (f64::from(p.days), p.iv))
            .unzip();
        interp::linear_flat(&xs, &ys, days)
    }

    /// Front/back pair and slope for a cutoff horizon.
    ///
    /// # Errors
    /// Returns [`IvCrushError::InsufficientExpirations`] if no expiration
    /// reaches `cutoff_days`.
    pub fn slope(&self, cutoff_days: u32) -> error::Result<TermStructureSlope> {
        let beyond = self.points.iter().filter(|p| p.days >= cutoff_days).count();
        if beyond == 0 {
            let last = self.points[self.points.len() - 1].days;
            return Err(IvCrushError::InsufficientExpirations {
                message: format!(
                    "no expiration at or beyond the {cutoff_days}-day cutoff (longest is {last} days)"
                ),
                required: 1,
                usable: 0,
            });
        }

        let front = self.front();
        let result = if front.days >= cutoff_days {
            TermStructureSlope {
                front_days: front.days,
                front_iv: front.iv,
                back_days: front.days,
                back_iv: front.iv,
                slope: 0.0,
            }
        } else {
            let back_iv = self.iv_at(f64::from(cutoff_days));
            TermStructureSlope {
                front_days: front.days,
                front_iv: front.iv,
                back_days: cutoff_days,
                back_iv,
                slope: (back_iv - front.iv) / f64::from(cutoff_days - front.days),
            }
        };

        #[cfg(feature = "logging")]
        tracing::debug!(
            front_days = result.front_days,
            front_iv = result.front_iv,
            back_iv = result.back_iv,
            slope = result.slope,
            "term structure slope"
        );

        Ok(result)
    }
}

/// Builder reducing an option chain to a [`TermStructure`].
///
/// ```
/// use chrono::NaiveDate;
/// use ivcrush::term::TermStructureBuilder;
/// use ivcrush::types::{ExpirationSlice, OptionQuote, OptionType};
///
/// let as_of = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
/// let quote = |days: u64, iv: f64| OptionQuote {
///     option_type: OptionType::Call,
///     strike: 100.0,
///     expiration: as_of + chrono::Days::new(days),
///     bid: Some(2.0),
///     ask: Some(2.2),
///     implied_volatility: Some(iv),
///     open_interest: 0,
///     volume: 0,
/// };
///
/// let curve = TermStructureBuilder::new()
///     .as_of(as_of)
///     .spot(100.0)
///     .slices(ExpirationSlice::group([quote(7, 0.65), quote(50, 0.45)]))
///     .build()?;
/// assert_eq!(curve.front().days, 7);
/// # Ok::<(), ivcrush::IvCrushError>(())
/// ```
#[derive(Debug, Default)]
pub struct TermStructureBuilder {
    as_of: Option<NaiveDate>,
    spot: Option<f64>,
    rate: f64,
    slices: Vec<ExpirationSlice>,
}

impl TermStructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluation date; days to expiry are counted from here.
    pub fn as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// Risk-free rate used when back-solving missing IVs. Default 0.
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn add_slice(mut self, slice: ExpirationSlice) -> Self {
        self.slices.push(slice);
        self
    }

    pub fn slices(mut self, slices: impl IntoIterator<Item = ExpirationSlice>) -> Self {
        self.slices.extend(slices);
        self
    }

    /// Select the ATM quote of every unexpired slice and assemble the curve.
    ///
    /// Slices expiring on or before the evaluation date, and slices without a
    /// usable quote, are skipped.
    ///
    /// # Errors
    /// - [`IvCrushError::InvalidInput`] if spot or the evaluation date is
    ///   missing, or spot/rate are out of domain.
    /// - [`IvCrushError::Data`] for duplicate expirations or corrupt quotes.
    /// - [`IvCrushError::InsufficientExpirations`] for fewer than two usable
    ///   expirations.
    pub fn build(mut self) -> error::Result<TermStructure> {
        let as_of = self
            .as_of
            .ok_or_else(|| IvCrushError::invalid_input("evaluation date is required"))?;
        let spot = self
            .spot
            .ok_or_else(|| IvCrushError::invalid_input("spot price is required"))?;
        validate_positive(spot, "spot")?;
        validate_finite(self.rate, "rate")?;

        let mut seen = BTreeSet::new();
        for slice in &self.slices {
            if !seen.insert(slice.expiration) {
                return Err(IvCrushError::data(format!(
                    "expiration {} appears in more than one slice",
                    slice.expiration
                )));
            }
        }
        self.slices.sort_by_key(|s| s.expiration);

        let rate = self.rate;
        let live: Vec<(u32, &ExpirationSlice)> = self
            .slices
            .iter()
            .filter_map(|slice| {
                let days = (slice.expiration - as_of).num_days();
                u32::try_from(days)
                    .ok()
                    .filter(|&d| d > 0)
                    .map(|d| (d, slice))
            })
            .collect();

        #[cfg(feature = "logging")]
        tracing::debug!(
            n_slices = self.slices.len(),
            n_live = live.len(),
            "term structure build started"
        );

        let select = |&(days, slice): &(u32, &ExpirationSlice)| select_atm(slice, days, spot, rate);

        #[cfg(feature = "parallel")]
        let selected = live
            .par_iter()
            .map(select)
            .collect::<error::Result<Vec<_>>>()?;
        #[cfg(not(feature = "parallel"))]
        let selected = live
            .iter()
            .map(select)
            .collect::<error::Result<Vec<_>>>()?;

        let atm: Vec<AtmQuote> = selected.into_iter().flatten().collect();
        let points = atm
            .iter()
            .map(|q| TermPoint {
                days: q.days,
                iv: q.iv,
            })
            .collect();

        #[cfg(feature = "logging")]
        tracing::debug!(usable = atm.len(), "term structure build complete");

        TermStructure::assemble(points, atm)
    }
}
