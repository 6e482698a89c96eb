//! End-to-end evaluation of one underlying.
//!
//! ```text
//! bars  ──► realized vol ─┐
//!                         ├─► IV/RV ─┐
//! chain ──► term structure┴─► slope ─┼─► qualify ─► score ─► TradeRecommendation
//!              volume, market cap ───┘
//! ```
//!
//! Evaluation is pure: no I/O, no shared state, no clocks. The evaluation
//! date travels inside the [`MarketSnapshot`], so identical inputs always
//! produce identical recommendations and independent symbols can be
//! evaluated concurrently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarSpread;
use crate::config::EvaluationConfig;
use crate::error::{self, IvCrushError};
use crate::pricing::{CALENDAR_DAYS_PER_YEAR, straddle_price};
use crate::qualification::{PositionSize, QualificationResult, Recommendation, qualify};
use crate::realized::{VolatilityEstimate, average_volume};
use crate::scoring::{PriorityScore, PriorityScorer, ScoreFactors};
use crate::term::{TermStructure, TermStructureBuilder};
use crate::types::{ExpirationSlice, PriceBar};
use crate::validate::validate_positive;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Market observations for one symbol, already fetched by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    /// Evaluation date; option days-to-expiry count from here.
    pub as_of: NaiveDate,
    pub spot: f64,
    /// Daily bars, oldest first, covering at least the lookback plus one day.
    pub bars: Vec<PriceBar>,
    pub chain: Vec<ExpirationSlice>,
    /// 30-day average share volume. Derived from `bars` when absent.
    #[serde(default)]
    pub avg_volume_30d: Option<f64>,
    /// Market capitalization in dollars.
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Option contracts traded, for the liquidity bonus.
    #[serde(default)]
    pub options_volume: Option<f64>,
}

/// The serializable output of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecommendation {
    pub symbol: String,
    pub recommendation: Recommendation,
    /// Composite score; `None` for `AVOID` or when a scoring factor is unknown.
    pub priority_score: Option<f64>,
    #[serde(rename = "frontIV")]
    pub front_iv: f64,
    #[serde(rename = "backIV")]
    pub back_iv: f64,
    /// IV change per calendar day between front and cutoff horizon.
    pub slope: f64,
    pub realized_volatility: f64,
    pub iv_rv_ratio: f64,
    /// Front ATM straddle as a percentage of spot.
    pub expected_move: f64,
    pub avg_volume_30d: Option<f64>,
    pub qualification: QualificationResult,
    pub score: Option<PriorityScore>,
    /// Suggested share of capital for the trade.
    pub position_size: PositionSize,
    /// ATM call calendar from the front expiration to the first one at or
    /// past the cutoff.
    #[serde(default)]
    pub calendar_spread: Option<CalendarSpread>,
}

/// Evaluate one snapshot.
///
/// # Errors
/// - [`IvCrushError::InvalidInput`] for an invalid configuration or spot.
/// - [`IvCrushError::InsufficientData`] when the bars do not cover the lookback.
/// - [`IvCrushError::InsufficientExpirations`] when the chain cannot produce
///   a term structure reaching the cutoff.
/// - [`IvCrushError::Data`] for malformed bars or quotes, a zero realized
///   volatility, or a negative volume/market cap.
pub fn evaluate(
    snapshot: &MarketSnapshot,
    config: &EvaluationConfig,
) -> error::Result<TradeRecommendation> {
    config.validate()?;
    validate_positive(snapshot.spot, "spot")?;

    #[cfg(feature = "logging")]
    tracing::debug!(
        symbol = %snapshot.symbol,
        as_of = %snapshot.as_of,
        n_bars = snapshot.bars.len(),
        n_expirations = snapshot.chain.len(),
        "evaluation started"
    );

    let realized = || {
        VolatilityEstimate::compute(
            config.volatility_method,
            &snapshot.bars,
            config.volatility_lookback_days,
            config.trading_days_per_year,
        )
    };
    let term = || {
        TermStructureBuilder::new()
            .as_of(snapshot.as_of)
            .spot(snapshot.spot)
            .rate(config.risk_free_rate)
            .slices(snapshot.chain.iter().cloned())
            .build()
    };
    #[cfg(feature = "parallel")]
    let (rv, curve) = rayon::join(realized, term);
    #[cfg(not(feature = "parallel"))]
    let (rv, curve) = (realized(), term());
    let (rv, curve) = (rv?, curve?);

    let slope = curve.slope(config.term_structure_cutoff_days)?;

    if rv.annualized <= 0.0 {
        return Err(IvCrushError::data(format!(
            "{}: realized volatility is zero, IV/RV undefined",
            snapshot.symbol
        )));
    }
    let iv_rv_ratio = slope.front_iv / rv.annualized;

    let avg_volume_30d = match snapshot.avg_volume_30d {
        Some(v) => Some(require_non_negative(v, "average volume")?),
        None => average_volume(&snapshot.bars, config.volume_window_days)?,
    };
    let market_cap = snapshot
        .market_cap
        .map(|m| require_non_negative(m, "market cap"))
        .transpose()?;

    let qualification = qualify(slope.slope, avg_volume_30d, iv_rv_ratio, &config.thresholds);

    let score = match (qualification.recommendation, avg_volume_30d, market_cap) {
        (rec, Some(avg_volume_30d), Some(market_cap)) if rec.is_actionable() => {
            let scorer = PriorityScorer::new(config.scoring)?;
            Some(scorer.score(&ScoreFactors {
                iv_rv_ratio,
                slope: slope.slope,
                avg_volume_30d,
                market_cap,
                options_volume: snapshot.options_volume,
            }))
        }
        _ => None,
    };

    let expected_move = expected_move(&curve, snapshot.spot, config.risk_free_rate)?;
    let calendar_spread = calendar_spread(
        snapshot,
        &curve,
        config.term_structure_cutoff_days,
        config.risk_free_rate,
    )?;

    let recommendation = TradeRecommendation {
        symbol: snapshot.symbol.clone(),
        recommendation: qualification.recommendation,
        priority_score: score.map(|s| s.total),
        front_iv: slope.front_iv,
        back_iv: slope.back_iv,
        slope: slope.slope,
        realized_volatility: rv.annualized,
        iv_rv_ratio,
        expected_move,
        avg_volume_30d,
        qualification,
        score,
        position_size: qualification.recommendation.position_size(),
        calendar_spread,
    };

    #[cfg(feature = "logging")]
    tracing::info!(
        symbol = %recommendation.symbol,
        recommendation = %recommendation.recommendation,
        priority_score = ?recommendation.priority_score,
        iv_rv = recommendation.iv_rv_ratio,
        slope = recommendation.slope,
        "evaluation complete"
    );

    Ok(recommendation)
}

/// Evaluate many snapshots, preserving input order.
///
/// Each snapshot succeeds or fails on its own. With the `parallel` feature
/// the work is spread over the rayon thread pool.
pub fn evaluate_batch(
    snapshots: &[MarketSnapshot],
    config: &EvaluationConfig,
) -> Vec<error::Result<TradeRecommendation>> {
    #[cfg(feature = "parallel")]
    let results = snapshots.par_iter().map(|s| evaluate(s, config)).collect();
    #[cfg(not(feature = "parallel"))]
    let results = snapshots.iter().map(|s| evaluate(s, config)).collect();
    results
}

/// Front ATM straddle over spot, in percent.
///
/// Uses the quoted straddle mid when both legs are two-sided, otherwise
/// prices the straddle at the front ATM IV.
fn expected_move(curve: &TermStructure, spot: f64, rate: f64) -> error::Result<f64> {
    let atm = curve
        .front_atm()
        .ok_or_else(|| IvCrushError::data("term structure has no front ATM quote"))?;
    let straddle = match atm.straddle_mid() {
        Some(mid) => mid,
        None => straddle_price(
            spot,
            atm.strike,
            f64::from(atm.days) / CALENDAR_DAYS_PER_YEAR,
            rate,
            atm.iv,
        )?,
    };
    Ok(straddle / spot * 100.0)
}

/// Price the ATM call calendar against the first later expiration at or past
/// the cutoff. `None` when there is none or a call leg is not quoted.
fn calendar_spread(
    snapshot: &MarketSnapshot,
    curve: &TermStructure,
    cutoff_days: u32,
    rate: f64,
) -> error::Result<Option<CalendarSpread>> {
    let Some(front) = curve.front_atm() else {
        return Ok(None);
    };
    let Some(back) = curve
        .atm_quotes()
        .iter()
        .find(|q| q.days >= cutoff_days && q.days > front.days)
    else {
        return Ok(None);
    };
    let slice = |expiration: NaiveDate| snapshot.chain.iter().find(|s| s.expiration == expiration);
    let (Some(front_slice), Some(back_slice)) = (slice(front.expiration), slice(back.expiration))
    else {
        return Ok(None);
    };
    CalendarSpread::price(front_slice, back_slice, front.strike, back.iv, rate)
}

fn require_non_negative(value: f64, what: &str) -> error::Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(IvCrushError::data(format!(
            "{what} must be non-negative and finite, got {value}"
        )));
    }
    Ok(value)
}
