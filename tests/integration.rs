//! Integration tests for the ivcrush pipeline.
//!
//! Exercises the full path from a market snapshot through realized
//! volatility, term structure construction, qualification, scoring and
//! ranking, using only the public API.

use std::sync::Arc;
use std::thread;

use approx::assert_abs_diff_eq;
use chrono::{Days, NaiveDate};
use ivcrush::calendar::{CalendarSpread, DEFAULT_STRIKE_BAND, calendar_strikes};
use ivcrush::config::EvaluationConfig;
use ivcrush::realized::{VolatilityEstimate, VolatilityMethod, yang_zhang};
use ivcrush::scoring::rank;
use ivcrush::term::TermStructureBuilder;
use ivcrush::{
    ExpirationSlice, IvCrushError, MarketSnapshot, OptionQuote, OptionType, PriceBar,
    Recommendation, TradeRecommendation, evaluate, evaluate_batch,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

/// 40 synthetic bars oscillating around 100 with 2M shares a day.
///
/// Yang-Zhang over the trailing 31 bars is ≈ 0.25651.
fn synthetic_bars() -> Vec<PriceBar> {
    (0..40u32)
        .map(|i| {
            let x = f64::from(i);
            let base = 100.0 + 2.0 * (0.7 * x).sin();
            let open = base * (1.0 + 0.003 * (1.3 * x).cos());
            let close = base * (1.0 + 0.004 * (1.1 * x).sin());
            PriceBar::new(
                as_of() - Days::new(u64::from(40 - i)),
                open,
                open.max(close) * 1.008,
                open.min(close) * 0.992,
                close,
                2_000_000.0,
            )
        })
        .collect()
}

fn quote(
    option_type: OptionType,
    strike: f64,
    days: u64,
    bid: f64,
    ask: f64,
    iv: Option<f64>,
) -> OptionQuote {
    OptionQuote {
        option_type,
        strike,
        expiration: as_of() + Days::new(days),
        bid: Some(bid),
        ask: Some(ask),
        implied_volatility: iv,
        open_interest: 2_000,
        volume: 1_000,
    }
}

/// Chain with a 7-day front month and a 50-day back month around spot 100,
/// plus wing strikes that must never be picked as ATM.
fn chain(front_iv: f64, back_iv: f64) -> Vec<ExpirationSlice> {
    let mut quotes = Vec::new();
    let months = [
        (7, front_iv, (3.3, 3.5), (3.1, 3.3)),
        (50, back_iv, (6.0, 6.2), (5.8, 6.0)),
    ];
    for (days, iv, call, put) in months {
        quotes.push(quote(OptionType::Call, 100.0, days, call.0, call.1, Some(iv)));
        quotes.push(quote(OptionType::Put, 100.0, days, put.0, put.1, Some(iv)));
        quotes.push(quote(OptionType::Call, 110.0, days, 0.4, 0.6, Some(iv + 0.1)));
        quotes.push(quote(OptionType::Put, 90.0, days, 0.5, 0.7, Some(iv + 0.15)));
    }
    ExpirationSlice::group(quotes)
}

fn snapshot(symbol: &str, front_iv: f64, back_iv: f64, market_cap: f64) -> MarketSnapshot {
    MarketSnapshot {
        symbol: symbol.into(),
        as_of: as_of(),
        spot: 100.0,
        bars: synthetic_bars(),
        chain: chain(front_iv, back_iv),
        avg_volume_30d: Some(2_000_000.0),
        market_cap: Some(market_cap),
        options_volume: None,
    }
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[test]
fn full_pipeline_reference_values() {
    let r = evaluate(&snapshot("ACME", 0.65, 0.45, 5e10), &EvaluationConfig::default()).unwrap();

    assert_eq!(r.recommendation, Recommendation::Recommended);
    assert_abs_diff_eq!(r.realized_volatility, 0.256_512_604_300_851, epsilon = 1e-9);
    assert_abs_diff_eq!(r.iv_rv_ratio, 2.533_988_541_310_222, epsilon = 1e-8);
    assert_abs_diff_eq!(r.slope, -0.2 / 43.0, epsilon = 1e-12);
    assert_abs_diff_eq!(r.back_iv, 0.65 - 38.0 * 0.2 / 43.0, epsilon = 1e-12);
    assert_abs_diff_eq!(r.expected_move, 6.6, epsilon = 1e-9);

    let score = r.score.unwrap();
    assert_eq!(score.components.iv_rv, 100.0);
    assert_abs_diff_eq!(score.components.slope, 46.51, epsilon = 1e-9);
    assert_abs_diff_eq!(score.components.liquidity, 15.05, epsilon = 1e-9);
    assert_abs_diff_eq!(score.components.market_cap, 56.63, epsilon = 1e-9);
    assert_abs_diff_eq!(r.priority_score.unwrap(), 62.63, epsilon = 1e-9);
}

#[test]
fn options_activity_lifts_liquidity() {
    let mut s = snapshot("ACME", 0.65, 0.45, 5e10);
    s.options_volume = Some(250_000.0);
    let r = evaluate(&s, &EvaluationConfig::default()).unwrap();
    assert_abs_diff_eq!(r.score.unwrap().components.liquidity, 17.45, epsilon = 1e-9);
    assert_abs_diff_eq!(r.priority_score.unwrap(), 63.11, epsilon = 1e-9);
}

#[test]
fn calendar_matches_standalone_pricing() {
    let s = snapshot("ACME", 0.65, 0.45, 5e10);
    let r = evaluate(&s, &EvaluationConfig::default()).unwrap();
    let standalone = CalendarSpread::price(&s.chain[0], &s.chain[1], 100.0, 0.45, 0.0)
        .unwrap()
        .unwrap();
    assert_eq!(r.calendar_spread, Some(standalone));
    assert_eq!(r.position_size.to_string(), "6-8%");

    // 100 and 110 carry calls in both months with equal volume; 90 is puts only.
    let strikes = calendar_strikes(&s.chain[0], &s.chain[1], 100.0, DEFAULT_STRIKE_BAND).unwrap();
    let listed: Vec<f64> = strikes.iter().map(|c| c.strike).collect();
    assert_eq!(listed, vec![100.0, 110.0]);
    assert_eq!(strikes[0].total_volume(), 2_000);
}

#[test]
fn missing_vendor_ivs_are_back_solved() {
    let mut s = snapshot("ACME", 0.65, 0.45, 5e10);
    for slice in &mut s.chain {
        for q in &mut slice.quotes {
            q.implied_volatility = None;
        }
    }
    let r = evaluate(&s, &EvaluationConfig::default()).unwrap();
    // ATM mids alone still produce a steeply backwardated curve.
    assert!(r.front_iv > r.back_iv);
    assert!(r.slope < 0.0);
    assert!(r.front_iv > 0.5 && r.front_iv < 1.0);
}

#[test]
fn term_structure_builder_matches_engine() {
    let s = snapshot("ACME", 0.65, 0.45, 5e10);
    let curve = TermStructureBuilder::new()
        .as_of(s.as_of)
        .spot(s.spot)
        .slices(s.chain.clone())
        .build()
        .unwrap();
    let slope = curve.slope(45).unwrap();
    let r = evaluate(&s, &EvaluationConfig::default()).unwrap();
    assert_eq!(slope.front_iv, r.front_iv);
    assert_eq!(slope.slope, r.slope);
    assert_eq!(curve.front_atm().unwrap().strike, 100.0);
}

#[test]
fn twenty_day_window_reproduces_reference_yang_zhang() {
    let bars = synthetic_bars();
    let window = &bars[bars.len() - 21..];
    assert_abs_diff_eq!(yang_zhang(window, 252.0).unwrap(), 0.2493, epsilon = 1e-4);

    let est = VolatilityEstimate::compute(VolatilityMethod::YangZhang, &bars, 20, 252.0).unwrap();
    assert_abs_diff_eq!(est.annualized, 0.249_265_874_920_586_6, epsilon = 1e-9);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn stricter_config_from_toml_downgrades() {
    let config: EvaluationConfig = toml::from_str(
        r#"
        [thresholds]
        iv_rv_min = 3.0
        volume_min = 5000000.0
        "#,
    )
    .unwrap();
    let r = evaluate(&snapshot("ACME", 0.65, 0.45, 5e10), &config).unwrap();
    assert_eq!(r.qualification.passed(), 1);
    assert_eq!(r.recommendation, Recommendation::Avoid);
    assert!(r.priority_score.is_none());
}

#[test]
fn invalid_config_rejected_before_work() {
    let config = EvaluationConfig {
        volatility_lookback_days: 10,
        ..EvaluationConfig::default()
    };
    assert!(matches!(
        evaluate(&snapshot("ACME", 0.65, 0.45, 5e10), &config),
        Err(IvCrushError::InvalidInput { .. })
    ));
}

// ---------------------------------------------------------------------------
// Batch evaluation and ranking
// ---------------------------------------------------------------------------

#[test]
fn batch_then_rank_orders_actionable_candidates() {
    let snapshots = vec![
        snapshot("LOWCAP", 0.65, 0.45, 2e9),
        snapshot("CHEAP", 0.20, 0.30, 5e11),
        snapshot("MEGA", 0.65, 0.45, 8e11),
        snapshot("FLAT", 0.40, 0.45, 5e10),
    ];
    let results = evaluate_batch(&snapshots, &EvaluationConfig::default());
    let symbols: Vec<&str> = results
        .iter()
        .map(|r| r.as_ref().unwrap().symbol.as_str())
        .collect();
    assert_eq!(symbols, ["LOWCAP", "CHEAP", "MEGA", "FLAT"]);

    let ranked = rank(results.into_iter().map(Result::unwrap).collect());
    let order: Vec<&str> = ranked.iter().map(|r| r.symbol.as_str()).collect();
    // CHEAP is AVOID and drops out; MEGA beats LOWCAP only on market cap.
    assert_eq!(order, ["MEGA", "LOWCAP", "FLAT"]);
    assert!(ranked.windows(2).all(|w| w[0].priority_score >= w[1].priority_score));
}

#[test]
fn ranking_ties_break_on_symbol() {
    let a = evaluate(&snapshot("BBB", 0.65, 0.45, 5e10), &EvaluationConfig::default()).unwrap();
    let b = evaluate(&snapshot("AAA", 0.65, 0.45, 5e10), &EvaluationConfig::default()).unwrap();
    let ranked = rank(vec![a, b]);
    assert_eq!(ranked[0].symbol, "AAA");
    assert_eq!(ranked[1].symbol, "BBB");
}

#[test]
fn evaluations_share_config_across_threads() {
    let config = Arc::new(EvaluationConfig::default());
    let handles: Vec<_> = ["T1", "T2", "T3", "T4"]
        .into_iter()
        .map(|symbol| {
            let config = Arc::clone(&config);
            thread::spawn(move || evaluate(&snapshot(symbol, 0.65, 0.45, 5e10), &config).unwrap())
        })
        .collect();
    let totals: Vec<Option<f64>> = handles
        .into_iter()
        .map(|h| h.join().unwrap().priority_score)
        .collect();
    assert!(totals.iter().all(|&t| t == totals[0]));
}

// ---------------------------------------------------------------------------
// Output contract
// ---------------------------------------------------------------------------

#[test]
fn recommendation_round_trips_through_json() {
    let r = evaluate(&snapshot("ACME", 0.65, 0.45, 5e10), &EvaluationConfig::default()).unwrap();
    let json = serde_json::to_string(&r).unwrap();
    assert!(json.contains("\"frontIV\":0.65"));
    assert!(json.contains("\"recommendation\":\"RECOMMENDED\""));
    let back: TradeRecommendation =
        serde_json::from_value(serde_json::to_value(&r).unwrap()).unwrap();
    assert_eq!(back, r);
}

#[test]
fn snapshot_deserializes_from_vendor_json() {
    let mut s = snapshot("ACME", 0.65, 0.45, 5e10);
    s.avg_volume_30d = None;
    let json = serde_json::to_value(&s).unwrap();
    let mut obj = json.as_object().unwrap().clone();
    obj.remove("avg_volume_30d");
    obj.remove("options_volume");
    let parsed: MarketSnapshot = serde_json::from_value(obj.into()).unwrap();
    assert_eq!(parsed, s);
    assert!(evaluate(&parsed, &EvaluationConfig::default()).is_ok());
}
