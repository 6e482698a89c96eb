//! Screen a handful of earnings candidates and rank the survivors.
//!
//! Demonstrates the end-to-end workflow:
//!   1. Assemble a MarketSnapshot per symbol (bars + option chain)
//!   2. Evaluate the batch against an EvaluationConfig loaded from TOML
//!   3. Rank the actionable candidates by priority score
//!   4. Emit the output contract as JSON
//!
//! Run with: `cargo run --example screen_snapshot`

use chrono::{Days, NaiveDate};
use ivcrush::config::EvaluationConfig;
use ivcrush::pricing::price;
use ivcrush::scoring::{parse_market_cap, rank};
use ivcrush::{ExpirationSlice, MarketSnapshot, OptionQuote, OptionType, PriceBar, evaluate_batch};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let as_of = NaiveDate::from_ymd_opt(2024, 7, 22).ok_or("invalid date")?;

    // ---------------------------------------------------------------
    // 1. Market data: (symbol, spot, daily move, front IV, back IV, market cap)
    // ---------------------------------------------------------------

    let universe = [
        ("NFLX", 640.0, 0.018, 0.92, 0.38, "$275.4B"),
        ("SNAP", 12.5, 0.035, 1.45, 0.62, "$20.6B"),
        ("KO", 66.0, 0.007, 0.17, 0.16, "$284.1B"),
        ("TINY", 8.0, 0.030, 1.10, 0.70, "$750M"),
    ];

    let mut snapshots = Vec::new();
    for (symbol, spot, daily_move, front_iv, back_iv, cap) in universe {
        snapshots.push(MarketSnapshot {
            symbol: symbol.into(),
            as_of,
            spot,
            bars: bars(as_of, spot, daily_move),
            chain: chain(as_of, spot, front_iv, back_iv)?,
            avg_volume_30d: None,
            market_cap: Some(parse_market_cap(cap)?),
            options_volume: Some(80_000.0),
        });
    }

    // ---------------------------------------------------------------
    // 2. Evaluate with a caller-supplied configuration
    // ---------------------------------------------------------------

    let config: EvaluationConfig = toml::from_str(
        r#"
        risk_free_rate = 0.05
        volatility_lookback_days = 30

        [thresholds]
        volume_min = 1500000.0
        "#,
    )?;

    println!(
        "{:<6} {:>12} {:>8} {:>8} {:>10} {:>7} {:>8} {:>7}",
        "symbol", "verdict", "frontIV", "RV", "slope", "IV/RV", "move%", "score"
    );
    let mut evaluated = Vec::new();
    for (snapshot, result) in snapshots.iter().zip(evaluate_batch(&snapshots, &config)) {
        match result {
            Ok(r) => {
                println!(
                    "{:<6} {:>12} {:>8.3} {:>8.3} {:>10.5} {:>7.2} {:>8.2} {:>7}",
                    r.symbol,
                    r.recommendation.to_string(),
                    r.front_iv,
                    r.realized_volatility,
                    r.slope,
                    r.iv_rv_ratio,
                    r.expected_move,
                    r.priority_score
                        .map_or_else(|| "-".to_string(), |s| format!("{s:.2}")),
                );
                evaluated.push(r);
            }
            Err(e) => println!("{:<6} error: {e}", snapshot.symbol),
        }
    }

    // ---------------------------------------------------------------
    // 3. Rank and 4. serialize
    // ---------------------------------------------------------------

    let ranked = rank(evaluated);
    println!("\nRanked candidates:");
    for (i, r) in ranked.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, r.symbol, r.recommendation);
    }

    if let Some(best) = ranked.first() {
        println!("\nTop candidate:\n{}", serde_json::to_string_pretty(best)?);
    }

    Ok(())
}

/// 45 daily bars with a deterministic oscillation of roughly `daily_move`.
fn bars(as_of: NaiveDate, spot: f64, daily_move: f64) -> Vec<PriceBar> {
    (0..45u32)
        .map(|i| {
            let x = f64::from(i);
            let close = spot * (1.0 + daily_move * (0.9 * x).sin());
            let open = close * (1.0 - 0.4 * daily_move * (1.7 * x).cos());
            PriceBar::new(
                as_of - Days::new(u64::from(45 - i)),
                open,
                open.max(close) * (1.0 + 0.5 * daily_move),
                open.min(close) * (1.0 - 0.5 * daily_move),
                close,
                2_500_000.0 + 40_000.0 * x,
            )
        })
        .collect()
}

/// Four expirations (4, 11, 32 and 60 days) with strikes every 2.5% of spot.
///
/// The front week carries the earnings premium; later months decay towards `back_iv`.
fn chain(
    as_of: NaiveDate,
    spot: f64,
    front_iv: f64,
    back_iv: f64,
) -> Result<Vec<ExpirationSlice>, Box<dyn std::error::Error>> {
    let mut quotes = Vec::new();
    for days in [4u64, 11, 32, 60] {
        let t = days as f64 / 365.0;
        let atm_iv = back_iv + (front_iv - back_iv) * (-(days as f64 - 4.0) / 10.0).exp();
        for step in -4..=4 {
            let strike = spot * (1.0 + 0.025 * f64::from(step));
            for option_type in [OptionType::Call, OptionType::Put] {
                let mid = price(spot, strike, t, 0.05, atm_iv, option_type)?;
                let half_spread = (0.02 * mid).max(0.01);
                quotes.push(OptionQuote {
                    option_type,
                    strike,
                    expiration: as_of + Days::new(days),
                    bid: Some((mid - half_spread).max(0.0)),
                    ask: Some(mid + half_spread),
                    implied_volatility: Some(atm_iv),
                    open_interest: 5_000,
                    volume: 1_200,
                });
            }
        }
    }
    Ok(ExpirationSlice::group(quotes))
}
