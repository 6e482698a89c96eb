use std::hint::black_box;

use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ivcrush::config::EvaluationConfig;
use ivcrush::pricing::{implied_volatility, price};
use ivcrush::realized::yang_zhang;
use ivcrush::term::TermStructureBuilder;
use ivcrush::{
    ExpirationSlice, MarketSnapshot, OptionQuote, OptionType, PriceBar, evaluate, evaluate_batch,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

/// Generate `n` synthetic daily bars ending the day before `as_of`.
fn generate_bars(n: u32) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let x = f64::from(i);
            let base = 100.0 + 2.0 * (0.7 * x).sin();
            let open = base * (1.0 + 0.003 * (1.3 * x).cos());
            let close = base * (1.0 + 0.004 * (1.1 * x).sin());
            PriceBar::new(
                as_of() - Days::new(u64::from(n - i)),
                open,
                open.max(close) * 1.008,
                open.min(close) * 0.992,
                close,
                2_000_000.0,
            )
        })
        .collect()
}

/// Generate a chain of weekly expirations with strikes 80..=120, priced off a
/// backwardated term structure with a mild skew.
///
/// When `with_iv` is false the vendor IVs are dropped, forcing back-solves.
fn generate_chain(n_expirations: u64, with_iv: bool) -> Vec<ExpirationSlice> {
    let mut quotes = Vec::new();
    for e in 0..n_expirations {
        let days = 7 + 7 * e;
        let t = days as f64 / 365.0;
        let atm_vol = 0.35 + 0.30 * (-(days as f64) / 20.0).exp();
        for k in (80..=120).step_by(5) {
            let strike = f64::from(k);
            let vol = atm_vol + 0.002 * (100.0 - strike).abs();
            for option_type in [OptionType::Call, OptionType::Put] {
                let mid = price(100.0, strike, t, 0.0, vol, option_type)
                    .expect("benchmark pricing inputs should be valid");
                quotes.push(OptionQuote {
                    option_type,
                    strike,
                    expiration: as_of() + Days::new(days),
                    bid: Some((mid - 0.05).max(0.0)),
                    ask: Some(mid + 0.05),
                    implied_volatility: with_iv.then_some(vol),
                    open_interest: 1_000,
                    volume: 250,
                });
            }
        }
    }
    ExpirationSlice::group(quotes)
}

fn snapshot(symbol: String) -> MarketSnapshot {
    MarketSnapshot {
        symbol,
        as_of: as_of(),
        spot: 100.0,
        bars: generate_bars(60),
        chain: generate_chain(10, true),
        avg_volume_30d: None,
        market_cap: Some(5e10),
        options_volume: Some(50_000.0),
    }
}

fn component_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("components");

    // Yang-Zhang over a 30-return window
    let bars = generate_bars(31);
    group.bench_function("yang_zhang_30", |b| {
        b.iter(|| yang_zhang(black_box(&bars), black_box(252.0)).unwrap());
    });

    // Brent back-solve, near-expiry out-of-the-money call
    let t = 5.0 / 365.0;
    let p = price(100.0, 110.0, t, 0.0, 0.9, OptionType::Call).unwrap();
    group.bench_function("implied_vol_near_expiry_otm", |b| {
        b.iter(|| {
            implied_volatility(
                black_box(p),
                black_box(100.0),
                black_box(110.0),
                black_box(t),
                black_box(0.0),
                OptionType::Call,
            )
            .unwrap()
        });
    });

    // Term structure: 10 weekly expirations x 9 strikes x 2 legs
    for with_iv in [true, false] {
        let chain = generate_chain(10, with_iv);
        let label = if with_iv { "vendor_iv" } else { "back_solved" };
        group.bench_function(BenchmarkId::new("term_structure_10", label), |b| {
            b.iter(|| {
                TermStructureBuilder::new()
                    .as_of(as_of())
                    .spot(black_box(100.0))
                    .slices(black_box(&chain).iter().cloned())
                    .build()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn evaluation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");
    let config = EvaluationConfig::default();

    let single = snapshot("ACME".into());
    group.bench_function("evaluate_single", |b| {
        b.iter(|| evaluate(black_box(&single), black_box(&config)).unwrap());
    });

    for n in [10usize, 100] {
        let batch: Vec<MarketSnapshot> = (0..n).map(|i| snapshot(format!("SYM{i}"))).collect();
        group.bench_with_input(BenchmarkId::new("evaluate_batch", n), &batch, |b, batch| {
            b.iter(|| evaluate_batch(black_box(batch), black_box(&config)));
        });
    }

    group.finish();
}

criterion_group!(benches, component_benchmarks, evaluation_benchmarks);
criterion_main!(benches);
