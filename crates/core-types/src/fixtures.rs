//! Deterministic synthetic market data for tests.
//!
//! Every generator is a pure function of its arguments (including the seed),
//! so tests built on top of it are reproducible.

use crate::enums::{AssetClass, Timeframe};
use crate::market::{Bar, Instrument, MarketSnapshot};
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rust_decimal::prelude::*;

/// Parameters of a geometric random walk.
#[derive(Debug, Clone, Copy)]
pub struct WalkParams {
    pub bars: usize,
    pub start_price: f64,
    /// Per-bar log drift.
    pub drift: f64,
    /// Per-bar log volatility.
    pub volatility: f64,
    pub seed: u64,
    pub timeframe: Timeframe,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            bars: 250,
            start_price: 100.0,
            drift: 0.0,
            volatility: 0.01,
            seed: 7,
            timeframe: Timeframe::D1,
        }
    }
}

/// The fixed epoch every fixture series starts from.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The snapshot timestamp matching a fixture series of `bars` bars.
pub fn snapshot_time(bars: usize, timeframe: Timeframe) -> DateTime<Utc> {
    epoch() + timeframe.bar_duration() * bars as i32
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default().round_dp(6)
}

/// Builds a bar series from a close path. Highs and lows straddle the
/// open/close range by `wick` (a fraction of price).
pub fn bars_from_closes(closes: &[f64], wick: f64, timeframe: Timeframe) -> Vec<Bar> {
    let start = epoch();
    let mut prev_close = closes.first().copied().unwrap_or_default();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = prev_close;
            prev_close = close;
            let high = open.max(close) * (1.0 + wick);
            let low = open.min(close) * (1.0 - wick);
            Bar {
                timestamp: start + timeframe.bar_duration() * i as i32,
                open: to_decimal(open),
                high: to_decimal(high),
                low: to_decimal(low),
                close: to_decimal(close),
                volume: to_decimal(1_000.0 + (i % 7) as f64 * 25.0),
            }
        })
        .collect()
}

/// A seeded geometric random walk.
pub fn random_walk(symbol: &str, asset_class: AssetClass, params: WalkParams) -> Instrument {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let Ok(normal) = Normal::new(params.drift, params.volatility.max(0.0)) else {
        return flat(symbol, asset_class, params.bars, params.start_price);
    };

    let mut price = params.start_price;
    let mut closes = Vec::with_capacity(params.bars);
    for _ in 0..params.bars {
        closes.push(price);
        price *= normal.sample(&mut rng).exp();
    }

    let wick = params.volatility * rng.gen_range(0.2..0.6);
    Instrument::new(symbol, asset_class, bars_from_closes(&closes, wick, params.timeframe))
}

/// A steady trend of `step` (fractional change per bar) with a small
/// deterministic wobble so indicators are not perfectly degenerate.
pub fn trending(symbol: &str, asset_class: AssetClass, bars: usize, start_price: f64, step: f64) -> Instrument {
    trending_on(symbol, asset_class, bars, start_price, step, Timeframe::D1)
}

pub fn trending_on(
    symbol: &str,
    asset_class: AssetClass,
    bars: usize,
    start_price: f64,
    step: f64,
    timeframe: Timeframe,
) -> Instrument {
    let closes: Vec<f64> = (0..bars)
        .map(|i| {
            let wobble = 1.0 + 0.0005 * ((i as f64) * 1.7).sin();
            start_price * (1.0 + step).powi(i as i32) * wobble
        })
        .collect();
    Instrument::new(symbol, asset_class, bars_from_closes(&closes, 0.002, timeframe))
}

/// A perfectly flat price series.
pub fn flat(symbol: &str, asset_class: AssetClass, bars: usize, price: f64) -> Instrument {
    let closes = vec![price; bars];
    Instrument::new(symbol, asset_class, bars_from_closes(&closes, 0.0, Timeframe::D1))
}

/// Wraps instruments into a snapshot stamped after the longest series.
pub fn snapshot(instruments: Vec<Instrument>) -> MarketSnapshot {
    let longest = instruments.iter().map(|i| i.bars.len()).max().unwrap_or(0);
    instruments
        .into_iter()
        .fold(MarketSnapshot::new(snapshot_time(longest, Timeframe::D1)), |snap, i| {
            snap.with_instrument(i)
        })
}

/// A calm four-asset market: one instrument per asset class.
pub fn calm_market(bars: usize) -> MarketSnapshot {
    let walk = |seed, start_price, volatility| WalkParams {
        bars,
        start_price,
        volatility,
        seed,
        ..WalkParams::default()
    };
    snapshot(vec![
        random_walk("EUR/USD", AssetClass::Forex, walk(11, 1.085, 0.004)),
        random_walk("BTC/USD", AssetClass::Crypto, walk(12, 68_500.0, 0.03)),
        random_walk("SPX", AssetClass::Index, walk(13, 5_200.0, 0.009)),
        random_walk("XAU/USD", AssetClass::Metal, walk(14, 2_350.0, 0.008)),
    ])
}
