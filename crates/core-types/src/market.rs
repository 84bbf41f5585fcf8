use crate::enums::{AssetClass, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Decimal,
}

impl Bar {
    pub fn close_f64(&self) -> Option<f64> {
        self.close.to_f64()
    }
}

/// One tradable instrument as captured for a single analysis cycle.
///
/// `bars` is the primary (daily) series used by the crisis analyzer and the
/// Monte Carlo engine. `frames` optionally carries intraday series for the
/// signal generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub bars: Vec<Bar>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub frames: BTreeMap<Timeframe, Vec<Bar>>,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, asset_class: AssetClass, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            asset_class,
            bars,
            frames: BTreeMap::new(),
        }
    }

    /// Attaches an additional timeframe series.
    pub fn with_frame(mut self, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.frames.insert(timeframe, bars);
        self
    }

    /// Resolves the series for `timeframe`. D1 falls back to the primary series.
    pub fn series(&self, timeframe: Timeframe) -> Option<&[Bar]> {
        match self.frames.get(&timeframe) {
            Some(bars) => Some(bars.as_slice()),
            None if timeframe == Timeframe::D1 => Some(self.bars.as_slice()),
            None => None,
        }
    }

    /// Closing prices of the primary series as `f64`. Bars whose close cannot
    /// be represented are dropped.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().filter_map(Bar::close_f64).collect()
    }

    pub fn last_close(&self) -> Option<Decimal> {
        self.bars.last().map(|b| b.close)
    }
}

/// An exogenous macro reading, e.g. a credit spread, expressed against its
/// baseline. `scale` is the deviation considered fully stressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroReading {
    pub value: f64,
    pub baseline: f64,
    pub scale: f64,
}

impl MacroReading {
    /// Absolute deviation from baseline, normalized to [0, 1].
    /// Returns `None` for a non-positive or non-finite scale.
    pub fn normalized_deviation(&self) -> Option<f64> {
        if !(self.scale.is_finite() && self.scale > 0.0) || !self.value.is_finite() {
            return None;
        }
        Some(((self.value - self.baseline).abs() / self.scale).clamp(0.0, 1.0))
    }
}

/// The immutable input of one analysis cycle, as supplied by the market-data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    pub instruments: BTreeMap<String, Instrument>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub macro_indicators: BTreeMap<String, MacroReading>,
}

impl MarketSnapshot {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            instruments: BTreeMap::new(),
            macro_indicators: BTreeMap::new(),
        }
    }

    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instruments.insert(instrument.symbol.clone(), instrument);
        self
    }

    pub fn with_macro(mut self, name: impl Into<String>, reading: MacroReading) -> Self {
        self.macro_indicators.insert(name.into(), reading);
        self
    }

    pub fn instrument(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.get(symbol)
    }
}
