use crate::error::SignalError;
use configuration::{SignalSettings, SignalWeights};
use core_types::Bar;
use rust_decimal::prelude::*;
use ta::indicators::{
    AverageTrueRange, ExponentialMovingAverage as Ema, RelativeStrengthIndex as Rsi,
    SimpleMovingAverage as Sma,
};
use ta::{DataItem, Next};

/// Indicator values after feeding a whole bar series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorReading {
    pub close: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub atr: f64,
    pub sma: f64,
}

/// The three normalized components of the directional score, each in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalScore {
    pub trend: f64,
    pub momentum: f64,
    pub volatility: f64,
}

impl SignalScore {
    /// Scores a reading. `None` when the ATR is zero and no move can be scaled.
    pub fn from_reading(reading: &IndicatorReading) -> Option<Self> {
        if !(reading.atr.is_finite() && reading.atr > 0.0) {
            return None;
        }
        // RSI is undefined (0/0) when closes never changed.
        let momentum = if reading.rsi.is_finite() {
            ((reading.rsi - 50.0) / 50.0).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Some(Self {
            trend: ((reading.ema_fast - reading.ema_slow) / reading.atr).tanh(),
            momentum,
            volatility: ((reading.close - reading.sma) / reading.atr).tanh(),
        })
    }

    /// Weighted composite in [-1, 1].
    pub fn composite(&self, weights: &SignalWeights) -> f64 {
        (weights.trend * self.trend + weights.momentum * self.momentum + weights.volatility * self.volatility)
            .clamp(-1.0, 1.0)
    }
}

fn to_f64(value: Decimal, field: &str) -> Result<f64, SignalError> {
    value
        .to_f64()
        .ok_or_else(|| SignalError::IndicatorError(format!("failed to convert {field} {value} to f64")))
}

fn data_item(bar: &Bar) -> Result<DataItem, SignalError> {
    DataItem::builder()
        .open(to_f64(bar.open, "open")?)
        .high(to_f64(bar.high, "high")?)
        .low(to_f64(bar.low, "low")?)
        .close(to_f64(bar.close, "close")?)
        .volume(to_f64(bar.volume, "volume")?)
        .build()
        .map_err(|e| SignalError::IndicatorError(format!("malformed bar at {}: {e:?}", bar.timestamp)))
}

fn indicator_error(name: &str, e: ta::errors::TaError) -> SignalError {
    SignalError::IndicatorError(format!("failed to initialize {name}: {e:?}"))
}

/// Feeds every bar through fresh indicators and returns their final values.
/// The caller is responsible for warm-up length checks.
pub fn read(bars: &[Bar], settings: &SignalSettings) -> Result<IndicatorReading, SignalError> {
    let mut ema_fast = Ema::new(settings.ema_fast_period).map_err(|e| indicator_error("fast EMA", e))?;
    let mut ema_slow = Ema::new(settings.ema_slow_period).map_err(|e| indicator_error("slow EMA", e))?;
    let mut rsi = Rsi::new(settings.rsi_period).map_err(|e| indicator_error("RSI", e))?;
    let mut atr = AverageTrueRange::new(settings.atr_period).map_err(|e| indicator_error("ATR", e))?;
    let mut sma = Sma::new(settings.breakout_period).map_err(|e| indicator_error("SMA", e))?;

    let mut reading = None;
    for bar in bars {
        let item = data_item(bar)?;
        let close = to_f64(bar.close, "close")?;
        reading = Some(IndicatorReading {
            close,
            ema_fast: ema_fast.next(close),
            ema_slow: ema_slow.next(close),
            rsi: rsi.next(close),
            atr: atr.next(&item),
            sma: sma.next(close),
        });
    }

    reading.ok_or_else(|| SignalError::IndicatorError("empty bar series".to_string()))
}
