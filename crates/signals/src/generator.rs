use crate::error::SignalError;
use crate::indicators::{self, SignalScore};
use chrono::{DateTime, Utc};
use configuration::SignalSettings;
use core_types::{
    Instrument, MarketSnapshot, OrderSide, SignalStrength, SignalType, Timeframe, TradingSignal,
};
use rust_decimal::prelude::*;

/// Emits directional trading signals from multi-timeframe indicator data.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    settings: SignalSettings,
}

impl SignalGenerator {
    /// Creates a new `SignalGenerator`, validating the settings it is given.
    pub fn new(settings: SignalSettings) -> Result<Self, SignalError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Evaluates every instrument on every configured timeframe.
    ///
    /// An instrument that cannot be evaluated is logged and skipped; it never
    /// aborts the batch. The batch fails only when every series that was
    /// present failed. Output is ordered by confidence, highest first, and
    /// capped at `max_signals`.
    pub fn generate(&self, snapshot: &MarketSnapshot) -> Result<Vec<TradingSignal>, SignalError> {
        let mut signals = Vec::new();
        let mut attempted = 0usize;
        let mut failed = 0usize;

        for instrument in snapshot.instruments.values() {
            for &timeframe in &self.settings.timeframes {
                if instrument.series(timeframe).is_none() {
                    continue;
                }
                attempted += 1;
                match self.evaluate(instrument, timeframe, snapshot.timestamp) {
                    Ok(Some(signal)) => signals.push(signal),
                    Ok(None) => {}
                    Err(error @ SignalError::InsufficientData { .. }) => {
                        failed += 1;
                        tracing::debug!(%error, "Skipping instrument.");
                    }
                    Err(error) => {
                        failed += 1;
                        tracing::warn!(symbol = %instrument.symbol, %timeframe, %error, "Skipping instrument.");
                    }
                }
            }
        }

        if attempted > 0 && failed == attempted {
            return Err(SignalError::NoUsableSeries { attempted });
        }

        signals.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.symbol.cmp(&b.symbol))
                .then_with(|| a.timeframe.cmp(&b.timeframe))
        });
        signals.truncate(self.settings.max_signals);

        tracing::info!(count = signals.len(), skipped = failed, "Signal generation complete.");
        Ok(signals)
    }

    /// Evaluates one instrument on one timeframe.
    ///
    /// Returns `Ok(None)` when the series is absent, the score stays inside the
    /// thresholds, or the confidence is below the configured minimum.
    pub fn evaluate(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<Option<TradingSignal>, SignalError> {
        let settings = &self.settings;
        let Some(bars) = instrument.series(timeframe) else {
            return Ok(None);
        };

        let required = settings.warmup_bars();
        if bars.len() < required {
            return Err(SignalError::InsufficientData {
                symbol: instrument.symbol.clone(),
                timeframe,
                required,
                actual: bars.len(),
            });
        }

        // --- 1. Directional score ---
        let reading = indicators::read(bars, settings)?;
        let Some(score) = SignalScore::from_reading(&reading) else {
            tracing::debug!(symbol = %instrument.symbol, %timeframe, "Zero ATR, no signal.");
            return Ok(None);
        };
        let composite = score.composite(&settings.weights);

        let side = if composite > settings.buy_threshold {
            OrderSide::Buy
        } else if composite < settings.sell_threshold {
            OrderSide::Sell
        } else {
            return Ok(None);
        };

        let confidence = composite.abs().clamp(0.0, 1.0);
        if confidence < settings.min_confidence {
            tracing::debug!(
                symbol = %instrument.symbol,
                %timeframe,
                confidence,
                "Candidate below minimum confidence, discarded."
            );
            return Ok(None);
        }

        // --- 2. Price levels ---
        let Some(last) = bars.last() else {
            return Ok(None);
        };
        let Some(atr) = Decimal::from_f64(reading.atr) else {
            return Err(SignalError::IndicatorError(format!("ATR {} is not representable", reading.atr)));
        };

        let dp = settings.price_precision;
        let entry = last.close.round_dp(dp);
        // A positive multiple moves in the trade's favor, a negative one against it.
        let level = |multiple: f64| -> Result<Decimal, SignalError> {
            Decimal::from_f64(side.sign() * multiple)
                .map(|m| (entry + atr * m).round_dp(dp))
                .ok_or_else(|| SignalError::IndicatorError(format!("multiple {multiple} is not representable")))
        };

        let stop_loss = level(-settings.stop_atr_multiple)?;
        let take_profits = settings
            .take_profit_atr_multiples
            .iter()
            .map(|m| level(*m))
            .collect::<Result<Vec<Decimal>, SignalError>>()?;

        if !levels_are_ordered(side, entry, stop_loss, &take_profits) {
            tracing::debug!(
                symbol = %instrument.symbol,
                %timeframe,
                "Signal levels collapse at the configured precision, discarded."
            );
            return Ok(None);
        }

        // --- 3. Assemble ---
        let risk = (entry - stop_loss).abs();
        let reward = take_profits.iter().map(|tp| (*tp - entry).abs()).sum::<Decimal>()
            / Decimal::from(take_profits.len());
        let risk_reward_ratio = (reward / risk).round_dp(2).to_f64().unwrap_or_default();

        let signal = TradingSignal {
            symbol: instrument.symbol.clone(),
            asset_class: instrument.asset_class,
            signal_type: SignalType::new(side, settings.order_types.for_timeframe(timeframe)),
            entry,
            stop_loss,
            take_profits,
            confidence,
            strength: SignalStrength::from_confidence(confidence),
            risk_reward_ratio,
            timeframe,
            generated_at: now,
            expires_at: now + timeframe.signal_validity(),
        };
        tracing::debug!(?signal, "Generated signal.");
        Ok(Some(signal))
    }
}

/// Stop on the adverse side of entry, take-profits strictly moving away from
/// entry on the favorable side.
fn levels_are_ordered(side: OrderSide, entry: Decimal, stop_loss: Decimal, take_profits: &[Decimal]) -> bool {
    let mut ladder = Vec::with_capacity(take_profits.len() + 2);
    ladder.push(stop_loss);
    ladder.push(entry);
    ladder.extend_from_slice(take_profits);
    match side {
        OrderSide::Buy => ladder.windows(2).all(|w| w[0] < w[1]),
        OrderSide::Sell => ladder.windows(2).all(|w| w[0] > w[1]),
    }
}
