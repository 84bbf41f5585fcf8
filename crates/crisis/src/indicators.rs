//! The individual stress indicators. Each one is normalized to [0, 1] on its
//! own and returns `None` when the snapshot does not carry enough data for it.

use analytics::{
    ReturnSeries, StatsError, correlation_from_covariance, covariance_from_columns,
    covariance_matrix, mean, rolling_std, z_score,
};
use configuration::{IndicatorWeights, MoveDirection, WatchRule};
use core_types::{Instrument, MacroReading};
use rust_decimal::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// The fixed set of indicators feeding the composite crisis score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Indicator {
    VolatilityStress,
    CorrelationBreakdown,
    LiquidityStress,
    ThresholdBreach,
    MacroDeviation,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Indicator::VolatilityStress,
        Indicator::CorrelationBreakdown,
        Indicator::LiquidityStress,
        Indicator::ThresholdBreach,
        Indicator::MacroDeviation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Indicator::VolatilityStress => "volatility_stress",
            Indicator::CorrelationBreakdown => "correlation_breakdown",
            Indicator::LiquidityStress => "liquidity_stress",
            Indicator::ThresholdBreach => "threshold_breach",
            Indicator::MacroDeviation => "macro_deviation",
        }
    }

    pub fn weight(&self, weights: &IndicatorWeights) -> f64 {
        match self {
            Indicator::VolatilityStress => weights.volatility_stress,
            Indicator::CorrelationBreakdown => weights.correlation_breakdown,
            Indicator::LiquidityStress => weights.liquidity_stress,
            Indicator::ThresholdBreach => weights.threshold_breach,
            Indicator::MacroDeviation => weights.macro_deviation,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mean of `scores`, or `None` when nothing was scored.
fn mean_score(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        None
    } else {
        Some(mean(scores).clamp(0.0, 1.0))
    }
}

/// Z-score of the latest rolling volatility against the earlier rolling
/// volatilities of the same instrument. Only rises in volatility count:
/// the z-score is clipped to `[0, z_cap]` and rescaled by `z_cap`.
pub fn volatility_stress(series: &[ReturnSeries], window: usize, z_cap: f64) -> Option<f64> {
    let scores: Vec<f64> = series
        .iter()
        .filter_map(|s| {
            let vols = rolling_std(&s.values, window);
            let (latest, history) = vols.split_last()?;
            let z = z_score(*latest, history)?;
            Some(z.clamp(0.0, z_cap) / z_cap)
        })
        .collect();
    mean_score(&scores)
}

/// Mean absolute change between the correlations of the most recent `window`
/// observations and the full-sample correlations, over every instrument pair.
///
/// `aligned` must share timestamps. Needs at least two series and more than
/// `window` joint observations.
pub fn correlation_breakdown(aligned: &[ReturnSeries], window: usize) -> Result<Option<f64>, StatsError> {
    let observations = aligned.first().map_or(0, ReturnSeries::len);
    if aligned.len() < 2 || observations <= window {
        return Ok(None);
    }

    let full = correlation_from_covariance(&covariance_matrix(aligned)?);
    let recent_columns: Vec<&[f64]> = aligned.iter().map(|s| s.tail(window)).collect();
    let recent = correlation_from_covariance(&covariance_from_columns(&recent_columns)?);

    let n = aligned.len();
    let mut shifts = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            shifts.push((recent[(i, j)] - full[(i, j)]).abs());
        }
    }
    Ok(mean_score(&shifts))
}

/// Relative bar range `(high - low) / close`, used as a bid/ask spread proxy.
fn relative_ranges(instrument: &Instrument) -> Vec<f64> {
    instrument
        .bars
        .iter()
        .filter(|b| b.close > Decimal::ZERO)
        .filter_map(|b| ((b.high - b.low) / b.close).to_f64())
        .collect()
}

/// Widening of recent bar ranges relative to their long-run average. A ratio
/// of 1 scores 0; `ratio_cap` or more scores 1.
pub fn liquidity_stress(instruments: &[&Instrument], window: usize, ratio_cap: f64) -> Option<f64> {
    let scores: Vec<f64> = instruments
        .iter()
        .filter_map(|instrument| {
            let ranges = relative_ranges(instrument);
            if ranges.len() <= window {
                return None;
            }
            let long_run = mean(&ranges);
            if !(long_run > 0.0) {
                return None;
            }
            let recent = mean(&ranges[ranges.len() - window..]);
            Some(((recent / long_run - 1.0) / (ratio_cap - 1.0)).clamp(0.0, 1.0))
        })
        .collect();
    mean_score(&scores)
}

/// Adverse move of a watched instrument over its lookback, as a fraction of
/// the rule threshold.
pub fn breach_score(instrument: &Instrument, rule: &WatchRule) -> Option<f64> {
    let closes = instrument.closes();
    if closes.len() <= rule.lookback {
        return None;
    }
    let last = *closes.last()?;
    let base = closes[closes.len() - 1 - rule.lookback];
    if !(base > 0.0) {
        return None;
    }
    let change = last / base - 1.0;
    let adverse = match rule.direction {
        MoveDirection::Drop => -change,
        MoveDirection::Rise => change,
    };
    Some((adverse / rule.threshold).clamp(0.0, 1.0))
}

/// Mean breach score over the watched instruments present in `instruments`.
pub fn threshold_breach(instruments: &BTreeMap<&str, &Instrument>, rules: &[WatchRule]) -> Option<f64> {
    let scores: Vec<f64> = rules
        .iter()
        .filter_map(|rule| {
            let instrument = instruments.get(rule.symbol.as_str())?;
            breach_score(instrument, rule)
        })
        .collect();
    mean_score(&scores)
}

/// Mean normalized deviation of the supplied macro readings.
pub fn macro_deviation(readings: &BTreeMap<String, MacroReading>) -> Option<f64> {
    let scores: Vec<f64> = readings
        .values()
        .filter_map(MacroReading::normalized_deviation)
        .collect();
    mean_score(&scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::align;
    use core_types::AssetClass;
    use core_types::fixtures::{WalkParams, bars_from_closes, flat, random_walk, trending};

    fn returns(instrument: &Instrument) -> ReturnSeries {
        ReturnSeries::from_bars(&instrument.symbol, &instrument.bars).unwrap()
    }

    #[test]
    fn volatility_spike_scores_high() {
        let mut closes: Vec<f64> = (0..80).map(|i| 100.0 * (1.0 + 0.001 * ((i as f64) * 0.9).sin())).collect();
        // The last ten bars swing by 5% each.
        for i in 0..10 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last * 1.05 } else { last * 0.95 });
        }
        let inst = Instrument::new(
            "SPX",
            AssetClass::Index,
            bars_from_closes(&closes, 0.001, core_types::Timeframe::D1),
        );
        let score = volatility_stress(&[returns(&inst)], 20, 3.0).unwrap();
        assert!(score > 0.9, "score was {score}");
    }

    #[test]
    fn flat_series_has_no_volatility_signal() {
        let inst = flat("EUR/USD", AssetClass::Forex, 60, 1.1);
        assert_eq!(volatility_stress(&[returns(&inst)], 20, 3.0), None);
    }

    #[test]
    fn correlation_needs_two_instruments() {
        let a = random_walk("A", AssetClass::Index, WalkParams::default());
        assert_eq!(correlation_breakdown(&[returns(&a)], 20).unwrap(), None);
    }

    #[test]
    fn correlation_breakdown_is_bounded() {
        let a = random_walk("A", AssetClass::Index, WalkParams { seed: 1, ..WalkParams::default() });
        let b = random_walk("B", AssetClass::Index, WalkParams { seed: 2, ..WalkParams::default() });
        let aligned = align(&[returns(&a), returns(&b)]);
        let score = correlation_breakdown(&aligned, 20).unwrap().unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn widening_ranges_raise_liquidity_stress() {
        let mut bars = bars_from_closes(&[100.0; 60], 0.001, core_types::Timeframe::D1);
        let wide = bars_from_closes(&[100.0; 10], 0.02, core_types::Timeframe::D1);
        let n = bars.len();
        for (bar, w) in bars[n - 10..].iter_mut().zip(wide) {
            bar.high = w.high;
            bar.low = w.low;
        }
        let inst = Instrument::new("XAU/USD", AssetClass::Metal, bars);
        let score = liquidity_stress(&[&inst], 10, 3.0).unwrap();
        assert!(score > 0.9, "score was {score}");

        let calm = flat("XAU/USD", AssetClass::Metal, 60, 2300.0);
        assert_eq!(liquidity_stress(&[&calm], 10, 3.0), None);
    }

    #[test]
    fn watched_drop_counts_only_in_adverse_direction() {
        let falling = trending("SPX", AssetClass::Index, 40, 5000.0, -0.01);
        let rule = WatchRule {
            symbol: "SPX".to_string(),
            lookback: 30,
            threshold: 0.15,
            direction: MoveDirection::Drop,
        };
        let score = breach_score(&falling, &rule).unwrap();
        assert!(score > 0.9, "score was {score}");

        let rising = trending("SPX", AssetClass::Index, 40, 5000.0, 0.01);
        assert_eq!(breach_score(&rising, &rule), Some(0.0));

        let short = trending("SPX", AssetClass::Index, 30, 5000.0, -0.01);
        assert_eq!(breach_score(&short, &rule), None);
    }

    #[test]
    fn macro_deviation_ignores_degenerate_readings() {
        let mut readings = BTreeMap::new();
        assert_eq!(macro_deviation(&readings), None);
        readings.insert("credit_spread".to_string(), MacroReading { value: 3.0, baseline: 1.0, scale: 4.0 });
        readings.insert("broken".to_string(), MacroReading { value: 3.0, baseline: 1.0, scale: 0.0 });
        assert_eq!(macro_deviation(&readings), Some(0.5));
    }
}
