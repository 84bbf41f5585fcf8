use crate::distribution::std_dev;
use crate::error::StatsError;
use chrono::{DateTime, Utc};
use core_types::Bar;
use std::collections::BTreeSet;

/// Log returns of one instrument, stamped with the timestamp of the bar that closes each period.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub symbol: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl ReturnSeries {
    /// Computes log returns from the closes of `bars`.
    pub fn from_bars(symbol: impl Into<String>, bars: &[Bar]) -> Result<Self, StatsError> {
        let symbol = symbol.into();
        let closes = bars
            .iter()
            .map(|b| {
                b.close_f64().ok_or_else(|| {
                    StatsError::InvalidInput(format!("{symbol}: close {} is not representable", b.close))
                })
            })
            .collect::<Result<Vec<f64>, StatsError>>()?;

        let values = log_returns(&closes)?;
        let timestamps = bars.iter().skip(1).map(|b| b.timestamp).collect();

        Ok(Self {
            symbol,
            timestamps,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The most recent `n` returns (or all of them if fewer exist).
    pub fn tail(&self, n: usize) -> &[f64] {
        &self.values[self.values.len().saturating_sub(n)..]
    }

    /// Keeps only the observations whose timestamp is in `keep`.
    fn restricted_to(&self, keep: &BTreeSet<DateTime<Utc>>) -> Self {
        let (timestamps, values) = self
            .timestamps
            .iter()
            .zip(&self.values)
            .filter(|(t, _)| keep.contains(t))
            .map(|(t, v)| (*t, *v))
            .unzip();
        Self {
            symbol: self.symbol.clone(),
            timestamps,
            values,
        }
    }
}

/// Log returns `ln(p[t] / p[t-1])` of a price series.
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>, StatsError> {
    if prices.len() < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: prices.len(),
        });
    }
    if let Some(bad) = prices.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
        return Err(StatsError::InvalidInput(format!(
            "prices must be positive and finite, got {bad}"
        )));
    }
    Ok(prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect())
}

/// Restricts every series to the timestamps they all share.
pub fn align(series: &[ReturnSeries]) -> Vec<ReturnSeries> {
    let Some(first) = series.first() else {
        return Vec::new();
    };
    let common = series.iter().skip(1).fold(
        first.timestamps.iter().copied().collect::<BTreeSet<_>>(),
        |acc, s| {
            let theirs: BTreeSet<_> = s.timestamps.iter().copied().collect();
            acc.intersection(&theirs).copied().collect()
        },
    );
    series.iter().map(|s| s.restricted_to(&common)).collect()
}

/// Sample standard deviation of each full window of `window` values.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    if window < 2 || values.len() < window {
        return Vec::new();
    }
    values.windows(window).map(std_dev).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::fixtures::{WalkParams, random_walk};
    use core_types::AssetClass;

    #[test]
    fn log_returns_of_doubling_prices() {
        let r = log_returns(&[1.0, 2.0, 4.0]).unwrap();
        assert_eq!(r.len(), 2);
        assert!((r[0] - std::f64::consts::LN_2).abs() < 1e-12);
        assert!((r[1] - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn single_observation_is_insufficient() {
        assert_eq!(
            log_returns(&[1.0]),
            Err(StatsError::InsufficientData { required: 2, actual: 1 })
        );
    }

    #[test]
    fn non_positive_price_is_rejected() {
        assert!(matches!(log_returns(&[1.0, 0.0]), Err(StatsError::InvalidInput(_))));
    }

    #[test]
    fn series_from_bars_skips_first_timestamp() {
        let inst = random_walk("A", AssetClass::Index, WalkParams { bars: 10, ..WalkParams::default() });
        let series = ReturnSeries::from_bars("A", &inst.bars).unwrap();
        assert_eq!(series.len(), 9);
        assert_eq!(series.timestamps[0], inst.bars[1].timestamp);
        assert_eq!(series.tail(3).len(), 3);
        assert_eq!(series.tail(100).len(), 9);
    }

    #[test]
    fn align_intersects_timestamps() {
        let long = random_walk("A", AssetClass::Index, WalkParams { bars: 20, ..WalkParams::default() });
        let short = random_walk("B", AssetClass::Index, WalkParams { bars: 12, seed: 9, ..WalkParams::default() });
        let a = ReturnSeries::from_bars("A", &long.bars).unwrap();
        let b = ReturnSeries::from_bars("B", &short.bars).unwrap();

        let aligned = align(&[a, b]);
        assert_eq!(aligned[0].len(), 11);
        assert_eq!(aligned[0].timestamps, aligned[1].timestamps);
    }

    #[test]
    fn rolling_std_window_count() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = rolling_std(&values, 3);
        assert_eq!(out.len(), 3);
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!(rolling_std(&values, 6).is_empty());
    }
}
