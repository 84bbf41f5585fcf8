use crate::error::CrisisError;
use crate::indicators::{self, Indicator};
use analytics::{ReturnSeries, StatsError, align};
use configuration::CrisisSettings;
use core_types::{AlertLevel, CrisisReport, Instrument, MarketSnapshot};
use std::collections::BTreeMap;

/// Turns a market snapshot into a composite [0, 1] crisis score.
#[derive(Debug, Clone)]
pub struct CrisisAnalyzer {
    settings: CrisisSettings,
}

impl CrisisAnalyzer {
    /// Creates a new `CrisisAnalyzer`, validating the settings it is given.
    pub fn new(settings: CrisisSettings) -> Result<Self, CrisisError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Computes every indicator the snapshot supports and combines them.
    ///
    /// Instruments with fewer than `min_observations` bars are left out of
    /// every indicator and listed in `excluded_instruments`. Indicators that
    /// cannot be computed are dropped and the remaining weights renormalized.
    pub fn analyze(&self, snapshot: &MarketSnapshot) -> Result<CrisisReport, CrisisError> {
        let settings = &self.settings;

        // --- 1. Partition instruments by data sufficiency ---
        let mut eligible: BTreeMap<&str, &Instrument> = BTreeMap::new();
        let mut series: Vec<ReturnSeries> = Vec::new();
        let mut excluded: Vec<String> = Vec::new();

        for (symbol, instrument) in &snapshot.instruments {
            if instrument.bars.len() < settings.min_observations {
                tracing::debug!(
                    symbol = %symbol,
                    bars = instrument.bars.len(),
                    required = settings.min_observations,
                    "Excluding instrument from crisis indicators: not enough bars."
                );
                excluded.push(symbol.clone());
                continue;
            }
            match ReturnSeries::from_bars(symbol.as_str(), &instrument.bars) {
                Ok(returns) => {
                    eligible.insert(symbol.as_str(), instrument);
                    series.push(returns);
                }
                Err(error) => {
                    tracing::warn!(symbol = %symbol, %error, "Excluding instrument from crisis indicators.");
                    excluded.push(symbol.clone());
                }
            }
        }

        // --- 2. Compute each indicator independently ---
        let instruments: Vec<&Instrument> = eligible.values().copied().collect();
        let mut values: BTreeMap<Indicator, f64> = BTreeMap::new();
        for indicator in Indicator::ALL {
            let value = match indicator {
                Indicator::VolatilityStress => {
                    indicators::volatility_stress(&series, settings.window, settings.z_score_cap)
                }
                Indicator::CorrelationBreakdown => {
                    match indicators::correlation_breakdown(&align(&series), settings.window) {
                        Ok(value) => value,
                        Err(StatsError::InsufficientData { .. }) => None,
                        Err(error) => return Err(error.into()),
                    }
                }
                Indicator::LiquidityStress => indicators::liquidity_stress(
                    &instruments,
                    settings.window,
                    settings.liquidity_ratio_cap,
                ),
                Indicator::ThresholdBreach => {
                    indicators::threshold_breach(&eligible, &settings.watchlist)
                }
                Indicator::MacroDeviation => indicators::macro_deviation(&snapshot.macro_indicators),
            };
            match value {
                Some(v) => {
                    values.insert(indicator, v);
                }
                None => tracing::debug!(%indicator, "Crisis indicator not computable for this snapshot."),
            }
        }

        if values.len() < settings.min_indicators {
            return Err(CrisisError::InsufficientIndicators {
                computed: values.len(),
                required: settings.min_indicators,
            });
        }

        // --- 3. Weighted composite, renormalized over what was computed ---
        let weight_total: f64 = values.keys().map(|i| i.weight(&settings.weights)).sum();
        let contributions: Vec<(Indicator, f64)> = values
            .iter()
            .map(|(indicator, value)| (*indicator, indicator.weight(&settings.weights) * value))
            .collect();

        let crisis_score = if weight_total > 0.0 {
            (contributions.iter().map(|(_, c)| c).sum::<f64>() / weight_total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let dominant_indicator = contributions
            .iter()
            .filter(|(_, c)| *c > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(indicator, _)| indicator.name().to_string());

        let alert_level = AlertLevel::from_score(crisis_score);
        tracing::info!(
            crisis_score,
            ?alert_level,
            indicators = values.len(),
            excluded = excluded.len(),
            "Crisis analysis complete."
        );

        Ok(CrisisReport {
            crisis_score,
            indicators: values
                .into_iter()
                .map(|(indicator, value)| (indicator.name().to_string(), value))
                .collect(),
            alert_level,
            dominant_indicator,
            excluded_instruments: excluded,
            timestamp: snapshot.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::fixtures::{calm_market, flat};
    use core_types::{AssetClass, MacroReading};

    fn analyzer() -> CrisisAnalyzer {
        CrisisAnalyzer::new(CrisisSettings::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_weights() {
        let mut settings = CrisisSettings::default();
        settings.weights.volatility_stress = 0.9;
        assert!(matches!(CrisisAnalyzer::new(settings), Err(CrisisError::Config(_))));
    }

    #[test]
    fn calm_market_reports_every_price_indicator() {
        let report = analyzer().analyze(&calm_market(250)).unwrap();
        for name in ["volatility_stress", "correlation_breakdown", "liquidity_stress", "threshold_breach"] {
            assert!(report.indicators.contains_key(name), "missing {name}");
        }
        assert!(!report.indicators.contains_key("macro_deviation"));
        assert!((0.0..=1.0).contains(&report.crisis_score));
        assert!(report.excluded_instruments.is_empty());
    }

    #[test]
    fn empty_snapshot_is_insufficient() {
        let snapshot = MarketSnapshot::new(core_types::fixtures::epoch());
        let err = analyzer().analyze(&snapshot).unwrap_err();
        assert!(matches!(
            err,
            CrisisError::InsufficientIndicators { computed: 0, required: 2 }
        ));
    }

    #[test]
    fn macro_only_snapshot_renormalizes_to_macro_value() {
        let mut settings = CrisisSettings::default();
        settings.min_indicators = 1;
        let snapshot = MarketSnapshot::new(core_types::fixtures::epoch())
            .with_macro("credit_spread", MacroReading { value: 2.0, baseline: 1.0, scale: 4.0 });

        let report = CrisisAnalyzer::new(settings).unwrap().analyze(&snapshot).unwrap();
        assert!((report.crisis_score - 0.25).abs() < 1e-12);
        assert_eq!(report.dominant_indicator.as_deref(), Some("macro_deviation"));
        assert_eq!(report.alert_level, AlertLevel::Low);
    }

    #[test]
    fn short_history_is_excluded_not_fatal() {
        let snapshot = calm_market(250).with_instrument(flat("GER30", AssetClass::Index, 1, 18_000.0));
        let report = analyzer().analyze(&snapshot).unwrap();
        assert_eq!(report.excluded_instruments, vec!["GER30".to_string()]);
        assert!(report.indicators.len() >= 4);
    }
}
