use crate::error::CoreError;
use crate::market::MarketSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Portfolio weights must sum to 1.0 within this tolerance.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// A single weighted holding. Owned by the caller; the engines only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPosition {
    pub symbol: String,
    pub weight: f64,
    pub reference_price: Decimal,
}

/// A validated, long-only set of positions whose weights sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    positions: Vec<PortfolioPosition>,
}

impl Portfolio {
    /// Validates a list of positions.
    pub fn new(positions: Vec<PortfolioPosition>) -> Result<Self, CoreError> {
        if positions.is_empty() {
            return Err(CoreError::Validation(
                "portfolio must contain at least one position".to_string(),
            ));
        }

        let mut seen = std::collections::BTreeSet::new();
        for position in &positions {
            if !position.weight.is_finite() {
                return Err(CoreError::Validation(format!(
                    "weight for {} must be a finite number",
                    position.symbol
                )));
            }
            if position.weight < 0.0 {
                return Err(CoreError::Validation(format!(
                    "weight for {} must not be negative (got {})",
                    position.symbol, position.weight
                )));
            }
            if !seen.insert(position.symbol.as_str()) {
                return Err(CoreError::Validation(format!(
                    "symbol {} appears more than once",
                    position.symbol
                )));
            }
        }

        let total: f64 = positions.iter().map(|p| p.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(CoreError::Validation(format!(
                "portfolio weights must sum to 1.0 (±{WEIGHT_TOLERANCE}), got {total}"
            )));
        }

        Ok(Self { positions })
    }

    /// Builds a portfolio from a symbol→weight map, taking each reference price
    /// from the latest close in `snapshot`.
    pub fn from_weights(
        weights: &BTreeMap<String, f64>,
        snapshot: &MarketSnapshot,
    ) -> Result<Self, CoreError> {
        let positions = weights
            .iter()
            .map(|(symbol, &weight)| {
                let instrument = snapshot.instrument(symbol).ok_or_else(|| {
                    CoreError::Validation(format!("symbol {symbol} is not present in the snapshot"))
                })?;
                let reference_price = instrument.last_close().ok_or_else(|| {
                    CoreError::Validation(format!("symbol {symbol} has no price observations"))
                })?;
                Ok(PortfolioPosition {
                    symbol: symbol.clone(),
                    weight,
                    reference_price,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Self::new(positions)
    }

    /// An equally weighted portfolio over every instrument in the snapshot that
    /// has at least one return, i.e. two or more bars.
    pub fn equal_weight(snapshot: &MarketSnapshot) -> Result<Self, CoreError> {
        let symbols: Vec<&str> = snapshot
            .instruments
            .values()
            .filter(|i| i.bars.len() >= 2)
            .map(|i| i.symbol.as_str())
            .collect();

        if symbols.is_empty() {
            return Err(CoreError::Validation(
                "snapshot contains no priced instruments".to_string(),
            ));
        }

        let weight = 1.0 / symbols.len() as f64;
        let weights = symbols
            .into_iter()
            .map(|s| (s.to_string(), weight))
            .collect::<BTreeMap<_, _>>();
        Self::from_weights(&weights, snapshot)
    }

    pub fn positions(&self) -> &[PortfolioPosition] {
        &self.positions
    }

    pub fn weights(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.weight).collect()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::AssetClass;
    use crate::market::{Bar, Instrument};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn instrument(symbol: &str, bars: usize) -> Instrument {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = (0..bars)
            .map(|i| Bar {
                timestamp: start + Duration::days(i as i64),
                open: dec!(100),
                high: dec!(101),
                low: dec!(99),
                close: dec!(100),
                volume: dec!(0),
            })
            .collect();
        Instrument::new(symbol, AssetClass::Index, bars)
    }

    fn position(symbol: &str, weight: f64) -> PortfolioPosition {
        PortfolioPosition {
            symbol: symbol.to_string(),
            weight,
            reference_price: dec!(100),
        }
    }

    #[test]
    fn accepts_weights_within_tolerance() {
        let portfolio = Portfolio::new(vec![position("A", 0.6), position("B", 0.4000000001)]);
        assert!(portfolio.is_ok());
        assert_eq!(portfolio.unwrap().len(), 2);
    }

    #[test]
    fn rejects_weights_outside_tolerance() {
        let err = Portfolio::new(vec![position("A", 0.6), position("B", 0.41)]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref msg) if msg.contains("sum to 1.0")));
    }

    #[test]
    fn rejects_negative_and_duplicate_positions() {
        assert!(Portfolio::new(vec![position("A", 1.5), position("B", -0.5)]).is_err());
        assert!(Portfolio::new(vec![position("A", 0.5), position("A", 0.5)]).is_err());
        assert!(Portfolio::new(vec![]).is_err());
        assert!(Portfolio::new(vec![position("A", f64::NAN)]).is_err());
    }

    #[test]
    fn equal_weight_skips_instruments_without_a_return() {
        let snapshot = MarketSnapshot::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
            .with_instrument(instrument("SPX", 60))
            .with_instrument(instrument("XAU/USD", 60))
            .with_instrument(instrument("GER30", 1));

        let portfolio = Portfolio::equal_weight(&snapshot).unwrap();
        let symbols: Vec<&str> = portfolio.positions().iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["SPX", "XAU/USD"]);
        assert_eq!(portfolio.weights(), vec![0.5, 0.5]);
    }

    #[test]
    fn equal_weight_needs_a_priced_history() {
        let snapshot = MarketSnapshot::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
            .with_instrument(instrument("GER30", 1));
        assert!(matches!(Portfolio::equal_weight(&snapshot), Err(CoreError::Validation(_))));
    }
}
