use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1.0 for a buy, -1.0 for a sell. Used to move price levels in the
    /// trade's favorable direction.
    pub fn sign(&self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// The combined direction and order type of a trading signal, serialized the
/// way downstream consumers expect it (`"BUY_LIMIT"`, `"SELL_MARKET"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    BuyLimit,
    SellLimit,
    BuyMarket,
    SellMarket,
}

impl SignalType {
    pub fn new(side: OrderSide, order_type: OrderType) -> Self {
        match (side, order_type) {
            (OrderSide::Buy, OrderType::Limit) => SignalType::BuyLimit,
            (OrderSide::Sell, OrderType::Limit) => SignalType::SellLimit,
            (OrderSide::Buy, OrderType::Market) => SignalType::BuyMarket,
            (OrderSide::Sell, OrderType::Market) => SignalType::SellMarket,
        }
    }

    pub fn side(&self) -> OrderSide {
        match self {
            SignalType::BuyLimit | SignalType::BuyMarket => OrderSide::Buy,
            SignalType::SellLimit | SignalType::SellMarket => OrderSide::Sell,
        }
    }

    pub fn order_type(&self) -> OrderType {
        match self {
            SignalType::BuyLimit | SignalType::SellLimit => OrderType::Limit,
            SignalType::BuyMarket | SignalType::SellMarket => OrderType::Market,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    Forex,
    Crypto,
    Index,
    Metal,
}

/// The sampling interval of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    M15,
    H4,
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::M15, Timeframe::H4, Timeframe::D1];

    /// The length of one bar.
    pub fn bar_duration(&self) -> Duration {
        match self {
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
        }
    }

    /// How long a signal derived from this timeframe stays actionable.
    pub fn signal_validity(&self) -> Duration {
        match self {
            Timeframe::M15 => Duration::hours(4),
            Timeframe::H4 => Duration::days(3),
            Timeframe::D1 => Duration::days(5),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::M15 => "M15",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        };
        f.write_str(s)
    }
}

/// The fused verdict of one analysis cycle, ordered from calm to crisis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketCondition {
    Normal,
    ModerateRisk,
    HighRisk,
    Crisis,
}

impl fmt::Display for MarketCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketCondition::Normal => "NORMAL",
            MarketCondition::ModerateRisk => "MODERATE_RISK",
            MarketCondition::HighRisk => "HIGH_RISK",
            MarketCondition::Crisis => "CRISIS",
        };
        f.write_str(s)
    }
}

/// Escalation level attached to a crisis report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Normal,
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    pub fn from_score(crisis_score: f64) -> Self {
        if crisis_score >= 0.7 {
            AlertLevel::Critical
        } else if crisis_score >= 0.5 {
            AlertLevel::High
        } else if crisis_score >= 0.3 {
            AlertLevel::Medium
        } else if crisis_score >= 0.1 {
            AlertLevel::Low
        } else {
            AlertLevel::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStrength {
    Weak,
    Medium,
    Strong,
}

impl SignalStrength {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            SignalStrength::Strong
        } else if confidence >= 0.6 {
            SignalStrength::Medium
        } else {
            SignalStrength::Weak
        }
    }
}

/// Which risk model produced a `RiskAssessment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationMethod {
    /// Correlated normal innovations through the Cholesky factor of the covariance matrix.
    Parametric,
    /// Bootstrap resampling of observed joint return vectors.
    Historical,
}

/// The three independent analyzers fanned out by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    Crisis,
    MonteCarlo,
    Signals,
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalyzerKind::Crisis => "crisis",
            AnalyzerKind::MonteCarlo => "monte_carlo",
            AnalyzerKind::Signals => "signals",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_type_round_trips_side_and_order_type() {
        for side in [OrderSide::Buy, OrderSide::Sell] {
            for order_type in [OrderType::Limit, OrderType::Market] {
                let kind = SignalType::new(side, order_type);
                assert_eq!(kind.side(), side);
                assert_eq!(kind.order_type(), order_type);
            }
        }
    }

    #[test]
    fn signal_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&SignalType::BuyLimit).unwrap();
        assert_eq!(json, "\"BUY_LIMIT\"");
        let json = serde_json::to_string(&MarketCondition::ModerateRisk).unwrap();
        assert_eq!(json, "\"MODERATE_RISK\"");
    }

    #[test]
    fn side_sign_points_to_favorable_direction() {
        assert_eq!(OrderSide::Buy.sign(), 1.0);
        assert_eq!(OrderSide::Sell.sign(), -1.0);
    }

    #[test]
    fn alert_level_boundaries() {
        assert_eq!(AlertLevel::from_score(0.0), AlertLevel::Normal);
        assert_eq!(AlertLevel::from_score(0.1), AlertLevel::Low);
        assert_eq!(AlertLevel::from_score(0.3), AlertLevel::Medium);
        assert_eq!(AlertLevel::from_score(0.5), AlertLevel::High);
        assert_eq!(AlertLevel::from_score(0.95), AlertLevel::Critical);
    }

    #[test]
    fn market_condition_orders_by_severity() {
        assert!(MarketCondition::Normal < MarketCondition::ModerateRisk);
        assert!(MarketCondition::HighRisk < MarketCondition::Crisis);
    }
}
