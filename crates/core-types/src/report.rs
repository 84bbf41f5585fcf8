use crate::enums::{
    AlertLevel, AnalyzerKind, AssetClass, MarketCondition, SignalStrength, SignalType,
    SimulationMethod, Timeframe,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The output of the crisis analyzer for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisReport {
    /// Weighted composite of the computable indicators, in [0, 1].
    pub crisis_score: f64,
    /// Indicator name → normalized [0, 1] value. Only computable indicators appear.
    pub indicators: BTreeMap<String, f64>,
    pub alert_level: AlertLevel,
    /// The indicator with the largest weighted contribution to the score.
    pub dominant_indicator: Option<String>,
    /// Instruments left out of every indicator for lack of data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_instruments: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Value-at-Risk and expected shortfall at a single confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarEstimate {
    pub confidence: f64,
    /// Signed return fraction; more negative means a larger loss.
    pub var: f64,
    pub expected_shortfall: f64,
}

/// The output of the Monte Carlo engine for one portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    // I. Headline risk measures
    pub var_95: f64,
    pub var_99: f64,
    /// Mean of the outcomes at or below `var_95`.
    pub expected_shortfall: f64,

    // II. Simulation parameters
    pub simulation_count: usize,
    pub horizon_days: usize,

    // III. Model diagnostics
    pub method: SimulationMethod,
    /// One entry per configured confidence level, ascending.
    pub levels: Vec<VarEstimate>,
    /// Ridge added to the covariance diagonal, 0.0 when none was needed.
    pub ridge_applied: f64,
    pub observations: usize,
    /// The seed that reproduces this result.
    pub seed: u64,
}

impl RiskAssessment {
    pub fn level(&self, confidence: f64) -> Option<&VarEstimate> {
        self.levels
            .iter()
            .find(|l| (l.confidence - confidence).abs() < 1e-9)
    }
}

/// A directional trade idea produced by the signal generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub symbol: String,
    pub asset_class: AssetClass,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    /// Strictly monotonic away from `entry` in the trade's favorable direction.
    pub take_profits: Vec<Decimal>,
    pub confidence: f64,
    pub strength: SignalStrength,
    pub risk_reward_ratio: f64,
    pub timeframe: Timeframe,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    Crisis,
    Risk,
}

/// A human-facing alert derived from the report sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAlert {
    pub level: AlertLevel,
    pub kind: AlertKind,
    pub message: String,
    pub value: f64,
}

/// Records why an analyzer's section is missing from a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerNote {
    pub analyzer: AnalyzerKind,
    pub error: String,
}

/// The sole externally visible artifact of one analysis cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub crisis_analysis: Option<CrisisReport>,
    pub risk_assessment: Option<RiskAssessment>,
    pub trading_signals: Option<Vec<TradingSignal>>,
    /// `None` only when both the crisis and risk sections are absent.
    pub market_condition: Option<MarketCondition>,
    #[serde(default)]
    pub alerts: Vec<MarketAlert>,
    #[serde(default)]
    pub notes: Vec<AnalyzerNote>,
}

impl AnalysisReport {
    /// True when at least one section is missing.
    pub fn is_degraded(&self) -> bool {
        !self.notes.is_empty()
    }
}
