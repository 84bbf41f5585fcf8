use crate::error::ConfigError;
use core_types::{OrderType, Timeframe};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Weights that are documented to sum to 1.0 are checked with this tolerance.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `config.toml` is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monte_carlo: MonteCarloSettings,
    pub crisis: CrisisSettings,
    pub signals: SignalSettings,
    pub classification: ClassificationThresholds,
    pub orchestrator: OrchestratorSettings,
    pub logging: LoggingSettings,
}

/// Contains parameters for the Monte Carlo portfolio simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloSettings {
    /// Number of independent simulated paths.
    pub simulation_count: usize,
    /// Number of daily steps per path.
    pub horizon_days: usize,
    /// Confidence levels at which VaR and expected shortfall are reported.
    pub confidence_levels: Vec<f64>,
    /// Fixed seed for reproducible runs. A fresh seed is drawn when absent.
    pub seed: Option<u64>,
    /// Diagonal ridge added to an ill-conditioned covariance matrix.
    pub ridge: f64,
    /// Condition number above which the covariance matrix is regularized.
    pub max_condition_number: f64,
    /// Minimum joint observations required by the historical fallback.
    pub min_historical_observations: usize,
}

impl Default for MonteCarloSettings {
    fn default() -> Self {
        Self {
            simulation_count: 10_000,
            horizon_days: 252,
            confidence_levels: vec![0.90, 0.95, 0.99],
            seed: None,
            ridge: 1e-6,
            max_condition_number: 1e10,
            min_historical_observations: 30,
        }
    }
}

/// Contains parameters for the crisis analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrisisSettings {
    pub weights: IndicatorWeights,
    /// Fewer computable indicators than this is a hard failure.
    pub min_indicators: usize,
    /// Minimum bars an instrument needs to contribute to any indicator.
    pub min_observations: usize,
    /// Rolling window (in bars) for the "recent" side of each comparison.
    pub window: usize,
    /// Volatility z-scores are clipped to [0, cap] before rescaling to [0, 1].
    pub z_score_cap: f64,
    /// Recent/long-run range ratio treated as fully stressed.
    pub liquidity_ratio_cap: f64,
    pub watchlist: Vec<WatchRule>,
}

impl Default for CrisisSettings {
    fn default() -> Self {
        Self {
            weights: IndicatorWeights::default(),
            min_indicators: 2,
            min_observations: 30,
            window: 20,
            z_score_cap: 3.0,
            liquidity_ratio_cap: 3.0,
            watchlist: WatchRule::defaults(),
        }
    }
}

/// Weights for the composite crisis score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWeights {
    pub volatility_stress: f64,
    pub correlation_breakdown: f64,
    pub liquidity_stress: f64,
    pub threshold_breach: f64,
    pub macro_deviation: f64,
}

impl IndicatorWeights {
    pub fn total(&self) -> f64 {
        self.volatility_stress
            + self.correlation_breakdown
            + self.liquidity_stress
            + self.threshold_breach
            + self.macro_deviation
    }
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            volatility_stress: 0.30,
            correlation_breakdown: 0.25,
            liquidity_stress: 0.20,
            threshold_breach: 0.15,
            macro_deviation: 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Drop,
    Rise,
}

/// A monitored instrument: a move of `threshold` (fraction) in `direction`
/// over `lookback` bars counts as a full breach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRule {
    pub symbol: String,
    pub lookback: usize,
    pub threshold: f64,
    pub direction: MoveDirection,
}

impl WatchRule {
    fn new(symbol: &str, lookback: usize, threshold: f64, direction: MoveDirection) -> Self {
        Self {
            symbol: symbol.to_string(),
            lookback,
            threshold,
            direction,
        }
    }

    pub fn defaults() -> Vec<Self> {
        use MoveDirection::{Drop, Rise};
        vec![
            Self::new("EUR/USD", 30, 0.08, Drop),
            Self::new("XAU/USD", 14, 0.10, Rise),
            Self::new("BTC/USD", 30, 0.20, Drop),
            Self::new("SPX", 30, 0.15, Drop),
            Self::new("VIX", 7, 0.50, Rise),
            Self::new("GER30", 30, 0.12, Drop),
        ]
    }
}

/// Contains parameters for the signal generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    pub timeframes: Vec<Timeframe>,
    pub weights: SignalWeights,
    /// Composite score above which a BUY candidate is formed.
    pub buy_threshold: f64,
    /// Composite score below which a SELL candidate is formed.
    pub sell_threshold: f64,
    /// Candidates below this confidence are discarded.
    pub min_confidence: f64,
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    /// Lookback of the moving average the breakout term is measured against.
    pub breakout_period: usize,
    pub stop_atr_multiple: f64,
    /// Strictly increasing ATR multiples, one take-profit level each.
    pub take_profit_atr_multiples: Vec<f64>,
    /// Decimal places signal prices are rounded to.
    pub price_precision: u32,
    pub max_signals: usize,
    pub order_types: OrderTypes,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            timeframes: Timeframe::ALL.to_vec(),
            weights: SignalWeights::default(),
            buy_threshold: 0.5,
            sell_threshold: -0.5,
            min_confidence: 0.75,
            ema_fast_period: 12,
            ema_slow_period: 26,
            rsi_period: 14,
            atr_period: 14,
            breakout_period: 20,
            stop_atr_multiple: 1.5,
            take_profit_atr_multiples: vec![1.0, 2.0, 3.0],
            price_precision: 5,
            max_signals: 20,
            order_types: OrderTypes::default(),
        }
    }
}

impl SignalSettings {
    /// Bars needed before every indicator has warmed up.
    pub fn warmup_bars(&self) -> usize {
        [
            self.ema_slow_period,
            self.ema_fast_period,
            self.rsi_period + 1,
            self.atr_period + 1,
            self.breakout_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

/// Weights of the three components of the directional score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub trend: f64,
    pub momentum: f64,
    pub volatility: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            trend: 0.45,
            momentum: 0.35,
            volatility: 0.20,
        }
    }
}

/// The order type attached to signals of each timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderTypes {
    pub m15: OrderType,
    pub h4: OrderType,
    pub d1: OrderType,
}

impl OrderTypes {
    pub fn for_timeframe(&self, timeframe: Timeframe) -> OrderType {
        match timeframe {
            Timeframe::M15 => self.m15,
            Timeframe::H4 => self.h4,
            Timeframe::D1 => self.d1,
        }
    }
}

impl Default for OrderTypes {
    fn default() -> Self {
        Self {
            m15: OrderType::Limit,
            h4: OrderType::Limit,
            d1: OrderType::Market,
        }
    }
}

/// Thresholds of the market-condition rule list, evaluated top-down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    /// crisis_score above this → CRISIS.
    pub crisis_score: f64,
    /// var_95 below this → CRISIS.
    pub crisis_var_95: f64,
    /// crisis_score above this → HIGH_RISK.
    pub high_risk_score: f64,
    /// var_95 below this → HIGH_RISK.
    pub high_risk_var_95: f64,
    /// crisis_score above this → MODERATE_RISK.
    pub moderate_risk_score: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            crisis_score: 0.7,
            crisis_var_95: -0.10,
            high_risk_score: 0.4,
            high_risk_var_95: -0.05,
            moderate_risk_score: 0.2,
        }
    }
}

/// Contains parameters for running a full analysis cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Per-analyzer deadline; exceeding it fails only that analyzer.
    #[serde(with = "humantime_serde")]
    pub analyzer_timeout: Duration,
    /// Portfolio used when a request carries no weights. Equal weights over the
    /// snapshot when absent.
    pub default_weights: Option<BTreeMap<String, f64>>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            analyzer_timeout: Duration::from_secs(30),
            default_weights: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Contains parameters for the tracing subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, e.g. "info" or "risk=debug,info". `RUST_LOG` wins.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs go to a daily-rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            directory: None,
            file_prefix: "riskscope.log".to_string(),
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

fn check_probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!("{name} must be within [0, 1], got {value}")));
    }
    Ok(())
}

impl Config {
    /// Checks every cross-field invariant the engines rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monte_carlo.validate()?;
        self.crisis.validate()?;
        self.signals.validate()?;
        self.classification.validate()?;

        if self.orchestrator.analyzer_timeout.is_zero() {
            return Err(invalid("orchestrator.analyzer_timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl MonteCarloSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation_count == 0 {
            return Err(invalid("monte_carlo.simulation_count must be greater than 0"));
        }
        if self.horizon_days == 0 {
            return Err(invalid("monte_carlo.horizon_days must be greater than 0"));
        }
        if self.confidence_levels.is_empty() {
            return Err(invalid("monte_carlo.confidence_levels must not be empty"));
        }
        if let Some(level) = self
            .confidence_levels
            .iter()
            .find(|c| !(**c > 0.0 && **c < 1.0))
        {
            return Err(invalid(format!(
                "monte_carlo.confidence_levels must lie strictly between 0 and 1, got {level}"
            )));
        }
        if !(self.ridge.is_finite() && self.ridge > 0.0) {
            return Err(invalid("monte_carlo.ridge must be a positive number"));
        }
        if !(self.max_condition_number > 1.0) {
            return Err(invalid("monte_carlo.max_condition_number must be greater than 1"));
        }
        if self.min_historical_observations < 2 {
            return Err(invalid("monte_carlo.min_historical_observations must be at least 2"));
        }
        Ok(())
    }
}

impl CrisisSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        for (name, weight) in [
            ("volatility_stress", w.volatility_stress),
            ("correlation_breakdown", w.correlation_breakdown),
            ("liquidity_stress", w.liquidity_stress),
            ("threshold_breach", w.threshold_breach),
            ("macro_deviation", w.macro_deviation),
        ] {
            check_probability(&format!("crisis.weights.{name}"), weight)?;
        }
        if (w.total() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!(
                "crisis.weights must sum to 1.0, got {}",
                w.total()
            )));
        }
        if self.min_indicators == 0 || self.min_indicators > 5 {
            return Err(invalid("crisis.min_indicators must be between 1 and 5"));
        }
        if self.window < 2 {
            return Err(invalid("crisis.window must be at least 2"));
        }
        if self.min_observations <= self.window {
            return Err(invalid("crisis.min_observations must exceed crisis.window"));
        }
        if !(self.z_score_cap > 0.0) {
            return Err(invalid("crisis.z_score_cap must be positive"));
        }
        if !(self.liquidity_ratio_cap > 1.0) {
            return Err(invalid("crisis.liquidity_ratio_cap must be greater than 1"));
        }
        for rule in &self.watchlist {
            if rule.lookback == 0 || !(rule.threshold > 0.0) {
                return Err(invalid(format!(
                    "crisis.watchlist entry for {} needs a positive lookback and threshold",
                    rule.symbol
                )));
            }
        }
        Ok(())
    }
}

impl SignalSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeframes.is_empty() {
            return Err(invalid("signals.timeframes must not be empty"));
        }
        let w = &self.weights;
        for (name, weight) in [
            ("trend", w.trend),
            ("momentum", w.momentum),
            ("volatility", w.volatility),
        ] {
            check_probability(&format!("signals.weights.{name}"), weight)?;
        }
        let total = w.trend + w.momentum + w.volatility;
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!("signals.weights must sum to 1.0, got {total}")));
        }
        check_probability("signals.min_confidence", self.min_confidence)?;
        if !(self.buy_threshold > 0.0 && self.buy_threshold <= 1.0) {
            return Err(invalid("signals.buy_threshold must be within (0, 1]"));
        }
        if !(self.sell_threshold < 0.0 && self.sell_threshold >= -1.0) {
            return Err(invalid("signals.sell_threshold must be within [-1, 0)"));
        }
        if self.ema_fast_period == 0 || self.ema_fast_period >= self.ema_slow_period {
            return Err(invalid(
                "signals.ema_fast_period must be positive and shorter than signals.ema_slow_period",
            ));
        }
        if self.rsi_period == 0 || self.atr_period == 0 || self.breakout_period == 0 {
            return Err(invalid("signals indicator periods must be greater than 0"));
        }
        if !(self.stop_atr_multiple > 0.0) {
            return Err(invalid("signals.stop_atr_multiple must be positive"));
        }
        let multiples = &self.take_profit_atr_multiples;
        if multiples.is_empty() {
            return Err(invalid("signals.take_profit_atr_multiples must not be empty"));
        }
        if !(multiples[0] > 0.0) || multiples.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(invalid(
                "signals.take_profit_atr_multiples must be positive and strictly increasing",
            ));
        }
        if self.price_precision > 12 {
            return Err(invalid("signals.price_precision must be at most 12"));
        }
        if self.max_signals == 0 {
            return Err(invalid("signals.max_signals must be greater than 0"));
        }
        Ok(())
    }
}

impl ClassificationThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("crisis_score", self.crisis_score),
            ("high_risk_score", self.high_risk_score),
            ("moderate_risk_score", self.moderate_risk_score),
        ] {
            check_probability(&format!("classification.{name}"), value)?;
        }
        if !(self.crisis_score >= self.high_risk_score
            && self.high_risk_score >= self.moderate_risk_score)
        {
            return Err(invalid(
                "classification score thresholds must satisfy crisis >= high_risk >= moderate_risk",
            ));
        }
        if !(self.crisis_var_95 <= self.high_risk_var_95 && self.high_risk_var_95 <= 0.0) {
            return Err(invalid(
                "classification VaR thresholds must satisfy crisis_var_95 <= high_risk_var_95 <= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.monte_carlo.simulation_count, 10_000);
        assert_eq!(config.monte_carlo.horizon_days, 252);
        assert_eq!(config.monte_carlo.confidence_levels, vec![0.90, 0.95, 0.99]);
        assert_eq!(config.signals.min_confidence, 0.75);
        assert_eq!(config.classification.crisis_score, 0.7);
        assert_eq!(config.classification.crisis_var_95, -0.10);
    }

    #[test]
    fn rejects_crisis_weights_not_summing_to_one() {
        let mut config = Config::default();
        config.crisis.weights.macro_deviation = 0.2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("crisis.weights must sum to 1.0"));
    }

    #[test]
    fn rejects_non_increasing_take_profits() {
        let mut config = Config::default();
        config.signals.take_profit_atr_multiples = vec![1.0, 1.0, 2.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_confidence_level_of_one() {
        let mut config = Config::default();
        config.monte_carlo.confidence_levels = vec![0.95, 1.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_misordered_thresholds() {
        let mut config = Config::default();
        config.classification.high_risk_score = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn warmup_covers_slowest_indicator() {
        let settings = SignalSettings::default();
        assert_eq!(settings.warmup_bars(), 27);
    }
}
