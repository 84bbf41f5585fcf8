pub mod enums;
pub mod error;
#[cfg(feature = "fixtures")]
pub mod fixtures;
pub mod market;
pub mod portfolio;
pub mod report;

// Re-export the core types to provide a clean public API.
pub use enums::{
    AlertLevel, AnalyzerKind, AssetClass, MarketCondition, OrderSide, OrderType, SignalStrength,
    SignalType, SimulationMethod, Timeframe,
};
pub use error::CoreError;
pub use market::{Bar, Instrument, MacroReading, MarketSnapshot};
pub use portfolio::{Portfolio, PortfolioPosition, WEIGHT_TOLERANCE};
pub use report::{
    AlertKind, AnalysisReport, AnalyzerNote, CrisisReport, MarketAlert, RiskAssessment,
    TradingSignal, VarEstimate,
};
