use configuration::error::ConfigError;
use core_types::Timeframe;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Signal generator received invalid parameters: {0}")]
    InvalidParameters(#[from] ConfigError),

    #[error("{symbol} {timeframe}: need {required} bars for indicator warm-up, got {actual}")]
    InsufficientData {
        symbol: String,
        timeframe: Timeframe,
        required: usize,
        actual: usize,
    },

    #[error("None of the {attempted} instrument series could be evaluated")]
    NoUsableSeries { attempted: usize },

    #[error("An error occurred during indicator calculation: {0}")]
    IndicatorError(String),
}
