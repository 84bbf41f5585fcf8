use analytics::StatsError;
use configuration::error::ConfigError;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Simulation parameters are invalid: {0}")]
    InvalidParameters(String),

    #[error("Monte Carlo configuration is invalid: {0}")]
    Config(#[from] ConfigError),

    #[error("Portfolio validation failed: {0}")]
    Validation(#[from] CoreError),

    #[error("Portfolio position '{0}' has no price series in the snapshot")]
    UnknownInstrument(String),

    #[error("A statistics error occurred: {0}")]
    Stats(#[from] StatsError),

    #[error("No usable risk model: {0}")]
    Simulation(String),

    #[error("Simulation was cancelled before completion")]
    Cancelled,
}
