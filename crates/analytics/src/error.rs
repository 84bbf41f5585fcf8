use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Not enough data to perform calculation: need {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Return series are not aligned: {0}")]
    Alignment(String),

    #[error("Cannot compute a statistic over an empty sample")]
    EmptySample,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
