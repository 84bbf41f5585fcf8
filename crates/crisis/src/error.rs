use analytics::StatsError;
use configuration::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrisisError {
    #[error("Only {computed} crisis indicators could be computed, at least {required} are required")]
    InsufficientIndicators { computed: usize, required: usize },

    #[error("Crisis analyzer configuration is invalid: {0}")]
    Config(#[from] ConfigError),

    #[error("A statistics error occurred: {0}")]
    Stats(#[from] StatsError),
}
