use crate::error::ConfigError;
use crate::settings::Config;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{
    ClassificationThresholds, CrisisSettings, IndicatorWeights, LogFormat, LoggingSettings,
    MonteCarloSettings, MoveDirection, OrchestratorSettings, OrderTypes, SignalSettings,
    SignalWeights, WatchRule,
};
pub use telemetry::init_tracing;

/// Prefix for environment overrides, e.g. `RISKSCOPE__MONTE_CARLO__SIMULATION_COUNT=5000`.
pub const ENV_PREFIX: &str = "RISKSCOPE";

/// Loads configuration from `path` (optional; defaults apply when it is missing),
/// layered with `RISKSCOPE__*` environment variables.
///
/// This function is the primary entry point for this crate. It deserializes the
/// file into our strongly-typed `Config` struct, validates it and returns it.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(builder)
}

/// Parses configuration from a TOML string. No environment layering.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}
