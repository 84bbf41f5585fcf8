use core_types::AnalyzerNote;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The request or configuration is malformed. No analyzer was run.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Every analyzer failed: {}", describe(.0))]
    AllAnalyzersFailed(Vec<AnalyzerNote>),

    #[error("Analysis cycle was cancelled")]
    Cancelled,
}

fn describe(notes: &[AnalyzerNote]) -> String {
    notes
        .iter()
        .map(|n| format!("{}: {}", n.analyzer, n.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<core_types::CoreError> for EngineError {
    fn from(error: core_types::CoreError) -> Self {
        EngineError::Validation(error.to_string())
    }
}

impl From<configuration::error::ConfigError> for EngineError {
    fn from(error: configuration::error::ConfigError) -> Self {
        EngineError::Validation(error.to_string())
    }
}
