use crate::error::RiskError;
use configuration::MonteCarloSettings;

/// Confidence levels that are always estimated, whatever the request asks for.
pub const HEADLINE_LEVELS: [f64; 2] = [0.95, 0.99];

/// The parameters of one simulation request.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSpec {
    pub horizon_days: usize,
    pub simulation_count: usize,
    pub confidence_levels: Vec<f64>,
    /// Fixed seed for a reproducible run. A fresh seed is drawn when `None`.
    pub seed: Option<u64>,
}

impl SimulationSpec {
    pub fn from_settings(settings: &MonteCarloSettings) -> Self {
        Self {
            horizon_days: settings.horizon_days,
            simulation_count: settings.simulation_count,
            confidence_levels: settings.confidence_levels.clone(),
            seed: settings.seed,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_horizon(mut self, horizon_days: usize) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_simulations(mut self, simulation_count: usize) -> Self {
        self.simulation_count = simulation_count;
        self
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        if self.horizon_days == 0 {
            return Err(RiskError::InvalidParameters(
                "horizon_days must be greater than 0".to_string(),
            ));
        }
        if self.simulation_count == 0 {
            return Err(RiskError::InvalidParameters(
                "simulation_count must be greater than 0".to_string(),
            ));
        }
        if let Some(c) = self.confidence_levels.iter().find(|c| !(**c > 0.0 && **c < 1.0)) {
            return Err(RiskError::InvalidParameters(format!(
                "confidence levels must lie strictly between 0 and 1, got {c}"
            )));
        }
        Ok(())
    }

    /// The requested levels plus the headline levels, ascending and deduplicated.
    pub fn levels(&self) -> Vec<f64> {
        let mut levels: Vec<f64> = self
            .confidence_levels
            .iter()
            .chain(HEADLINE_LEVELS.iter())
            .copied()
            .collect();
        levels.sort_by(f64::total_cmp);
        levels.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        levels
    }
}
