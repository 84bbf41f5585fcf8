use crate::error::RiskError;
use crate::model::ReturnModel;
use crate::simulation::simulate_paths;
use crate::spec::SimulationSpec;
use analytics::{ReturnSeries, StatsError, percentile_sorted, sorted, tail_mean};
use configuration::MonteCarloSettings;
use core_types::{MarketSnapshot, Portfolio, RiskAssessment, VarEstimate};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;

/// Estimates portfolio VaR and expected shortfall by simulating correlated
/// return paths.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    settings: MonteCarloSettings,
}

impl MonteCarloEngine {
    /// Creates a new `MonteCarloEngine`, validating the settings it is given.
    pub fn new(settings: MonteCarloSettings) -> Result<Self, RiskError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// A request built from the configured defaults.
    pub fn default_spec(&self) -> SimulationSpec {
        SimulationSpec::from_settings(&self.settings)
    }

    /// Validates `weights` against `snapshot` and simulates the resulting
    /// portfolio. Malformed weights are a `RiskError::Validation`.
    pub fn simulate_weights(
        &self,
        weights: &BTreeMap<String, f64>,
        snapshot: &MarketSnapshot,
        spec: &SimulationSpec,
    ) -> Result<RiskAssessment, RiskError> {
        let portfolio = Portfolio::from_weights(weights, snapshot)?;
        self.simulate(&portfolio, snapshot, spec)
    }

    pub fn simulate(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        spec: &SimulationSpec,
    ) -> Result<RiskAssessment, RiskError> {
        self.simulate_until(portfolio, snapshot, spec, &AtomicBool::new(false))
    }

    /// Runs the simulation, giving up with `RiskError::Cancelled` as soon as
    /// `stop` is raised.
    pub fn simulate_until(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        spec: &SimulationSpec,
        stop: &AtomicBool,
    ) -> Result<RiskAssessment, RiskError> {
        spec.validate()?;

        // --- 1. Return series per position ---
        let series = portfolio
            .positions()
            .iter()
            .map(|position| {
                let instrument = snapshot
                    .instrument(&position.symbol)
                    .ok_or_else(|| RiskError::UnknownInstrument(position.symbol.clone()))?;
                Ok(ReturnSeries::from_bars(position.symbol.as_str(), &instrument.bars)?)
            })
            .collect::<Result<Vec<_>, RiskError>>()?;

        // --- 2. Fit the joint model ---
        let model = ReturnModel::fit(&series, &self.settings)?;
        let seed = spec.seed.unwrap_or_else(rand::random);
        tracing::debug!(
            method = ?model.method(),
            observations = model.observations(),
            ridge = model.ridge_applied(),
            seed,
            "Fitted return model."
        );

        // --- 3. Simulate ---
        let outcomes = simulate_paths(
            &model,
            &portfolio.weights(),
            spec.horizon_days,
            spec.simulation_count,
            seed,
            stop,
        )
        .ok_or(RiskError::Cancelled)?;

        if outcomes.iter().any(|o| !o.is_finite()) {
            return Err(RiskError::Simulation(
                "simulated portfolio returns are not finite".to_string(),
            ));
        }

        // --- 4. Summarize the empirical distribution ---
        let assessment = summarize(&outcomes, spec, &model, seed)?;
        tracing::info!(
            var_95 = assessment.var_95,
            var_99 = assessment.var_99,
            expected_shortfall = assessment.expected_shortfall,
            method = ?assessment.method,
            simulations = assessment.simulation_count,
            "Monte Carlo simulation complete."
        );
        Ok(assessment)
    }
}

fn summarize(
    outcomes: &[f64],
    spec: &SimulationSpec,
    model: &ReturnModel,
    seed: u64,
) -> Result<RiskAssessment, RiskError> {
    let sorted = sorted(outcomes);
    let levels = spec
        .levels()
        .into_iter()
        .map(|confidence| {
            let var = percentile_sorted(&sorted, (1.0 - confidence) * 100.0)?;
            let expected_shortfall = tail_mean(&sorted, var)?;
            Ok(VarEstimate {
                confidence,
                var,
                expected_shortfall,
            })
        })
        .collect::<Result<Vec<_>, StatsError>>()?;

    let headline = |confidence: f64| {
        levels
            .iter()
            .find(|l| (l.confidence - confidence).abs() < 1e-9)
            .copied()
            .ok_or_else(|| RiskError::Simulation(format!("no estimate at the {confidence} level")))
    };
    let at_95 = headline(0.95)?;
    let at_99 = headline(0.99)?;

    Ok(RiskAssessment {
        var_95: at_95.var,
        var_99: at_99.var,
        expected_shortfall: at_95.expected_shortfall,
        simulation_count: spec.simulation_count,
        horizon_days: spec.horizon_days,
        method: model.method(),
        levels,
        ridge_applied: model.ridge_applied(),
        observations: model.observations(),
        seed,
    })
}
