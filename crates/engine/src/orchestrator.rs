use crate::cancel::CancellationHandle;
use crate::classify::{classify, market_alerts};
use crate::error::EngineError;
use chrono::Utc;
use configuration::settings::Config;
use configuration::{ClassificationThresholds, OrchestratorSettings};
use core_types::{AnalysisReport, AnalyzerKind, AnalyzerNote, MarketSnapshot, Portfolio};
use crisis::CrisisAnalyzer;
use risk::{MonteCarloEngine, SimulationSpec};
use signals::SignalGenerator;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Per-cycle overrides. Anything left `None` falls back to the configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    /// Symbol→weight map of the portfolio to simulate.
    pub weights: Option<BTreeMap<String, f64>>,
    pub spec: Option<SimulationSpec>,
}

impl AnalysisRequest {
    pub fn with_weights(mut self, weights: BTreeMap<String, f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_spec(mut self, spec: SimulationSpec) -> Self {
        self.spec = Some(spec);
        self
    }
}

/// The central coordinator of an analysis cycle.
///
/// Fans one immutable snapshot out to the crisis analyzer, the Monte Carlo
/// engine and the signal generator, then fuses whatever they produced into a
/// single `AnalysisReport`.
pub struct AnalysisOrchestrator {
    crisis: Arc<CrisisAnalyzer>,
    monte_carlo: Arc<MonteCarloEngine>,
    signals: Arc<SignalGenerator>,
    thresholds: ClassificationThresholds,
    settings: OrchestratorSettings,
}

impl AnalysisOrchestrator {
    /// Builds every analyzer from its configuration section.
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            crisis: Arc::new(CrisisAnalyzer::new(config.crisis.clone()).map_err(invalid)?),
            monte_carlo: Arc::new(MonteCarloEngine::new(config.monte_carlo.clone()).map_err(invalid)?),
            signals: Arc::new(SignalGenerator::new(config.signals.clone()).map_err(invalid)?),
            thresholds: config.classification,
            settings: config.orchestrator.clone(),
        })
    }

    /// Runs a cycle with the configured portfolio and simulation defaults.
    pub async fn run(&self, snapshot: Arc<MarketSnapshot>) -> Result<AnalysisReport, EngineError> {
        self.run_with(snapshot, AnalysisRequest::default(), &CancellationHandle::new())
            .await
    }

    /// Runs one full analysis cycle.
    ///
    /// A malformed request fails before any analyzer starts. A failing or
    /// timed-out analyzer leaves its section empty and adds a note; the cycle
    /// only fails when all three analyzers fail or `cancel` fires.
    pub async fn run_with(
        &self,
        snapshot: Arc<MarketSnapshot>,
        request: AnalysisRequest,
        cancel: &CancellationHandle,
    ) -> Result<AnalysisReport, EngineError> {
        // --- 1. Validate the request ---
        let portfolio = self.portfolio_for(&snapshot, request.weights.as_ref())?;
        let spec = request
            .spec
            .unwrap_or_else(|| self.monte_carlo.default_spec());
        spec.validate().map_err(invalid)?;

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        tracing::info!(
            instruments = snapshot.instruments.len(),
            positions = portfolio.len(),
            simulations = spec.simulation_count,
            horizon_days = spec.horizon_days,
            "Starting analysis cycle."
        );

        // --- 2. Fan out ---
        let timeout = self.settings.analyzer_timeout;
        let stop = Arc::new(AtomicBool::new(false));

        let crisis_task = {
            let analyzer = Arc::clone(&self.crisis);
            let snapshot = Arc::clone(&snapshot);
            guarded(AnalyzerKind::Crisis, timeout, move || analyzer.analyze(&snapshot))
        };

        let risk_task = {
            let engine = Arc::clone(&self.monte_carlo);
            let snapshot = Arc::clone(&snapshot);
            let flag = Arc::clone(&stop);
            let stop = Arc::clone(&stop);
            async move {
                let result = guarded(AnalyzerKind::MonteCarlo, timeout, move || {
                    engine.simulate_until(&portfolio, &snapshot, &spec, &flag)
                })
                .await;
                // A simulation that outlived its deadline keeps its blocking
                // thread until it sees the flag.
                if result.is_err() {
                    stop.store(true, Ordering::Relaxed);
                }
                result
            }
        };

        let signal_task = {
            let generator = Arc::clone(&self.signals);
            let snapshot = Arc::clone(&snapshot);
            guarded(AnalyzerKind::Signals, timeout, move || generator.generate(&snapshot))
        };

        // --- 3. Fan in ---
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            results = async { tokio::join!(crisis_task, risk_task, signal_task) } => Some(results),
        };
        let Some((crisis, risk, signals)) = joined else {
            stop.store(true, Ordering::Relaxed);
            tracing::warn!("Analysis cycle cancelled.");
            return Err(EngineError::Cancelled);
        };

        // --- 4. Assemble ---
        let mut notes = Vec::new();
        let crisis_analysis = keep(crisis, AnalyzerKind::Crisis, &mut notes);
        let risk_assessment = keep(risk, AnalyzerKind::MonteCarlo, &mut notes);
        let trading_signals = keep(signals, AnalyzerKind::Signals, &mut notes);

        if notes.len() == 3 {
            tracing::error!(?notes, "Every analyzer failed.");
            return Err(EngineError::AllAnalyzersFailed(notes));
        }

        let crisis_score = crisis_analysis.as_ref().map(|c| c.crisis_score);
        let var_95 = risk_assessment.as_ref().map(|r| r.var_95);
        let market_condition = classify(crisis_score, var_95, &self.thresholds);
        let alerts = market_alerts(crisis_analysis.as_ref(), risk_assessment.as_ref(), &self.thresholds);

        let report = AnalysisReport {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            crisis_analysis,
            risk_assessment,
            trading_signals,
            market_condition,
            alerts,
            notes,
        };

        tracing::info!(
            report_id = %report.id,
            market_condition = ?report.market_condition,
            crisis_score,
            var_95,
            signals = report.trading_signals.as_ref().map(Vec::len),
            degraded = report.is_degraded(),
            "Analysis cycle complete."
        );
        Ok(report)
    }

    /// The portfolio for a cycle: the request's weights, else the configured
    /// default weights, else equal weights over the snapshot.
    fn portfolio_for(
        &self,
        snapshot: &MarketSnapshot,
        weights: Option<&BTreeMap<String, f64>>,
    ) -> Result<Portfolio, EngineError> {
        let portfolio = match weights.or(self.settings.default_weights.as_ref()) {
            Some(weights) => Portfolio::from_weights(weights, snapshot)?,
            None => Portfolio::equal_weight(snapshot)?,
        };
        Ok(portfolio)
    }
}

fn invalid(error: impl Display) -> EngineError {
    EngineError::Validation(error.to_string())
}

/// Runs a blocking analyzer with a deadline, flattening every failure into
/// the message that ends up in the report's notes.
async fn guarded<T, E, F>(kind: AnalyzerKind, timeout: Duration, work: F) -> Result<T, String>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);
    let outcome = match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(value))) => return Ok(value),
        Ok(Ok(Err(error))) => error.to_string(),
        Ok(Err(join_error)) => format!("analyzer task aborted: {join_error}"),
        Err(_) => format!("timed out after {timeout:?}"),
    };
    tracing::warn!(analyzer = %kind, error = %outcome, "Analyzer failed.");
    Err(outcome)
}

fn keep<T>(result: Result<T, String>, analyzer: AnalyzerKind, notes: &mut Vec<AnalyzerNote>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            notes.push(AnalyzerNote { analyzer, error });
            None
        }
    }
}
