use configuration::settings::Config;
use core_types::fixtures::{WalkParams, calm_market, random_walk, snapshot};
use core_types::{AnalyzerKind, AssetClass, MarketSnapshot};
use engine::{AnalysisOrchestrator, AnalysisRequest, CancellationHandle, EngineError};
use risk::SimulationSpec;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn quick_spec() -> SimulationSpec {
    SimulationSpec {
        horizon_days: 10,
        simulation_count: 500,
        confidence_levels: vec![0.95, 0.99],
        seed: Some(17),
    }
}

fn heavy_spec() -> SimulationSpec {
    SimulationSpec {
        horizon_days: 252,
        simulation_count: 1_000_000,
        confidence_levels: vec![0.95],
        seed: Some(17),
    }
}

fn orchestrator(config: &Config) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(config).unwrap()
}

fn quick_request() -> AnalysisRequest {
    AnalysisRequest::default().with_spec(quick_spec())
}

fn market(bars: usize) -> Arc<MarketSnapshot> {
    Arc::new(calm_market(bars))
}

#[tokio::test]
async fn full_cycle_fills_every_section() {
    let report = orchestrator(&Config::default())
        .run_with(market(250), quick_request(), &CancellationHandle::new())
        .await
        .unwrap();

    assert!(report.notes.is_empty(), "unexpected notes: {:?}", report.notes);
    assert!(!report.is_degraded());
    let crisis = report.crisis_analysis.as_ref().unwrap();
    assert!((0.0..=1.0).contains(&crisis.crisis_score));
    let risk = report.risk_assessment.as_ref().unwrap();
    assert!(risk.var_99 <= risk.var_95);
    assert_eq!(risk.simulation_count, 500);
    assert!(report.trading_signals.is_some());
    assert!(report.market_condition.is_some());
}

#[tokio::test]
async fn misaligned_history_degrades_only_the_risk_section() {
    let snapshot = Arc::new(snapshot(vec![
        random_walk("A", AssetClass::Index, WalkParams { bars: 250, seed: 1, ..WalkParams::default() }),
        random_walk("B", AssetClass::Index, WalkParams { bars: 120, seed: 2, ..WalkParams::default() }),
    ]));

    let report = orchestrator(&Config::default())
        .run_with(snapshot, quick_request(), &CancellationHandle::new())
        .await
        .unwrap();

    assert!(report.is_degraded());
    assert_eq!(report.notes.len(), 1);
    assert_eq!(report.notes[0].analyzer, AnalyzerKind::MonteCarlo);
    assert!(report.risk_assessment.is_none());
    assert!(report.crisis_analysis.is_some());
    // Classified from the crisis score alone.
    assert!(report.market_condition.is_some());
}

#[tokio::test]
async fn single_bar_instrument_stays_out_of_the_default_portfolio() {
    let mut market = calm_market(250);
    let listed = random_walk("GER30", AssetClass::Index, WalkParams { bars: 1, seed: 3, ..WalkParams::default() });
    market.instruments.insert(listed.symbol.clone(), listed);

    let report = orchestrator(&Config::default())
        .run_with(Arc::new(market), quick_request(), &CancellationHandle::new())
        .await
        .unwrap();

    assert!(report.risk_assessment.is_some(), "notes: {:?}", report.notes);
    let crisis = report.crisis_analysis.as_ref().unwrap();
    assert_eq!(crisis.excluded_instruments, vec!["GER30".to_string()]);
}

#[tokio::test]
async fn cycle_fails_when_every_analyzer_fails() {
    let snapshot = Arc::new(snapshot(vec![
        random_walk("A", AssetClass::Index, WalkParams { bars: 2, seed: 1, ..WalkParams::default() }),
        random_walk("B", AssetClass::Forex, WalkParams { bars: 2, seed: 2, ..WalkParams::default() }),
    ]));

    let err = orchestrator(&Config::default())
        .run_with(snapshot, quick_request(), &CancellationHandle::new())
        .await
        .unwrap_err();

    let notes = match err {
        EngineError::AllAnalyzersFailed(notes) => notes,
        other => panic!("expected every analyzer to fail, got {other:?}"),
    };
    let kinds: Vec<AnalyzerKind> = notes.iter().map(|n| n.analyzer).collect();
    assert_eq!(kinds, vec![AnalyzerKind::Crisis, AnalyzerKind::MonteCarlo, AnalyzerKind::Signals]);
}

#[tokio::test]
async fn malformed_weights_abort_before_any_analyzer() {
    let mut weights = BTreeMap::new();
    weights.insert("SPX".to_string(), 0.6);
    weights.insert("EUR/USD".to_string(), 0.3);

    let err = orchestrator(&Config::default())
        .run_with(market(250), quick_request().with_weights(weights), &CancellationHandle::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let mut unknown = BTreeMap::new();
    unknown.insert("DAX".to_string(), 1.0);
    let err = orchestrator(&Config::default())
        .run_with(market(250), quick_request().with_weights(unknown), &CancellationHandle::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(message) if message.contains("DAX")));
}

#[tokio::test]
async fn configured_default_weights_are_used() {
    let mut config = Config::default();
    let mut weights = BTreeMap::new();
    weights.insert("SPX".to_string(), 0.5);
    config.orchestrator.default_weights = Some(weights);

    let err = orchestrator(&config).run_with(market(250), quick_request(), &CancellationHandle::new()).await;
    assert!(matches!(err, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn invalid_simulation_request_is_a_validation_error() {
    let spec = SimulationSpec {
        simulation_count: 0,
        ..quick_spec()
    };
    let err = orchestrator(&Config::default())
        .run_with(market(250), AnalysisRequest::default().with_spec(spec), &CancellationHandle::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn slow_simulation_times_out_alone() {
    let mut config = Config::default();
    config.orchestrator.analyzer_timeout = Duration::from_millis(500);

    let report = orchestrator(&config)
        .run_with(market(250), AnalysisRequest::default().with_spec(heavy_spec()), &CancellationHandle::new())
        .await
        .unwrap();

    assert!(report.risk_assessment.is_none());
    assert!(report.crisis_analysis.is_some());
    assert!(report.trading_signals.is_some());
    assert_eq!(report.notes.len(), 1);
    assert_eq!(report.notes[0].analyzer, AnalyzerKind::MonteCarlo);
    assert!(report.notes[0].error.contains("timed out"));
}

#[tokio::test]
async fn cancelled_cycle_returns_no_report() {
    let orchestrator = orchestrator(&Config::default());
    let cancel = CancellationHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = orchestrator
        .run_with(market(250), AnalysisRequest::default().with_spec(heavy_spec()), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
}

#[tokio::test]
async fn invalid_configuration_is_rejected() {
    let mut config = Config::default();
    config.crisis.weights.volatility_stress = 0.9;
    assert!(matches!(AnalysisOrchestrator::new(&config), Err(EngineError::Validation(_))));
}
