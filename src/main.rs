use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, Table};
use configuration::settings::Config;
use configuration::LogFormat;
use core_types::{AnalysisReport, CrisisReport, MarketSnapshot, Portfolio, RiskAssessment, TradingSignal};
use crisis::CrisisAnalyzer;
use engine::{AnalysisOrchestrator, AnalysisRequest, CancellationHandle};
use risk::{MonteCarloEngine, SimulationSpec};
use serde::Serialize;
use serde::de::DeserializeOwned;
use signals::SignalGenerator;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The main entry point for the riskscope analytics engine.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; overrides may come from the real environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = configuration::load_config_from(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(seed) = cli.seed {
        config.monte_carlo.seed = Some(seed);
    }

    // Held until exit so buffered file logs are flushed.
    let _guard = configuration::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, &config, cli.format).await,
        Commands::Crisis(args) => handle_crisis(args, &config, cli.format),
        Commands::Simulate(args) => handle_simulate(args, &config, cli.format).await,
        Commands::Signals(args) => handle_signals(args, &config, cli.format),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Risk and crisis analytics over a market snapshot.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration file. Defaults apply when it is missing.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Fixed Monte Carlo seed for a reproducible run.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Overrides the configured log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// How results are printed.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full analysis cycle and print the report.
    Analyze(PortfolioArgs),
    /// Score systemic market stress.
    Crisis(SnapshotArgs),
    /// Estimate portfolio VaR and expected shortfall.
    Simulate(PortfolioArgs),
    /// Generate trading signals.
    Signals(SnapshotArgs),
}

#[derive(Parser)]
struct SnapshotArgs {
    /// JSON market snapshot.
    #[arg(long)]
    snapshot: PathBuf,
}

#[derive(Parser)]
struct PortfolioArgs {
    /// JSON market snapshot.
    #[arg(long)]
    snapshot: PathBuf,

    /// JSON symbol→weight map. Falls back to the configured default weights,
    /// then to equal weights.
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Number of simulated paths.
    #[arg(long)]
    simulations: Option<usize>,

    /// Simulation horizon in trading days.
    #[arg(long)]
    horizon: Option<usize>,
}

impl PortfolioArgs {
    fn spec(&self, engine_defaults: SimulationSpec) -> SimulationSpec {
        let mut spec = engine_defaults;
        if let Some(simulations) = self.simulations {
            spec = spec.with_simulations(simulations);
        }
        if let Some(horizon) = self.horizon {
            spec = spec.with_horizon(horizon);
        }
        spec
    }

    fn weights(&self) -> anyhow::Result<Option<BTreeMap<String, f64>>> {
        self.weights.as_deref().map(read_json).transpose()
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_analyze(args: PortfolioArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = Arc::new(read_json::<MarketSnapshot>(&args.snapshot)?);
    let orchestrator = AnalysisOrchestrator::new(config)?;

    let mut request = AnalysisRequest::default()
        .with_spec(args.spec(SimulationSpec::from_settings(&config.monte_carlo)));
    if let Some(weights) = args.weights()? {
        request = request.with_weights(weights);
    }

    // Ctrl-C cancels the cycle instead of killing a half-finished simulation.
    let cancel = CancellationHandle::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling.");
            on_signal.cancel();
        }
    });

    let report = orchestrator.run_with(snapshot, request, &cancel).await?;
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            print_report_table(&report);
            Ok(())
        }
    }
}

fn handle_crisis(args: SnapshotArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = read_json::<MarketSnapshot>(&args.snapshot)?;
    let report = CrisisAnalyzer::new(config.crisis.clone())?.analyze(&snapshot)?;
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            println!("{}", crisis_table(&report));
            Ok(())
        }
    }
}

async fn handle_simulate(args: PortfolioArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = read_json::<MarketSnapshot>(&args.snapshot)?;
    let engine = MonteCarloEngine::new(config.monte_carlo.clone())?;
    let spec = args.spec(engine.default_spec());

    let portfolio = match args.weights()?.or_else(|| config.orchestrator.default_weights.clone()) {
        Some(weights) => Portfolio::from_weights(&weights, &snapshot)?,
        None => Portfolio::equal_weight(&snapshot)?,
    };

    let assessment = tokio::task::spawn_blocking(move || engine.simulate(&portfolio, &snapshot, &spec)).await??;
    match format {
        OutputFormat::Json => print_json(&assessment),
        OutputFormat::Table => {
            println!("{}", risk_table(&assessment));
            Ok(())
        }
    }
}

fn handle_signals(args: SnapshotArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = read_json::<MarketSnapshot>(&args.snapshot)?;
    let signals = SignalGenerator::new(config.signals.clone())?.generate(&snapshot)?;
    match format {
        OutputFormat::Json => print_json(&signals),
        OutputFormat::Table => {
            println!("{}", signal_table(&signals));
            Ok(())
        }
    }
}

// ==============================================================================
// I/O Helpers
// ==============================================================================

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report_table(report: &AnalysisReport) {
    let mut summary = Table::new();
    summary.set_header(vec!["Report", "Value"]);
    summary.add_row(vec![Cell::new("id"), Cell::new(report.id)]);
    summary.add_row(vec![Cell::new("timestamp"), Cell::new(report.timestamp.to_rfc3339())]);
    summary.add_row(vec![
        Cell::new("market condition"),
        Cell::new(report.market_condition.map_or_else(|| "n/a".to_string(), |c| c.to_string())),
    ]);
    for alert in &report.alerts {
        summary.add_row(vec![Cell::new(format!("alert ({:?})", alert.level)), Cell::new(&alert.message)]);
    }
    for note in &report.notes {
        summary.add_row(vec![Cell::new(format!("failed: {}", note.analyzer)), Cell::new(&note.error)]);
    }
    println!("{summary}");

    if let Some(crisis) = &report.crisis_analysis {
        println!("{}", crisis_table(crisis));
    }
    if let Some(risk) = &report.risk_assessment {
        println!("{}", risk_table(risk));
    }
    if let Some(signals) = &report.trading_signals {
        println!("{}", signal_table(signals));
    }
}

fn crisis_table(report: &CrisisReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Crisis indicator", "Score"]);
    for (name, score) in &report.indicators {
        table.add_row(vec![Cell::new(name), Cell::new(format!("{score:.3}"))]);
    }
    table.add_row(vec![Cell::new("composite"), Cell::new(format!("{:.3}", report.crisis_score))]);
    table.add_row(vec![Cell::new("alert level"), Cell::new(format!("{:?}", report.alert_level))]);
    if !report.excluded_instruments.is_empty() {
        table.add_row(vec![Cell::new("excluded"), Cell::new(report.excluded_instruments.join(", "))]);
    }
    table
}

fn risk_table(assessment: &RiskAssessment) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Confidence", "VaR", "Expected shortfall"]);
    for level in &assessment.levels {
        table.add_row(vec![
            Cell::new(format!("{:.1}%", level.confidence * 100.0)),
            Cell::new(format!("{:.2}%", level.var * 100.0)),
            Cell::new(format!("{:.2}%", level.expected_shortfall * 100.0)),
        ]);
    }
    table.add_row(vec![
        Cell::new("method"),
        Cell::new(format!("{:?}", assessment.method)),
        Cell::new(format!(
            "{} paths × {} days, seed {}",
            assessment.simulation_count, assessment.horizon_days, assessment.seed
        )),
    ]);
    table
}

fn signal_table(signals: &[TradingSignal]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Symbol", "Type", "Timeframe", "Entry", "Stop", "Take profits", "Confidence", "R:R",
    ]);
    for signal in signals {
        let take_profits = signal
            .take_profits
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" / ");
        table.add_row(vec![
            Cell::new(&signal.symbol),
            Cell::new(format!("{:?}", signal.signal_type)),
            Cell::new(signal.timeframe),
            Cell::new(signal.entry),
            Cell::new(signal.stop_loss),
            Cell::new(take_profits),
            Cell::new(format!("{:.2}", signal.confidence)),
            Cell::new(format!("{:.2}", signal.risk_reward_ratio)),
        ]);
    }
    table
}
