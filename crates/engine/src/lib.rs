//! # Analysis orchestrator
//!
//! Runs one analysis cycle over a `MarketSnapshot`: the crisis analyzer, the
//! Monte Carlo engine and the signal generator are fanned out as independent
//! blocking tasks and fused into a single `AnalysisReport`.
//!
//! ## Architectural Principles
//!
//! - **Fail per section:** a failing or timed-out analyzer empties its own
//!   section and leaves a note. Only a malformed request, a cancelled cycle or
//!   three failed analyzers fail the whole cycle.
//! - **No partial simulations:** cancellation and timeouts raise the Monte
//!   Carlo stop flag, and a stopped simulation never produces an assessment.

pub mod cancel;
pub mod classify;
pub mod error;
pub mod orchestrator;

pub use cancel::CancellationHandle;
pub use classify::{classify, market_alerts};
pub use error::EngineError;
pub use orchestrator::{AnalysisOrchestrator, AnalysisRequest};
