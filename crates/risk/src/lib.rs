//! # Monte Carlo risk engine
//!
//! Estimates Value-at-Risk and expected shortfall of a weighted portfolio by
//! simulating correlated daily log-return paths.
//!
//! ## Architectural Principles
//!
//! - **Explicit randomness:** every path owns a `StdRng` seeded from the run
//!   seed and its path index, so a seeded run is reproducible regardless of how
//!   rayon schedules the paths.
//! - **Degrade, don't fail:** an ill-conditioned covariance is regularized; one
//!   that still cannot be factored falls back to historical resampling. Only a
//!   history too short for that fallback is a `RiskError::Simulation`.
//! - **All or nothing:** a cancelled run returns `RiskError::Cancelled`, never a
//!   partially simulated assessment.

pub mod engine;
pub mod error;
pub mod model;
pub mod simulation;
pub mod spec;

pub use engine::MonteCarloEngine;
pub use error::RiskError;
pub use model::ReturnModel;
pub use spec::{HEADLINE_LEVELS, SimulationSpec};
