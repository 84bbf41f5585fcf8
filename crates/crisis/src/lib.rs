//! # Crisis analyzer
//!
//! Scores systemic market stress for a single `MarketSnapshot`.
//!
//! ## Architectural Principles
//!
//! - **Independent indicators:** every indicator in `indicators` is normalized to
//!   [0, 1] on its own and may be absent. The composite score renormalizes the
//!   configured weights over the indicators that could be computed.
//! - **Partial data is normal:** instruments with too little history are excluded
//!   and reported, not fatal. Only when fewer than `min_indicators` indicators
//!   survive does the analyzer fail with `CrisisError::InsufficientIndicators`.
//! - **Pure computation:** the analyzer holds only its settings and never mutates
//!   the snapshot.

pub mod analyzer;
pub mod error;
pub mod indicators;

pub use analyzer::CrisisAnalyzer;
pub use error::CrisisError;
pub use indicators::Indicator;
