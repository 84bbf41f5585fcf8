//! # Signal generator
//!
//! Turns per-instrument, multi-timeframe bar series into directional trading
//! signals.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   execution or persistence. It depends only on `core-types` and `configuration`.
//! - **Partial failure:** every (instrument, timeframe) pair is evaluated on its
//!   own. A pair with too little data or malformed bars is logged and skipped;
//!   the rest of the batch still produces signals.
//!
//! ## Public API
//!
//! - `SignalGenerator`: validates its settings once and generates signals for a snapshot.
//! - `SignalScore`: the trend, momentum and volatility components of a score.

pub mod error;
pub mod generator;
pub mod indicators;

pub use error::SignalError;
pub use generator::SignalGenerator;
pub use indicators::{IndicatorReading, SignalScore};
