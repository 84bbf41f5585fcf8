//! # Statistics kit
//!
//! Shared numerical primitives for the risk and crisis engines: return series,
//! covariance estimation, regularization of near-singular matrices and
//! empirical percentiles.
//!
//! ## Architectural Principles
//!
//! - **Pure functions:** nothing in this crate holds state. Every function takes
//!   its inputs by reference and returns a fresh value or a `StatsError`.
//! - **Fail loudly, recover upstream:** too little data is reported as
//!   `StatsError::InsufficientData`; the caller decides whether to skip the
//!   affected instrument.

// Declare the modules that constitute this crate.
pub mod distribution;
pub mod error;
pub mod matrix;
pub mod returns;

// Re-export the key components to create a clean, public-facing API.
pub use distribution::{mean, percentile, percentile_sorted, sorted, std_dev, tail_mean, z_score};
pub use error::StatsError;
pub use matrix::{
    DEFAULT_MAX_CONDITION, DEFAULT_RIDGE, Regularized, cholesky, condition_number,
    correlation_from_covariance, covariance_from_columns, covariance_matrix, mean_vector,
    regularize, regularize_with,
};
pub use returns::{ReturnSeries, align, log_returns, rolling_std};
