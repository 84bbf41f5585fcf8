use crate::error::RiskError;
use analytics::{ReturnSeries, cholesky, covariance_matrix, mean_vector, regularize_with};
use configuration::MonteCarloSettings;
use core_types::SimulationMethod;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// The joint daily log-return model the paths are drawn from.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnModel {
    /// Correlated normal innovations: `mean + L·z` with `L·Lᵀ` the (regularized) covariance.
    Parametric {
        mean: DVector<f64>,
        factor: DMatrix<f64>,
        ridge_applied: f64,
        observations: usize,
    },
    /// Resampling of observed joint return rows, used when no factorization exists.
    Historical { rows: Vec<Vec<f64>> },
}

impl ReturnModel {
    /// Fits a model to aligned per-instrument return series.
    pub fn fit(series: &[ReturnSeries], settings: &MonteCarloSettings) -> Result<Self, RiskError> {
        let covariance = covariance_matrix(series)?;
        let mean = mean_vector(series);
        Self::from_estimates(series, mean, &covariance, settings)
    }

    /// Builds the parametric model from the given estimates, falling back to
    /// historical resampling when the regularized covariance cannot be factored.
    pub fn from_estimates(
        series: &[ReturnSeries],
        mean: DVector<f64>,
        covariance: &DMatrix<f64>,
        settings: &MonteCarloSettings,
    ) -> Result<Self, RiskError> {
        let observations = series.first().map_or(0, ReturnSeries::len);
        let regularized = regularize_with(covariance, settings.ridge, settings.max_condition_number);

        if let Some(factor) = cholesky(&regularized.matrix) {
            return Ok(ReturnModel::Parametric {
                mean,
                factor,
                ridge_applied: regularized.ridge_applied,
                observations,
            });
        }

        if observations < settings.min_historical_observations {
            return Err(RiskError::Simulation(format!(
                "covariance is not positive definite after regularization and only {observations} \
                 historical observations exist (need {})",
                settings.min_historical_observations
            )));
        }

        tracing::warn!(
            observations,
            "Covariance not positive definite after regularization. Falling back to historical simulation."
        );
        let rows = (0..observations)
            .map(|t| series.iter().map(|s| s.values[t]).collect())
            .collect();
        Ok(ReturnModel::Historical { rows })
    }

    pub fn method(&self) -> SimulationMethod {
        match self {
            ReturnModel::Parametric { .. } => SimulationMethod::Parametric,
            ReturnModel::Historical { .. } => SimulationMethod::Historical,
        }
    }

    pub fn observations(&self) -> usize {
        match self {
            ReturnModel::Parametric { observations, .. } => *observations,
            ReturnModel::Historical { rows } => rows.len(),
        }
    }

    pub fn ridge_applied(&self) -> f64 {
        match self {
            ReturnModel::Parametric { ridge_applied, .. } => *ridge_applied,
            ReturnModel::Historical { .. } => 0.0,
        }
    }

    /// Adds one day of log returns to `cumulative`. `scratch` must have the
    /// same length and is overwritten.
    pub fn accumulate_day<R: Rng>(&self, rng: &mut R, cumulative: &mut [f64], scratch: &mut [f64]) {
        match self {
            ReturnModel::Parametric { mean, factor, .. } => {
                for z in scratch.iter_mut() {
                    *z = StandardNormal.sample(rng);
                }
                for (i, total) in cumulative.iter_mut().enumerate() {
                    // Lower triangular: only the first i + 1 innovations contribute.
                    let shock: f64 = (0..=i).map(|j| factor[(i, j)] * scratch[j]).sum();
                    *total += mean[i] + shock;
                }
            }
            ReturnModel::Historical { rows } => {
                let row = &rows[rng.gen_range(0..rows.len())];
                for (total, r) in cumulative.iter_mut().zip(row) {
                    *total += r;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(symbol: &str, values: Vec<f64>) -> ReturnSeries {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        ReturnSeries {
            symbol: symbol.to_string(),
            timestamps: (0..values.len()).map(|i| start + Duration::days(i as i64)).collect(),
            values,
        }
    }

    fn wobble(n: usize, phase: f64) -> Vec<f64> {
        (0..n).map(|i| 0.01 * ((i as f64) * 0.7 + phase).sin()).collect()
    }

    #[test]
    fn well_behaved_series_fit_parametric() {
        let set = [series("A", wobble(60, 0.0)), series("B", wobble(60, 1.3))];
        let model = ReturnModel::fit(&set, &MonteCarloSettings::default()).unwrap();
        assert_eq!(model.method(), SimulationMethod::Parametric);
        assert_eq!(model.observations(), 60);
    }

    #[test]
    fn indefinite_covariance_falls_back_to_history() {
        let set = [series("A", wobble(40, 0.0)), series("B", wobble(40, 1.3))];
        let indefinite = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let model = ReturnModel::from_estimates(
            &set,
            DVector::zeros(2),
            &indefinite,
            &MonteCarloSettings::default(),
        )
        .unwrap();
        assert_eq!(model.method(), SimulationMethod::Historical);
        assert_eq!(model.observations(), 40);
        assert_eq!(model.ridge_applied(), 0.0);
    }

    #[test]
    fn fallback_needs_enough_history() {
        let set = [series("A", wobble(10, 0.0)), series("B", wobble(10, 1.3))];
        let indefinite = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let err = ReturnModel::from_estimates(
            &set,
            DVector::zeros(2),
            &indefinite,
            &MonteCarloSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::Simulation(_)));
    }

    #[test]
    fn identical_series_are_regularized() {
        let set = [series("A", wobble(60, 0.0)), series("B", wobble(60, 0.0))];
        let model = ReturnModel::fit(&set, &MonteCarloSettings::default()).unwrap();
        assert_eq!(model.method(), SimulationMethod::Parametric);
        assert!(model.ridge_applied() > 0.0);
    }
}
