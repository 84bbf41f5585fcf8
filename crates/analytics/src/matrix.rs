use crate::distribution::mean;
use crate::error::StatsError;
use crate::returns::ReturnSeries;
use nalgebra::{DMatrix, DVector};

/// Diagonal ridge added to an ill-conditioned covariance matrix.
pub const DEFAULT_RIDGE: f64 = 1e-6;

/// Condition number above which a covariance matrix is considered ill-conditioned.
pub const DEFAULT_MAX_CONDITION: f64 = 1e10;

/// Builds the N×N sample covariance matrix of N aligned return series.
///
/// Every series must have the same length and identical timestamps.
pub fn covariance_matrix(series: &[ReturnSeries]) -> Result<DMatrix<f64>, StatsError> {
    let first = series
        .first()
        .ok_or_else(|| StatsError::InvalidInput("no return series supplied".to_string()))?;

    for other in &series[1..] {
        if other.len() != first.len() {
            return Err(StatsError::Alignment(format!(
                "{} has {} observations but {} has {}",
                first.symbol,
                first.len(),
                other.symbol,
                other.len()
            )));
        }
        if other.timestamps != first.timestamps {
            return Err(StatsError::Alignment(format!(
                "{} and {} do not share the same timestamps",
                first.symbol, other.symbol
            )));
        }
    }

    let columns: Vec<&[f64]> = series.iter().map(|s| s.values.as_slice()).collect();
    covariance_from_columns(&columns)
}

/// Sample covariance (n - 1 denominator) of equally long columns.
pub fn covariance_from_columns(columns: &[&[f64]]) -> Result<DMatrix<f64>, StatsError> {
    let n = columns.len();
    let observations = columns.first().map_or(0, |c| c.len());
    if columns.iter().any(|c| c.len() != observations) {
        return Err(StatsError::Alignment("columns differ in length".to_string()));
    }
    if observations < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: observations,
        });
    }

    let means: Vec<f64> = columns.iter().map(|c| mean(c)).collect();
    let denominator = (observations - 1) as f64;

    let mut cov = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let sum: f64 = columns[i]
                .iter()
                .zip(columns[j])
                .map(|(a, b)| (a - means[i]) * (b - means[j]))
                .sum();
            let value = sum / denominator;
            cov[(i, j)] = value;
            cov[(j, i)] = value;
        }
    }
    Ok(cov)
}

/// Column means of aligned return series.
pub fn mean_vector(series: &[ReturnSeries]) -> DVector<f64> {
    DVector::from_iterator(series.len(), series.iter().map(|s| mean(&s.values)))
}

/// Converts a covariance matrix into a correlation matrix. Pairs involving a
/// zero-variance column get a correlation of 0.
pub fn correlation_from_covariance(cov: &DMatrix<f64>) -> DMatrix<f64> {
    let n = cov.nrows();
    let sd: Vec<f64> = (0..n).map(|i| cov[(i, i)].max(0.0).sqrt()).collect();
    DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            1.0
        } else if sd[i] > 0.0 && sd[j] > 0.0 {
            (cov[(i, j)] / (sd[i] * sd[j])).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    })
}

/// Ratio of the largest to the smallest eigenvalue of a symmetric matrix.
/// Infinite when the matrix is singular, indefinite or contains NaNs.
pub fn condition_number(matrix: &DMatrix<f64>) -> f64 {
    if matrix.is_empty() {
        return 1.0;
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return f64::INFINITY;
    }
    let eigenvalues = matrix.clone().symmetric_eigenvalues();
    let max = eigenvalues.max();
    let min = eigenvalues.min();
    if min <= 0.0 {
        return f64::INFINITY;
    }
    max / min
}

/// A covariance matrix after regularization.
#[derive(Debug, Clone, PartialEq)]
pub struct Regularized {
    pub matrix: DMatrix<f64>,
    /// The ridge added to the diagonal, or 0.0 when the input was well-conditioned.
    pub ridge_applied: f64,
}

/// [`regularize_with`] using [`DEFAULT_MAX_CONDITION`].
pub fn regularize(matrix: &DMatrix<f64>, ridge: f64) -> Regularized {
    regularize_with(matrix, ridge, DEFAULT_MAX_CONDITION)
}

/// Adds `ridge` to the diagonal when the matrix is singular or its condition
/// number exceeds `max_condition`. Deterministic; never fails.
pub fn regularize_with(matrix: &DMatrix<f64>, ridge: f64, max_condition: f64) -> Regularized {
    let condition = condition_number(matrix);
    if condition <= max_condition && cholesky(matrix).is_some() {
        return Regularized {
            matrix: matrix.clone(),
            ridge_applied: 0.0,
        };
    }

    tracing::debug!(condition, ridge, "Regularizing ill-conditioned covariance matrix.");
    let n = matrix.nrows();
    Regularized {
        matrix: matrix + DMatrix::<f64>::identity(n, n) * ridge,
        ridge_applied: ridge,
    }
}

/// Lower-triangular Cholesky factor `L` with `L * Lᵀ = matrix`, or `None`
/// when the matrix is not positive definite.
pub fn cholesky(matrix: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return None;
    }
    matrix.clone().cholesky().map(|c| c.l())
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

    #[test]
    fn covariance_of_perfectly_correlated_series() {
        let a = series("A", vec![0.01, -0.02, 0.03, 0.0]);
        let b = series("B", vec![0.02, -0.04, 0.06, 0.0]);
        let cov = covariance_matrix(&[a, b]).unwrap();
        assert!((cov[(1, 1)] - 4.0 * cov[(0, 0)]).abs() < 1e-15);
        assert!((cov[(0, 1)] - 2.0 * cov[(0, 0)]).abs() < 1e-15);

        let corr = correlation_from_covariance(&cov);
        assert!((corr[(0, 1)] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_lengths_are_an_alignment_error() {
        let a = series("A", vec![0.01, 0.02, 0.03]);
        let b = series("B", vec![0.01, 0.02]);
        assert!(matches!(covariance_matrix(&[a, b]), Err(StatsError::Alignment(_))));
    }

    #[test]
    fn shifted_timestamps_are_an_alignment_error() {
        let a = series("A", vec![0.01, 0.02, 0.03]);
        let mut b = series("B", vec![0.01, 0.02, 0.03]);
        b.timestamps.rotate_left(1);
        assert!(matches!(covariance_matrix(&[a, b]), Err(StatsError::Alignment(_))));
    }

    #[test]
    fn singular_matrix_gets_a_ridge_and_factors() {
        let a = series("A", vec![0.01, -0.02, 0.03, 0.0]);
        let b = series("B", vec![0.01, -0.02, 0.03, 0.0]);
        let cov = covariance_matrix(&[a, b]).unwrap();
        assert!(condition_number(&cov).is_infinite() || condition_number(&cov) > DEFAULT_MAX_CONDITION);

        let regularized = regularize(&cov, DEFAULT_RIDGE);
        assert_eq!(regularized.ridge_applied, DEFAULT_RIDGE);
        let l = cholesky(&regularized.matrix).expect("ridge makes the matrix positive definite");
        let rebuilt = &l * l.transpose();
        assert!((rebuilt - &regularized.matrix).abs().max() < 1e-12);
    }

    #[test]
    fn well_conditioned_matrix_is_untouched() {
        let cov = DMatrix::from_row_slice(2, 2, &[0.04, 0.01, 0.01, 0.09]);
        let regularized = regularize(&cov, DEFAULT_RIDGE);
        assert_eq!(regularized.ridge_applied, 0.0);
        assert_eq!(regularized.matrix, cov);
    }

    #[test]
    fn zero_variance_matrix_is_regularized() {
        let cov = DMatrix::<f64>::zeros(3, 3);
        let regularized = regularize(&cov, DEFAULT_RIDGE);
        assert!(cholesky(&regularized.matrix).is_some());
    }

    #[test]
    fn indefinite_matrix_does_not_factor() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert!(cholesky(&regularize(&cov, DEFAULT_RIDGE).matrix).is_none());
    }
}
