use crate::error::StatsError;
use statrs::statistics::Statistics;

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().mean()
}

/// Sample standard deviation (n - 1). NaN for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    values.iter().std_dev()
}

/// Standard score of `value` against `history`, or `None` when the history
/// has no dispersion.
pub fn z_score(value: f64, history: &[f64]) -> Option<f64> {
    let sd = std_dev(history);
    if !(sd.is_finite() && sd > 0.0) {
        return None;
    }
    Some((value - mean(history)) / sd)
}

/// Returns an ascending copy of `samples`. NaNs sort last.
pub fn sorted(samples: &[f64]) -> Vec<f64> {
    let mut out = samples.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Empirical `p`-th percentile (`p` in [0, 100]) of an unsorted sample, with
/// linear interpolation between closest ranks.
pub fn percentile(samples: &[f64], p: f64) -> Result<f64, StatsError> {
    percentile_sorted(&sorted(samples), p)
}

/// As [`percentile`] for a sample that is already sorted ascending.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Result<f64, StatsError> {
    if sorted.is_empty() {
        return Err(StatsError::EmptySample);
    }
    if !(0.0..=100.0).contains(&p) {
        return Err(StatsError::InvalidInput(format!(
            "percentile must be within [0, 100], got {p}"
        )));
    }

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let fraction = rank - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * fraction)
}

/// Mean of the sorted samples at or below `threshold`.
pub fn tail_mean(sorted: &[f64], threshold: f64) -> Result<f64, StatsError> {
    let tail_len = sorted.partition_point(|x| *x <= threshold);
    if tail_len == 0 {
        return Err(StatsError::EmptySample);
    }
    Ok(mean(&sorted[..tail_len]))
}
