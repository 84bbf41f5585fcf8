use crate::model::ReturnModel;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finalizer.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// The seed of path `path` within a run. Depends only on the run seed and
/// the path index, never on which worker thread simulates the path.
pub fn path_seed(run_seed: u64, path: usize) -> u64 {
    splitmix64(run_seed ^ (path as u64).wrapping_mul(GOLDEN_GAMMA))
}

/// Simulates one path and returns its terminal portfolio return.
pub fn simulate_path(model: &ReturnModel, weights: &[f64], horizon_days: usize, seed: u64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cumulative = vec![0.0; weights.len()];
    let mut scratch = vec![0.0; weights.len()];
    for _ in 0..horizon_days {
        model.accumulate_day(&mut rng, &mut cumulative, &mut scratch);
    }
    weights
        .iter()
        .zip(&cumulative)
        .map(|(w, log_return)| w * log_return.exp_m1())
        .sum()
}

/// Simulates `simulation_count` paths in parallel. Outcomes are in path order.
///
/// Returns `None` if `stop` is raised before every path has finished; no
/// partial result is ever produced.
pub fn simulate_paths(
    model: &ReturnModel,
    weights: &[f64],
    horizon_days: usize,
    simulation_count: usize,
    run_seed: u64,
    stop: &AtomicBool,
) -> Option<Vec<f64>> {
    let outcomes = (0..simulation_count)
        .into_par_iter()
        .map(|path| {
            if stop.load(Ordering::Relaxed) {
                return None;
            }
            Some(simulate_path(model, weights, horizon_days, path_seed(run_seed, path)))
        })
        .collect::<Option<Vec<f64>>>()?;

    // A stop raised after the last path started still discards the run.
    if stop.load(Ordering::Relaxed) {
        return None;
    }
    Some(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector};

    fn model() -> ReturnModel {
        ReturnModel::Parametric {
            mean: DVector::from_vec(vec![0.0005, 0.0]),
            factor: DMatrix::from_row_slice(2, 2, &[0.01, 0.0, 0.004, 0.009]),
            ridge_applied: 0.0,
            observations: 250,
        }
    }

    #[test]
    fn path_seeds_are_distinct() {
        let seeds: std::collections::BTreeSet<u64> = (0..1000).map(|p| path_seed(42, p)).collect();
        assert_eq!(seeds.len(), 1000);
    }

    #[test]
    fn outcomes_do_not_depend_on_pool_size() {
        let stop = AtomicBool::new(false);
        let wide = simulate_paths(&model(), &[0.5, 0.5], 5, 500, 7, &stop).unwrap();
        let narrow = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| simulate_paths(&model(), &[0.5, 0.5], 5, 500, 7, &stop).unwrap());
        assert_eq!(wide, narrow);
    }

    #[test]
    fn raised_stop_discards_the_run() {
        let stop = AtomicBool::new(true);
        assert_eq!(simulate_paths(&model(), &[0.5, 0.5], 5, 100, 7, &stop), None);
    }

    #[test]
    fn historical_model_replays_observed_rows() {
        let model = ReturnModel::Historical {
            rows: vec![vec![0.01, 0.01]],
        };
        let outcome = simulate_path(&model, &[0.5, 0.5], 3, 1);
        assert!((outcome - 0.03f64.exp_m1()).abs() < 1e-12);
    }
}
