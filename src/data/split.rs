use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::model::FeatureTable;
use crate::error::{PipelineError, Result};

/// The four partitions produced by [`train_test_split`]. Row `i` of
/// `x_train` belongs with `y_train[i]`, and likewise for the test side.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: FeatureTable,
    pub x_test: FeatureTable,
    pub y_train: Vec<i64>,
    pub y_test: Vec<i64>,
}

/// Number of test rows for `n` rows: `ceil(fraction * n)`.
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    (test_fraction * n as f64).ceil() as usize
}

/// Shuffle rows and cut them into train and test partitions.
///
/// With `seed == None` the shuffle is seeded from the OS, so every run
/// produces a different split.
pub fn train_test_split(
    x: &FeatureTable,
    y: &[i64],
    test_fraction: f64,
    seed: Option<u64>,
) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidTestFraction(test_fraction));
    }
    if x.n_rows() != y.len() {
        return Err(PipelineError::rows(x.n_rows(), y.len()));
    }

    let n = x.n_rows();
    let n_test = test_size(n, test_fraction);
    if n_test == 0 || n_test >= n {
        return Err(PipelineError::EmptyPartition(if n_test == 0 {
            "test partition"
        } else {
            "training partition"
        }));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);

    let (test_idx, train_idx) = order.split_at(n_test);
    log::debug!(
        "Split {n} rows into {} train / {} test (seed: {seed:?})",
        train_idx.len(),
        test_idx.len()
    );

    Ok(TrainTestSplit {
        x_train: x.select(train_idx),
        x_test: x.select(test_idx),
        y_train: train_idx.iter().map(|&i| y[i]).collect(),
        y_test: test_idx.iter().map(|&i| y[i]).collect(),
    })
}
