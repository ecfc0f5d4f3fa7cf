//! The five-stage run: load → split → scale → fit → report.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::data::loader::load_dataset;
use crate::data::model::{Dataset, FeatureTable};
use crate::data::split::train_test_split;
use crate::error::Result;
use crate::preprocess::scale;
use crate::report::{DEFAULT_SAMPLE_SIZE, Reporter};
use crate::tree::{DecisionTreeClassifier, TreeParams};

/// Red wine quality data, semicolon-delimited with a header row.
pub const DEFAULT_SOURCE: &str =
    "https://archive.ics.uci.edu/ml/machine-learning-databases/wine-quality/winequality-red.csv";

/// Everything a run needs; nothing is read from process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// URL or local path of the dataset.
    pub source: String,
    pub delimiter: u8,
    /// Column holding the integer target.
    pub label_column: String,
    /// Share of rows held out for testing.
    pub test_fraction: f64,
    /// Seed for the train/test shuffle; `None` gives a fresh split each run.
    pub split_seed: Option<u64>,
    pub tree: TreeParams,
    /// Rows shown in previews and prediction samples.
    pub sample_size: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            delimiter: b';',
            label_column: "quality".to_string(),
            test_fraction: 0.2,
            split_seed: None,
            tree: TreeParams::default(),
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// What a run produced, for callers that want more than the printed report.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub dataset_shape: (usize, usize),
    pub x_train: FeatureTable,
    pub x_test: FeatureTable,
    pub y_train: Vec<i64>,
    pub y_test: Vec<i64>,
    /// Standardized copy of `x_train`. Reported only; the tree is fitted on
    /// the raw features.
    pub x_train_scaled: FeatureTable,
    pub score: f64,
    pub predictions: Vec<i64>,
}

/// Load the dataset named by `config` and run the pipeline over it,
/// writing the report to `out`.
pub fn run<W: Write>(config: &RunConfig, out: W) -> Result<RunOutcome> {
    if let Ok(json) = serde_json::to_string(config) {
        log::debug!("Run configuration: {json}");
    }
    let dataset = load_dataset(&config.source, config.delimiter)?;
    run_on_dataset(dataset, config, out)
}

/// The pipeline minus the loader. `config.source` and `config.delimiter`
/// are ignored.
pub fn run_on_dataset<W: Write>(
    dataset: Dataset,
    config: &RunConfig,
    out: W,
) -> Result<RunOutcome> {
    let mut report = Reporter::new(out, config.sample_size);

    let dataset_shape = dataset.shape();
    report.dataset_shape(dataset_shape)?;

    let (x, y) = dataset.into_features_and_labels(&config.label_column)?;

    log::info!("Splitting with test fraction {}", config.test_fraction);
    let split = train_test_split(&x, &y, config.test_fraction, config.split_seed)?;
    report.partitions(&split.x_train, &split.x_test)?;

    log::info!("Standardizing {} training rows", split.x_train.n_rows());
    let x_train_scaled = scale(&split.x_train)?;
    report.scaled(&x_train_scaled)?;

    let model = DecisionTreeClassifier::fit(&split.x_train, &split.y_train, &config.tree)?;
    let score = model.score(&split.x_test, &split.y_test)?;
    log::info!("Test accuracy {score:.4}");
    report.confidence(score)?;

    let predictions = model.predict(&split.x_test)?;
    report.predictions(
        &predictions,
        &split.y_test,
        split.x_test.row_ids(),
        &config.label_column,
    )?;

    Ok(RunOutcome {
        dataset_shape,
        x_train: split.x_train,
        x_test: split.x_test,
        y_train: split.y_train,
        y_test: split.y_test,
        x_train_scaled,
        score,
        predictions,
    })
}
