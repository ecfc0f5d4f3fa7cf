//! Red wine quality classification: load the UCI table, hold out a test
//! partition, standardize the training features, fit a decision tree and
//! report how well it predicts the held-out quality scores.

pub mod data;
pub mod error;
pub mod http_client;
pub mod pipeline;
pub mod preprocess;
pub mod report;
pub mod tree;

pub use error::{PipelineError, Result};
pub use pipeline::{RunConfig, RunOutcome, run, run_on_dataset};
