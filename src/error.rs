use thiserror::Error;

/// Every way the pipeline can fail. Nothing is retried or recovered;
/// errors travel straight back to `main`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source could not be fetched or parsed.
    #[error("dataset unavailable at '{location}': {reason}")]
    DataUnavailable { location: String, reason: String },

    /// A column the pipeline needs is absent from the header.
    #[error("column '{0}' not found in dataset")]
    MissingColumn(String),

    /// The label cell of a row is not a whole number.
    #[error("label in row {row} is not an integer: {value}")]
    InvalidLabel { row: usize, value: f64 },

    /// A column has zero variance, so it cannot be standardized.
    #[error("column '{column}' has zero variance and cannot be scaled")]
    DegenerateColumn { column: String },

    /// Feature count (or row count) disagrees with what was expected.
    #[error("shape mismatch: expected {expected} {what}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("test fraction must lie strictly between 0 and 1, got {0}")]
    InvalidTestFraction(f64),

    /// A partition or training input ended up with no rows.
    #[error("{0} is empty")]
    EmptyPartition(&'static str),

    #[error("failed to write report")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn unavailable(location: &str, err: &anyhow::Error) -> Self {
        PipelineError::DataUnavailable {
            location: location.to_string(),
            reason: format!("{err:#}"),
        }
    }

    pub(crate) fn features(expected: usize, found: usize) -> Self {
        PipelineError::ShapeMismatch {
            what: "feature columns",
            expected,
            found,
        }
    }

    pub(crate) fn rows(expected: usize, found: usize) -> Self {
        PipelineError::ShapeMismatch {
            what: "rows",
            expected,
            found,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
