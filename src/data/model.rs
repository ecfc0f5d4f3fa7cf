use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Dataset – the table exactly as loaded
// ---------------------------------------------------------------------------

/// The full parsed dataset: named numeric columns, one `Vec<f64>` per row.
/// Built once by the loader and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Dataset {
    /// Build a dataset, checking that every row matches the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(PipelineError::ShapeMismatch {
                what: "fields per row",
                expected: columns.len(),
                found: bad.len(),
            });
        }
        Ok(Dataset { columns, rows })
    }

    /// `(rows, columns)`, data-frame style.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Split off `label` as the integer target vector; every other column
    /// becomes a feature. Row ids are the original row positions.
    pub fn into_features_and_labels(self, label: &str) -> Result<(FeatureTable, Vec<i64>)> {
        let label_idx = self
            .columns
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| PipelineError::MissingColumn(label.to_string()))?;

        let mut labels = Vec::with_capacity(self.rows.len());
        let mut features = Vec::with_capacity(self.rows.len());
        for (row_no, mut row) in self.rows.into_iter().enumerate() {
            let value = row.remove(label_idx);
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(PipelineError::InvalidLabel { row: row_no, value });
            }
            labels.push(value as i64);
            features.push(row);
        }

        let mut columns = self.columns;
        columns.remove(label_idx);
        let row_ids = (0..features.len()).collect();

        Ok((
            FeatureTable {
                columns,
                row_ids,
                rows: features,
            },
            labels,
        ))
    }
}

// ---------------------------------------------------------------------------
// FeatureTable – the X matrix (and its partitions)
// ---------------------------------------------------------------------------

/// Row-major numeric table of features. Each row remembers the index it
/// had in the loaded dataset so partitions can be traced back to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    row_ids: Vec<usize>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Build a table with row ids `0..rows.len()`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let row_ids = (0..rows.len()).collect();
        Self::with_row_ids(columns, row_ids, rows)
    }

    pub(crate) fn with_row_ids(
        columns: Vec<String>,
        row_ids: Vec<usize>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if row_ids.len() != rows.len() {
            return Err(PipelineError::rows(rows.len(), row_ids.len()));
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(PipelineError::features(columns.len(), bad.len()));
        }
        Ok(FeatureTable {
            columns,
            row_ids,
            rows,
        })
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Values of column `col`, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r[col])
    }

    /// New table holding the given rows (by position), in that order.
    pub fn select(&self, positions: &[usize]) -> FeatureTable {
        FeatureTable {
            columns: self.columns.clone(),
            row_ids: positions.iter().map(|&p| self.row_ids[p]).collect(),
            rows: positions.iter().map(|&p| self.rows[p].clone()).collect(),
        }
    }

    /// The first `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> FeatureTable {
        let n = n.min(self.rows.len());
        FeatureTable {
            columns: self.columns.clone(),
            row_ids: self.row_ids[..n].to_vec(),
            rows: self.rows[..n].to_vec(),
        }
    }

    /// Same columns and row ids, different cell values.
    pub(crate) fn map_rows(&self, rows: Vec<Vec<f64>>) -> FeatureTable {
        debug_assert_eq!(rows.len(), self.rows.len());
        FeatureTable {
            columns: self.columns.clone(),
            row_ids: self.row_ids.clone(),
            rows,
        }
    }
}
