use crate::data::model::FeatureTable;
use crate::error::{PipelineError, Result};

/// Per-column mean and population standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Learn column statistics from `table`. A column whose values are all
    /// equal has no scale and is rejected.
    pub fn fit(table: &FeatureTable) -> Result<Self> {
        if table.is_empty() {
            return Err(PipelineError::EmptyPartition("table to scale"));
        }
        let n = table.n_rows() as f64;

        let mut means = Vec::with_capacity(table.n_cols());
        let mut stds = Vec::with_capacity(table.n_cols());
        for (col, name) in table.columns().iter().enumerate() {
            let mean = table.column(col).sum::<f64>() / n;
            let var = table.column(col).map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            if !(std > f64::EPSILON * mean.abs().max(1.0)) {
                return Err(PipelineError::DegenerateColumn {
                    column: name.clone(),
                });
            }
            means.push(mean);
            stds.push(std);
        }

        Ok(StandardScaler {
            columns: table.columns().to_vec(),
            means,
            stds,
        })
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stds(&self) -> &[f64] {
        &self.stds
    }

    /// Return a standardized copy of `table`; the input is left untouched.
    pub fn transform(&self, table: &FeatureTable) -> Result<FeatureTable> {
        if table.n_cols() != self.columns.len() {
            return Err(PipelineError::features(self.columns.len(), table.n_cols()));
        }
        let rows = table
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.stds))
                    .map(|(v, (mean, std))| (v - mean) / std)
                    .collect()
            })
            .collect();
        Ok(table.map_rows(rows))
    }
}

/// Standardize every column of `table` with statistics from `table` itself.
pub fn scale(table: &FeatureTable) -> Result<FeatureTable> {
    let scaler = StandardScaler::fit(table)?;
    log::debug!("Column means: {:?}", scaler.means());
    scaler.transform(table)
}
