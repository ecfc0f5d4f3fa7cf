//! Writes a synthetic red-wine-style dataset for offline runs:
//! `sample_wine.csv` (semicolon-delimited) and `sample_wine.parquet`.
//!
//! Usage: `generate_sample [OUTPUT_DIR]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N_ROWS: usize = 400;

/// (name, mean, std, min) per feature, roughly following the UCI red wine table.
const FEATURES: [(&str, f64, f64, f64); 11] = [
    ("fixed acidity", 8.3, 1.7, 4.6),
    ("volatile acidity", 0.53, 0.18, 0.12),
    ("citric acid", 0.27, 0.19, 0.0),
    ("residual sugar", 2.5, 1.4, 0.9),
    ("chlorides", 0.087, 0.047, 0.012),
    ("free sulfur dioxide", 15.9, 10.5, 1.0),
    ("total sulfur dioxide", 46.5, 32.9, 6.0),
    ("density", 0.9967, 0.0019, 0.990),
    ("pH", 3.31, 0.15, 2.74),
    ("sulphates", 0.66, 0.17, 0.33),
    ("alcohol", 10.4, 1.07, 8.4),
];

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1 = rng.random::<f64>().max(1e-15);
    let u2 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// Quality rises with alcohol and sulphates and falls with volatile acidity.
fn quality(row: &[f64], rng: &mut StdRng) -> i64 {
    let score = 5.6 + 0.55 * (row[10] - 10.4) - 2.0 * (row[1] - 0.53) + 1.2 * (row[9] - 0.66)
        + gauss(rng, 0.0, 0.45);
    (score.round() as i64).clamp(3, 8)
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut rng = StdRng::seed_from_u64(42);

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(N_ROWS);
    let mut labels: Vec<i64> = Vec::with_capacity(N_ROWS);
    for _ in 0..N_ROWS {
        let row: Vec<f64> = FEATURES
            .iter()
            .map(|&(_, mean, std, min)| gauss(&mut rng, mean, std).max(min))
            .collect();
        labels.push(quality(&row, &mut rng));
        rows.push(row);
    }

    // Delimited text, same layout as the UCI download
    let csv_path = out_dir.join("sample_wine.csv");
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(&csv_path)
        .with_context(|| format!("creating {}", csv_path.display()))?;
    let mut header: Vec<&str> = FEATURES.iter().map(|f| f.0).collect();
    header.push("quality");
    writer.write_record(&header)?;
    for (row, label) in rows.iter().zip(&labels) {
        let mut record: Vec<String> = row.iter().map(|v| format!("{v:.4}")).collect();
        record.push(label.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;

    // Parquet: one Float64 column per feature, Int64 quality
    let mut fields: Vec<Field> = FEATURES
        .iter()
        .map(|f| Field::new(f.0, DataType::Float64, false))
        .collect();
    fields.push(Field::new("quality", DataType::Int64, false));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = (0..FEATURES.len())
        .map(|col| Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r[col]))) as ArrayRef)
        .collect();
    columns.push(Arc::new(Int64Array::from(labels.clone())));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let parquet_path = out_dir.join("sample_wine.parquet");
    let file = std::fs::File::create(&parquet_path)
        .with_context(|| format!("creating {}", parquet_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!(
        "Wrote {N_ROWS} wines ({} features + quality) to {} and {}",
        FEATURES.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
