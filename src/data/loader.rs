use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::Dataset;
use crate::error::PipelineError;
use crate::http_client;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a URL or a local file in a single synchronous read.
///
/// * `http://` / `https://` – fetched once, parsed as delimited text
/// * `.parquet` / `.pq`     – flat numeric columns
/// * `.json`                – `[{ "alcohol": 9.4, "quality": 5, ... }, ...]`
/// * anything else          – delimited text split on `delimiter`
///
/// Any failure on the way surfaces as [`PipelineError::DataUnavailable`].
pub fn load_dataset(location: &str, delimiter: u8) -> Result<Dataset, PipelineError> {
    log::info!("Loading dataset from {location}");
    let dataset = load(location, delimiter).map_err(|e| {
        log::error!("Failed to load {location}: {e:#}");
        PipelineError::unavailable(location, &e)
    })?;
    log::info!(
        "Loaded {} rows with columns {:?}",
        dataset.len(),
        dataset.columns()
    );
    Ok(dataset)
}

fn load(location: &str, delimiter: u8) -> Result<Dataset> {
    if http_client::is_remote(location) {
        let body = http_client::fetch_bytes(location).context("downloading dataset")?;
        return parse_delimited(body.as_slice(), delimiter);
    }

    let path = Path::new(location);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        _ => {
            let file = File::open(path).context("opening delimited file")?;
            parse_delimited(file, delimiter)
        }
    }
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names, then one record per row. Every cell must be
/// numeric; the label column is interpreted later.
fn parse_delimited<R: Read>(source: R, delimiter: u8) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        bail!("missing header row");
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        let row = record
            .iter()
            .zip(&headers)
            .map(|(cell, name)| {
                let value = cell.parse::<f64>().with_context(|| {
                    format!("row {row_no}, column '{name}': '{cell}' is not a number")
                })?;
                if !value.is_finite() {
                    bail!("row {row_no}, column '{name}': non-finite value");
                }
                Ok(value)
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    if rows.is_empty() {
        bail!("no data rows");
    }
    Ok(Dataset::new(headers, rows)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). Columns are taken
/// from the first record; every record must carry the same numeric keys.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;
    let first = records
        .first()
        .and_then(|r| r.as_object())
        .context("no data rows")?;
    let columns: Vec<String> = first.keys().cloned().collect();

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        if obj.len() != columns.len() {
            bail!("Row {i}: expected {} fields, found {}", columns.len(), obj.len());
        }
        let row = columns
            .iter()
            .map(|col| {
                let value = obj
                    .get(col)
                    .and_then(JsonValue::as_f64)
                    .with_context(|| format!("Row {i}: missing or non-numeric '{col}'"))?;
                if !value.is_finite() {
                    bail!("row {i}, column '{col}': non-finite value");
                }
                Ok(value)
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    Ok(Dataset::new(columns, rows)?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Every column must be numeric (ints or floats) and free of nulls.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let base = rows.len();
        rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(columns.len())));

        for (col_idx, name) in columns.iter().enumerate() {
            let values = float_column(batch.column(col_idx))
                .with_context(|| format!("column '{name}'"))?;
            for (offset, value) in values.into_iter().enumerate() {
                rows[base + offset].push(value);
            }
        }
    }

    if rows.is_empty() {
        bail!("no data rows");
    }
    Ok(Dataset::new(columns, rows)?)
}

fn float_column(col: &ArrayRef) -> Result<Vec<f64>> {
    if col.null_count() > 0 {
        bail!("contains null values");
    }
    let converted = arrow::compute::cast(col, &DataType::Float64)
        .with_context(|| format!("cannot read {:?} as Float64", col.data_type()))?;
    let floats = converted
        .as_any()
        .downcast_ref::<Float64Array>()
        .context("expected Float64Array")?;
    if floats.null_count() > 0 {
        bail!("contains non-numeric values");
    }
    if let Some(row) = floats.values().iter().position(|v| !v.is_finite()) {
        bail!("row {row}: non-finite value");
    }
    Ok(floats.values().to_vec())
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread;

    use arrow::array::{Float64Array, Int64Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const WINE_CSV: &str = "\
\"fixed acidity\";\"alcohol\";\"quality\"
7.4;9.4;5
7.8;9.8;5
11.2;9.8;6
";

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    /// Serve one canned HTTP response on a loopback port and return its URL.
    fn serve_once(response: String) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/winequality-red.csv", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });
        (url, handle)
    }

    fn parquet_file(dir: &Path, alcohol: Vec<f64>, quality: Vec<i64>) -> std::path::PathBuf {
        let path = dir.join("wine.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("alcohol", DataType::Float64, false),
            Field::new("quality", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(alcohol)),
                Arc::new(Int64Array::from(quality)),
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    fn unavailable_reason(err: PipelineError) -> String {
        match err {
            PipelineError::DataUnavailable { reason, .. } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parses_semicolon_csv_with_quoted_header() {
        let file = write_temp(".csv", WINE_CSV);
        let ds = load_dataset(file.path().to_str().unwrap(), b';').unwrap();
        assert_eq!(ds.shape(), (3, 3));
        assert_eq!(ds.columns(), ["fixed acidity", "alcohol", "quality"]);
        assert_eq!(ds.rows()[2], vec![11.2, 9.8, 6.0]);
    }

    #[test]
    fn wrong_delimiter_is_unavailable() {
        let file = write_temp(".csv", WINE_CSV);
        let err = load_dataset(file.path().to_str().unwrap(), b',').unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
    }

    #[test]
    fn non_numeric_cell_reports_position() {
        let file = write_temp(".csv", "a;quality\n1.0;5\nabc;6\n");
        let err = load_dataset(file.path().to_str().unwrap(), b';').unwrap_err();
        match err {
            PipelineError::DataUnavailable { reason, .. } => {
                assert!(reason.contains("row 1, column 'a'"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let file = write_temp(".csv", "a;quality\n");
        let err = load_dataset(file.path().to_str().unwrap(), b';').unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let err = load_dataset(path.to_str().unwrap(), b';').unwrap_err();
        match err {
            PipelineError::DataUnavailable { location, .. } => {
                assert_eq!(location, path.to_str().unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreachable_url_is_unavailable() {
        let err = load_dataset("http://127.0.0.1:9/winequality-red.csv", b';').unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
    }

    #[test]
    fn loads_json_records() {
        let file = write_temp(
            ".json",
            r#"[{"alcohol": 9.4, "quality": 5}, {"alcohol": 10.1, "quality": 6}]"#,
        );
        let ds = load_dataset(file.path().to_str().unwrap(), b';').unwrap();
        assert_eq!(ds.shape(), (2, 2));
        let (x, y) = ds.into_features_and_labels("quality").unwrap();
        assert_eq!(x.columns(), ["alcohol"]);
        assert_eq!(y, vec![5, 6]);
    }

    #[test]
    fn json_record_with_missing_key_fails() {
        let file = write_temp(
            ".json",
            r#"[{"alcohol": 9.4, "quality": 5}, {"alcohol": 10.1, "pH": 3.2}]"#,
        );
        assert!(load_dataset(file.path().to_str().unwrap(), b';').is_err());
    }

    #[test]
    fn loads_parquet_with_mixed_numeric_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = parquet_file(dir.path(), vec![9.4, 9.8, 12.8], vec![5, 5, 7]);

        let ds = load_dataset(path.to_str().unwrap(), b';').unwrap();
        assert_eq!(ds.shape(), (3, 2));
        assert_eq!(ds.rows()[2], vec![12.8, 7.0]);
    }

    #[test]
    fn nan_and_inf_cells_are_rejected() {
        for cell in ["nan", "NaN", "inf", "-inf"] {
            let file = write_temp(".csv", &format!("a;b;quality\n1.0;2.0;5\n{cell};3.0;6\n"));
            let reason = unavailable_reason(
                load_dataset(file.path().to_str().unwrap(), b';').unwrap_err(),
            );
            assert!(reason.contains("row 1, column 'a': non-finite value"), "{reason}");
        }
    }

    #[test]
    fn nan_in_parquet_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = parquet_file(dir.path(), vec![9.4, f64::NAN, 12.8], vec![5, 5, 7]);
        let reason = unavailable_reason(load_dataset(path.to_str().unwrap(), b';').unwrap_err());
        assert!(reason.contains("column 'alcohol'"), "{reason}");
        assert!(reason.contains("row 1: non-finite value"), "{reason}");
    }

    #[test]
    fn json_columns_keep_file_order() {
        let file = write_temp(
            ".json",
            r#"[{"zeta": 1.0, "alpha": 2.0, "quality": 5}, {"zeta": 3.0, "alpha": 4.0, "quality": 6}]"#,
        );
        let ds = load_dataset(file.path().to_str().unwrap(), b';').unwrap();
        assert_eq!(ds.columns(), ["zeta", "alpha", "quality"]);
        assert_eq!(ds.rows()[1], vec![3.0, 4.0, 6.0]);
    }

    #[test]
    fn http_error_status_is_unavailable() {
        let (url, server) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".into(),
        );
        let reason = unavailable_reason(load_dataset(&url, b';').unwrap_err());
        server.join().unwrap();
        assert!(reason.contains("HTTP 404"), "{reason}");
    }

    #[test]
    fn oversized_content_length_is_refused() {
        let (url, server) = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            http_client::MAX_DATASET_BYTES + 1
        ));
        let reason = unavailable_reason(load_dataset(&url, b';').unwrap_err());
        server.join().unwrap();
        assert!(reason.contains("Response too large"), "{reason}");
    }

    #[test]
    fn downloads_semicolon_csv() {
        let body = WINE_CSV;
        let (url, server) = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ));
        let ds = load_dataset(&url, b';').unwrap();
        server.join().unwrap();
        assert_eq!(ds.shape(), (3, 3));
        assert_eq!(ds.columns(), ["fixed acidity", "alcohol", "quality"]);
        assert_eq!(ds.rows()[0], vec![7.4, 9.4, 5.0]);
    }
}
